//! Bitbucket Cloud: `bitbucket/<owner>/<repo>[/src/<ref>]`

use async_trait::async_trait;
use serde::Deserialize;

use super::locator::{segments, split_item_specifier};
use super::response::{AuthHeader, discover_branch, get_text};
use super::{FetchContext, Locator, ParsedUrl, Provider, ProviderState};
use crate::error::{Error, Result};

const SHORTHAND: &str = "bitbucket/";
const WEB: &str = "https://bitbucket.org/";

#[derive(Debug, Clone)]
pub struct BitbucketProvider {
    api_base: String,
}

impl Default for BitbucketProvider {
    fn default() -> Self {
        Self::new("https://api.bitbucket.org/2.0")
    }
}

impl BitbucketProvider {
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    /// (owner, repo, ref)
    fn address(&self, url: &str, input: &str) -> Result<(String, String, Option<String>)> {
        let rest = url
            .strip_prefix(SHORTHAND)
            .or_else(|| url.strip_prefix(WEB))
            .ok_or_else(|| Error::parse(input, "not a Bitbucket registry"))?;
        let parts = segments(rest, input)?;
        match parts.as_slice() {
            [owner, repo] => Ok((owner.to_string(), repo.to_string(), None)),
            [owner, repo, "src", reference @ ..] if !reference.is_empty() => Ok((
                owner.to_string(),
                repo.to_string(),
                Some(reference.join("/")),
            )),
            _ => Err(Error::parse(
                input,
                "expected 'bitbucket/<owner>/<repo>[/src/<ref>]'",
            )),
        }
    }

    fn locator(owner: &str, repo: &str, reference: Option<&str>) -> Locator {
        match reference {
            Some(reference) => Locator::new(format!("bitbucket/{}/{}/src/{}", owner, repo, reference)),
            None => Locator::new(format!("bitbucket/{}/{}", owner, repo)),
        }
    }

    fn auth(token: Option<&str>) -> Option<AuthHeader> {
        token.map(|t| ("Authorization", format!("Bearer {}", t)))
    }
}

#[derive(Deserialize)]
struct RepositoryInfo {
    mainbranch: Option<MainBranch>,
}

#[derive(Deserialize)]
struct MainBranch {
    name: String,
}

#[async_trait]
impl Provider for BitbucketProvider {
    fn name(&self) -> &'static str {
        "bitbucket"
    }

    fn matches(&self, url: &str) -> bool {
        url.starts_with(SHORTHAND) || url.starts_with(WEB)
    }

    fn parse(&self, url: &str, fully_qualified: bool) -> Result<ParsedUrl> {
        let (registry, item) = if fully_qualified {
            let (registry, item) = split_item_specifier(url)?;
            (registry, Some(item))
        } else {
            (url, None)
        };
        let (owner, repo, reference) = self.address(registry, url)?;
        Ok(ParsedUrl {
            locator: Self::locator(&owner, &repo, reference.as_deref()),
            item,
        })
    }

    async fn resolve_state(
        &self,
        locator: &Locator,
        ctx: FetchContext<'_>,
    ) -> Result<ProviderState> {
        let (owner, repo, reference) = self.address(locator.as_str(), locator.as_str())?;
        let repo_url = format!("{}/repositories/{}/{}", self.api_base, owner, repo);
        let reference = match reference {
            Some(reference) => reference,
            None => {
                discover_branch(ctx.client, self.name(), &repo_url, Self::auth(ctx.token), |r: RepositoryInfo| {
                    r.mainbranch.map(|b| b.name)
                })
                .await
            }
        };

        let base_url = format!("{}/src/{}", repo_url, reference);
        Ok(ProviderState::new(
            self.name(),
            locator.clone(),
            Some(reference),
            base_url,
        ))
    }

    async fn fetch(
        &self,
        state: &ProviderState,
        path: &str,
        ctx: FetchContext<'_>,
    ) -> Result<String> {
        let url = format!("{}/{}", state.base_url, path.trim_start_matches('/'));
        get_text(ctx.client, self.name(), &url, Self::auth(ctx.token)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::ItemRef;

    #[test]
    fn test_parse() {
        let provider = BitbucketProvider::default();
        assert_eq!(
            provider.parse("https://bitbucket.org/o/r", false).unwrap().locator.as_str(),
            "bitbucket/o/r"
        );
        let parsed = provider.parse("bitbucket/o/r/src/release/ui/card", true).unwrap();
        assert_eq!(parsed.locator.as_str(), "bitbucket/o/r/src/release");
        assert_eq!(parsed.item, Some(ItemRef::new("ui", "card")));
        assert!(provider.parse("bitbucket/o/r/tree/main", false).is_err());
    }
}
