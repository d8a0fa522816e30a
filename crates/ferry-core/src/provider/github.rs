//! GitHub: `github/<owner>/<repo>[/tree/<ref>]`

use async_trait::async_trait;
use serde::Deserialize;

use super::locator::{segments, split_item_specifier};
use super::response::{AuthHeader, discover_branch, get_text};
use super::{FetchContext, Locator, ParsedUrl, Provider, ProviderState};
use crate::error::{Error, Result};

const SHORTHAND: &str = "github/";
const WEB: &str = "https://github.com/";

/// Owner, repository and optional ref of a GitHub registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RepoAddress {
    pub owner: String,
    pub repo: String,
    pub reference: Option<String>,
}

impl RepoAddress {
    fn locator(&self) -> Locator {
        let mut canonical = format!("github/{}/{}", self.owner, self.repo);
        if let Some(reference) = &self.reference {
            canonical.push_str("/tree/");
            canonical.push_str(reference);
        }
        Locator::new(canonical)
    }
}

/// Files are read from `raw.githubusercontent.com`; the REST API is only
/// asked for the default branch.
#[derive(Debug, Clone)]
pub struct GitHubProvider {
    api_base: String,
    raw_base: String,
}

impl Default for GitHubProvider {
    fn default() -> Self {
        Self::new("https://api.github.com", "https://raw.githubusercontent.com")
    }
}

impl GitHubProvider {
    pub fn new(api_base: impl Into<String>, raw_base: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into().trim_end_matches('/').to_string(),
            raw_base: raw_base.into().trim_end_matches('/').to_string(),
        }
    }

    fn address(&self, url: &str, input: &str) -> Result<RepoAddress> {
        let rest = url
            .strip_prefix(SHORTHAND)
            .or_else(|| url.strip_prefix(WEB))
            .ok_or_else(|| Error::parse(input, "not a GitHub registry"))?;
        let parts = segments(rest, input)?;

        let (owner, repo) = match parts.as_slice() {
            [owner, repo, ..] => (*owner, repo.trim_end_matches(".git")),
            _ => return Err(Error::parse(input, "expected 'github/<owner>/<repo>'")),
        };
        let reference = match &parts[2..] {
            [] => None,
            ["tree", reference @ ..] if !reference.is_empty() => Some(reference.join("/")),
            _ => {
                return Err(Error::parse(
                    input,
                    "expected 'github/<owner>/<repo>/tree/<ref>'",
                ));
            }
        };

        Ok(RepoAddress {
            owner: owner.to_string(),
            repo: repo.to_string(),
            reference,
        })
    }

    fn auth(token: Option<&str>) -> Option<AuthHeader> {
        token.map(|t| ("Authorization", format!("token {}", t)))
    }
}

#[derive(Deserialize)]
struct RepoInfo {
    default_branch: Option<String>,
}

#[async_trait]
impl Provider for GitHubProvider {
    fn name(&self) -> &'static str {
        "github"
    }

    fn matches(&self, url: &str) -> bool {
        url.starts_with(SHORTHAND) || url.starts_with(WEB)
    }

    fn parse(&self, url: &str, fully_qualified: bool) -> Result<ParsedUrl> {
        if fully_qualified {
            let (registry, item) = split_item_specifier(url)?;
            let address = self.address(registry, url)?;
            return Ok(ParsedUrl {
                locator: address.locator(),
                item: Some(item),
            });
        }
        Ok(ParsedUrl {
            locator: self.address(url, url)?.locator(),
            item: None,
        })
    }

    async fn resolve_state(
        &self,
        locator: &Locator,
        ctx: FetchContext<'_>,
    ) -> Result<ProviderState> {
        let address = self.address(locator.as_str(), locator.as_str())?;
        let reference = match address.reference {
            Some(reference) => reference,
            None => {
                let url = format!("{}/repos/{}/{}", self.api_base, address.owner, address.repo);
                discover_branch(ctx.client, self.name(), &url, Self::auth(ctx.token), |info: RepoInfo| {
                    info.default_branch
                })
                .await
            }
        };

        let base_url = format!(
            "{}/{}/{}/{}",
            self.raw_base, address.owner, address.repo, reference
        );
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
