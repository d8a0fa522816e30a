//! Azure DevOps: `azure/<org>/<project>/<repo>[/heads/<branch>|/tags/<tag>]`

use async_trait::async_trait;
use serde::Deserialize;

use super::locator::{segments, split_item_specifier};
use super::response::{AuthHeader, discover_branch, encode_component, get_text};
use super::{FetchContext, Locator, ParsedUrl, Provider, ProviderState};
use crate::error::{Error, Result};

const SHORTHAND: &str = "azure/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RefKind {
    Branch,
    Tag,
}

impl RefKind {
    fn marker(self) -> &'static str {
        match self {
            Self::Branch => "heads",
            Self::Tag => "tags",
        }
    }

    fn version_type(self) -> &'static str {
        match self {
            Self::Branch => "branch",
            Self::Tag => "tag",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct RepoAddress {
    org: String,
    project: String,
    repo: String,
    reference: Option<(RefKind, String)>,
}

impl RepoAddress {
    fn locator(&self) -> Locator {
        let mut canonical = format!("azure/{}/{}/{}", self.org, self.project, self.repo);
        if let Some((kind, reference)) = &self.reference {
            canonical.push_str(&format!("/{}/{}", kind.marker(), reference));
        }
        Locator::new(canonical)
    }
}

#[derive(Debug, Clone)]
pub struct AzureProvider {
    api_base: String,
}

impl Default for AzureProvider {
    fn default() -> Self {
        Self::new("https://dev.azure.com")
    }
}

impl AzureProvider {
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    fn address(&self, url: &str, input: &str) -> Result<RepoAddress> {
        let rest = url
            .strip_prefix(SHORTHAND)
            .ok_or_else(|| Error::parse(input, "not an Azure DevOps registry"))?;
        let parts = segments(rest, input)?;
        let (org, project, repo, tail) = match parts.as_slice() {
            [org, project, repo, tail @ ..] => (*org, *project, *repo, tail),
            _ => {
                return Err(Error::parse(
                    input,
                    "expected 'azure/<org>/<project>/<repo>'",
                ));
            }
        };
        let reference = match tail {
            [] => None,
            ["heads", reference @ ..] if !reference.is_empty() => {
                Some((RefKind::Branch, reference.join("/")))
            }
            ["tags", reference @ ..] if !reference.is_empty() => {
                Some((RefKind::Tag, reference.join("/")))
            }
            _ => {
                return Err(Error::parse(
                    input,
                    "expected '/heads/<branch>' or '/tags/<tag>' after the repository",
                ));
            }
        };
        Ok(RepoAddress {
            org: org.to_string(),
            project: project.to_string(),
            repo: repo.to_string(),
            reference,
        })
    }

    fn repo_url(&self, address: &RepoAddress) -> String {
        format!(
            "{}/{}/{}/_apis/git/repositories/{}",
            self.api_base, address.org, address.project, address.repo
        )
    }

    fn auth(token: Option<&str>) -> Option<AuthHeader> {
        token.map(|t| ("Authorization", format!("Bearer {}", t)))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepositoryInfo {
    default_branch: Option<String>,
}

#[async_trait]
impl Provider for AzureProvider {
    fn name(&self) -> &'static str {
        "azure"
    }

    fn matches(&self, url: &str) -> bool {
        url.starts_with(SHORTHAND)
    }

    fn parse(&self, url: &str, fully_qualified: bool) -> Result<ParsedUrl> {
        if fully_qualified {
            let (registry, item) = split_item_specifier(url)?;
            return Ok(ParsedUrl {
                locator: self.address(registry, url)?.locator(),
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
        let repo_url = self.repo_url(&address);
        let reference = match &address.reference {
            Some((_, reference)) => reference.clone(),
            None => {
                let url = format!("{}?api-version=7.1", repo_url);
                discover_branch(ctx.client, self.name(), &url, Self::auth(ctx.token), |r: RepositoryInfo| {
                    r.default_branch
                        .map(|b| b.trim_start_matches("refs/heads/").to_string())
                })
                .await
            }
        };

        Ok(ProviderState::new(
            self.name(),
            locator.clone(),
            Some(reference),
            format!("{}/items", repo_url),
        ))
    }

    async fn fetch(
        &self,
        state: &ProviderState,
        path: &str,
        ctx: FetchContext<'_>,
    ) -> Result<String> {
        let kind = self
            .address(state.locator.as_str(), state.locator.as_str())?
            .reference
            .map(|(kind, _)| kind)
            .unwrap_or(RefKind::Branch);
        let reference = state.reference.as_deref().unwrap_or(super::DEFAULT_BRANCH);
        let url = format!(
            "{}?path={}&versionDescriptor.version={}&versionDescriptor.versionType={}&api-version=7.1&%24format=text",
            state.base_url,
            encode_component(&format!("/{}", path.trim_start_matches('/'))),
            encode_component(reference),
            kind.version_type()
        );
        get_text(ctx.client, self.name(), &url, Self::auth(ctx.token)).await
    }
}
