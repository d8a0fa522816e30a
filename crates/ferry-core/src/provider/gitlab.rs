//! GitLab: `gitlab/<owner>/<repo>[/-/tree/<ref>]`, or
//! `gitlab:https://<host>/<owner>/<repo>` for self-managed instances.

use async_trait::async_trait;
use serde::Deserialize;

use super::locator::{segments, split_item_specifier};
use super::response::{AuthHeader, discover_branch, encode_component, get_text};
use super::{FetchContext, Locator, ParsedUrl, Provider, ProviderState};
use crate::error::{Error, Result};

const SHORTHAND: &str = "gitlab/";
const CUSTOM_HOST: &str = "gitlab:";
const DEFAULT_HOST: &str = "https://gitlab.com";

#[derive(Debug, Clone, PartialEq, Eq)]
struct ProjectAddress {
    /// `None` for gitlab.com
    host: Option<String>,
    owner: String,
    repo: String,
    reference: Option<String>,
}

impl ProjectAddress {
    fn locator(&self) -> Locator {
        let mut canonical = match &self.host {
            Some(host) => format!("gitlab:{}/{}/{}", host, self.owner, self.repo),
            None => format!("gitlab/{}/{}", self.owner, self.repo),
        };
        if let Some(reference) = &self.reference {
            canonical.push_str("/-/tree/");
            canonical.push_str(reference);
        }
        Locator::new(canonical)
    }

    fn host(&self) -> &str {
        self.host.as_deref().unwrap_or(DEFAULT_HOST)
    }

    /// `<host>/api/v4/projects/<owner%2Frepo>`
    fn api_url(&self) -> String {
        format!(
            "{}/api/v4/projects/{}",
            self.host(),
            encode_component(&format!("{}/{}", self.owner, self.repo))
        )
    }
}

/// Reads files through the v4 repository files API.
#[derive(Debug, Clone, Default)]
pub struct GitLabProvider;

impl GitLabProvider {
    fn address(&self, url: &str, input: &str) -> Result<ProjectAddress> {
        let (host, rest) = if let Some(rest) = url.strip_prefix(SHORTHAND) {
            (None, rest)
        } else if let Some(rest) = url.strip_prefix("https://gitlab.com/") {
            (None, rest)
        } else if let Some(custom) = url.strip_prefix(CUSTOM_HOST) {
            let parsed = url::Url::parse(custom).map_err(|e| Error::parse(input, e.to_string()))?;
            let host = parsed
                .host_str()
                .ok_or_else(|| Error::parse(input, "missing host"))?;
            let origin = match parsed.port() {
                Some(port) => format!("{}://{}:{}", parsed.scheme(), host, port),
                None => format!("{}://{}", parsed.scheme(), host),
            };
            let rest = parsed.path().trim_start_matches('/').to_string();
            return self.finish(Some(origin), &rest, input);
        } else {
            return Err(Error::parse(input, "not a GitLab registry"));
        };
        self.finish(host, rest, input)
    }

    fn finish(&self, host: Option<String>, rest: &str, input: &str) -> Result<ProjectAddress> {
        let parts = segments(rest, input)?;
        let (owner, repo) = match parts.as_slice() {
            [owner, repo, ..] => (*owner, repo.trim_end_matches(".git")),
            _ => return Err(Error::parse(input, "expected 'gitlab/<owner>/<repo>'")),
        };
        let reference = match &parts[2..] {
            [] => None,
            ["-", "tree", reference @ ..] if !reference.is_empty() => Some(reference.join("/")),
            _ => {
                return Err(Error::parse(
                    input,
                    "expected 'gitlab/<owner>/<repo>/-/tree/<ref>'",
                ));
            }
        };
        Ok(ProjectAddress {
            host: host.filter(|h| h != DEFAULT_HOST),
            owner: owner.to_string(),
            repo: repo.to_string(),
            reference,
        })
    }

    fn auth(token: Option<&str>) -> Option<AuthHeader> {
        token.map(|t| ("PRIVATE-TOKEN", t.to_string()))
    }
}

#[derive(Deserialize)]
struct ProjectInfo {
    default_branch: Option<String>,
}

#[async_trait]
impl Provider for GitLabProvider {
    fn name(&self) -> &'static str {
        "gitlab"
    }

    fn matches(&self, url: &str) -> bool {
        url.starts_with(SHORTHAND)
            || url.starts_with("https://gitlab.com/")
            || url.starts_with(CUSTOM_HOST)
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
        let api_url = address.api_url();
        let reference = match address.reference {
            Some(reference) => reference,
            None => {
                discover_branch(ctx.client, self.name(), &api_url, Self::auth(ctx.token), |p: ProjectInfo| {
                    p.default_branch
                })
                .await
            }
        };

        Ok(ProviderState::new(
            self.name(),
            locator.clone(),
            Some(reference),
            format!("{}/repository/files", api_url),
        ))
    }

    async fn fetch(
        &self,
        state: &ProviderState,
        path: &str,
        ctx: FetchContext<'_>,
    ) -> Result<String> {
        let reference = state.reference.as_deref().unwrap_or(super::DEFAULT_BRANCH);
        let url = format!(
            "{}/{}/raw?ref={}",
            state.base_url,
            encode_component(path.trim_start_matches('/')),
            encode_component(reference)
        );
        get_text(ctx.client, self.name(), &url, Self::auth(ctx.token)).await
    }
}
