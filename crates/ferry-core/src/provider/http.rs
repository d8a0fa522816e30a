//! Any other `http(s)://` base URL serving a manifest at its root.

use async_trait::async_trait;

use super::locator::split_item_specifier;
use super::response::{AuthHeader, get_text};
use super::{FetchContext, Locator, ParsedUrl, Provider, ProviderState};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, Default)]
pub struct HttpProvider;

impl HttpProvider {
    fn locator(url: &str, input: &str) -> Result<Locator> {
        let parsed = url::Url::parse(url).map_err(|e| Error::parse(input, e.to_string()))?;
        if parsed.host_str().is_none() {
            return Err(Error::parse(input, "missing host"));
        }
        Ok(Locator::new(url.trim_end_matches('/')))
    }

    fn auth(token: Option<&str>) -> Option<AuthHeader> {
        token.map(|t| ("Authorization", format!("Bearer {}", t)))
    }
}

#[async_trait]
impl Provider for HttpProvider {
    fn name(&self) -> &'static str {
        "http"
    }

    fn matches(&self, url: &str) -> bool {
        url.starts_with("https://") || url.starts_with("http://")
    }

    fn parse(&self, url: &str, fully_qualified: bool) -> Result<ParsedUrl> {
        if fully_qualified {
            let (registry, item) = split_item_specifier(url)?;
            return Ok(ParsedUrl {
                locator: Self::locator(registry, url)?,
                item: Some(item),
            });
        }
        Ok(ParsedUrl {
            locator: Self::locator(url, url)?,
            item: None,
        })
    }

    /// Nothing to discover; the locator is already the base URL.
    async fn resolve_state(
        &self,
        locator: &Locator,
        _ctx: FetchContext<'_>,
    ) -> Result<ProviderState> {
        Ok(ProviderState::new(
            self.name(),
            locator.clone(),
            None,
            locator.as_str().to_string(),
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
        let parsed = HttpProvider.parse("https://example.com/registry/", false).unwrap();
        assert_eq!(parsed.locator.as_str(), "https://example.com/registry");

        let parsed = HttpProvider
            .parse("http://localhost:8080/r/utils/math", true)
            .unwrap();
        assert_eq!(parsed.locator.as_str(), "http://localhost:8080/r");
        assert_eq!(parsed.item, Some(ItemRef::new("utils", "math")));
    }

    #[tokio::test]
    async fn test_resolve_state_is_offline() {
        let client = reqwest::Client::new();
        let ctx = FetchContext { client: &client, token: None };
        let locator = Locator::new("https://unreachable.invalid/reg");
        let state = HttpProvider.resolve_state(&locator, ctx).await.unwrap();
        assert_eq!(state.base_url, "https://unreachable.invalid/reg");
        assert_eq!(state.reference, None);
    }
}
