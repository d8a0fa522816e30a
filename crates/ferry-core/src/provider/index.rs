//! Hosted registry index: `@<scope>/<name>[@<version>]`

use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use super::locator::split_item_specifier;
use super::response::{AuthHeader, encode_component, get_json, get_text};
use super::{FetchContext, Locator, ParsedUrl, Provider, ProviderState};
use crate::error::{Error, Result};

/// Version used when the index cannot tell us the latest one.
const LATEST: &str = "latest";

#[derive(Debug, Clone, PartialEq, Eq)]
struct PackageAddress {
    scope: String,
    name: String,
    version: Option<String>,
}

impl PackageAddress {
    fn locator(&self) -> Locator {
        match &self.version {
            Some(version) => Locator::new(format!("@{}/{}@{}", self.scope, self.name, version)),
            None => Locator::new(format!("@{}/{}", self.scope, self.name)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct IndexProvider {
    base: String,
}

impl Default for IndexProvider {
    fn default() -> Self {
        Self::new("https://index.ferry.dev")
    }
}

impl IndexProvider {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into().trim_end_matches('/').to_string(),
        }
    }

    fn address(&self, url: &str, input: &str) -> Result<PackageAddress> {
        let rest = url
            .strip_prefix('@')
            .ok_or_else(|| Error::parse(input, "index registries start with '@'"))?;
        let (scope, package) = rest
            .split_once('/')
            .ok_or_else(|| Error::parse(input, "expected '@<scope>/<name>'"))?;
        let (name, version) = match package.split_once('@') {
            Some((name, version)) => (name, Some(version)),
            None => (package, None),
        };
        if scope.is_empty() || name.is_empty() || name.contains('/') {
            return Err(Error::parse(input, "expected '@<scope>/<name>[@<version>]'"));
        }
        if version.is_some_and(|v| v.is_empty() || v.contains('/')) {
            return Err(Error::parse(input, "empty or malformed version"));
        }
        Ok(PackageAddress {
            scope: scope.to_string(),
            name: name.to_string(),
            version: version.map(str::to_string),
        })
    }

    fn package_url(&self, address: &PackageAddress) -> String {
        format!(
            "{}/api/scopes/{}/{}",
            self.base,
            encode_component(&address.scope),
            encode_component(&address.name)
        )
    }

    fn auth(token: Option<&str>) -> Option<AuthHeader> {
        token.map(|t| ("x-api-key", t.to_string()))
    }
}

#[derive(Deserialize)]
struct PackageInfo {
    latest_version: Option<String>,
}

#[async_trait]
impl Provider for IndexProvider {
    fn name(&self) -> &'static str {
        "index"
    }

    fn matches(&self, url: &str) -> bool {
        url.starts_with('@')
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
        let package_url = self.package_url(&address);
        let version = match address.version {
            Some(version) => version,
            None => match get_json::<PackageInfo>(ctx.client, self.name(), &package_url, Self::auth(ctx.token)).await {
                Ok(PackageInfo { latest_version: Some(v) }) if !v.is_empty() => v,
                Ok(_) => {
                    warn!("index: {} has no published version, using '{}'", locator, LATEST);
                    LATEST.to_string()
                }
                Err(e) => {
                    warn!("{}; using '{}'", e, LATEST);
                    LATEST.to_string()
                }
            },
        };

        let base_url = format!("{}/v/{}/files", package_url, encode_component(&version));
        Ok(ProviderState::new(
            self.name(),
            locator.clone(),
            Some(version),
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
    use rstest::rstest;

    #[rstest]
    #[case("@acme/ui", "@acme/ui")]
    #[case("@acme/ui@1.2.0", "@acme/ui@1.2.0")]
    fn test_parse_locator(#[case] url: &str, #[case] expected: &str) {
        assert_eq!(
            IndexProvider::default().parse(url, false).unwrap().locator.as_str(),
            expected
        );
    }

    #[test]
    fn test_parse_fully_qualified_with_version() {
        let parsed = IndexProvider::default()
            .parse("@acme/ui@1.2.0/ui/button", true)
            .unwrap();
        assert_eq!(parsed.locator.as_str(), "@acme/ui@1.2.0");
        assert_eq!(parsed.item, Some(ItemRef::new("ui", "button")));
    }

    #[rstest]
    #[case("acme/ui")]
    #[case("@acme")]
    #[case("@acme/ui@")]
    #[case("@/ui")]
    fn test_parse_rejects(#[case] url: &str) {
        assert!(IndexProvider::default().parse(url, false).is_err());
    }
}
