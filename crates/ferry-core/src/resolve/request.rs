//! Item requests as typed by the user.

use std::fmt;

use crate::error::{Error, Result};
use crate::manifest::ItemRef;
use crate::provider::Providers;

/// One requested item, optionally pinned to a registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRequest {
    /// Canonical locator of the registry, for fully qualified requests
    pub registry: Option<String>,
    pub item: ItemRef,
}

impl ItemRequest {
    pub fn new(item: ItemRef) -> Self {
        Self {
            registry: None,
            item,
        }
    }

    pub fn qualified(registry: impl Into<String>, item: ItemRef) -> Self {
        Self {
            registry: Some(registry.into()),
            item,
        }
    }

    /// Parse `category/item` or `<registry>/<category>/<item>`.
    ///
    /// Anything a provider claims is read as fully qualified.
    pub fn parse(spec: &str, providers: &Providers) -> Result<Self> {
        let spec = spec.trim();
        if let Ok(provider) = providers.select(spec) {
            let parsed = provider.parse(spec, true)?;
            let item = parsed
                .item
                .ok_or_else(|| Error::parse(spec, "missing '/<category>/<item>'"))?;
            return Ok(Self::qualified(parsed.locator.as_str(), item));
        }

        spec.trim_end_matches('/')
            .parse::<ItemRef>()
            .map(Self::new)
            .map_err(|_| {
                Error::parse(
                    spec,
                    "expected '<category>/<item>' or '<registry>/<category>/<item>'",
                )
            })
    }
}

impl fmt::Display for ItemRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.registry {
            Some(registry) => write!(f, "{}/{}", registry, self.item),
            None => write!(f, "{}", self.item),
        }
    }
}
