//! Resolved provider state.

use serde::{Deserialize, Serialize};

use super::Locator;

/// A locator plus whatever took a network round-trip to learn.
///
/// Immutable once created and safe to cache by locator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderState {
    /// Name of the provider that produced this state
    pub provider: String,
    pub locator: Locator,
    /// Branch, tag or version files are read from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Prefix every file URL is built from
    pub base_url: String,
}

impl ProviderState {
    pub fn new(
        provider: impl Into<String>,
        locator: Locator,
        reference: Option<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            provider: provider.into(),
            locator,
            reference,
            base_url: base_url.into(),
        }
    }
}
