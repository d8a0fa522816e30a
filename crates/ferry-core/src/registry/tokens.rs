//! Provider tokens

use std::collections::HashMap;

use crate::provider::Locator;

/// Source of access tokens, asked once per provider call.
pub trait TokenStore: Send + Sync {
    fn token(&self, provider: &str, locator: &Locator) -> Option<String>;
}

/// Tokens held in memory. A token for a specific locator wins over one for
/// the whole provider.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    by_provider: HashMap<String, String>,
    by_locator: HashMap<Locator, String>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_provider_token(mut self, provider: impl Into<String>, token: impl Into<String>) -> Self {
        self.by_provider.insert(provider.into(), token.into());
        self
    }

    pub fn with_locator_token(mut self, locator: Locator, token: impl Into<String>) -> Self {
        self.by_locator.insert(locator, token.into());
        self
    }
}

impl TokenStore for MemoryTokenStore {
    fn token(&self, provider: &str, locator: &Locator) -> Option<String> {
        self.by_locator
            .get(locator)
            .or_else(|| self.by_provider.get(provider))
            .cloned()
    }
}

/// Reads `FERRY_<PROVIDER>_TOKEN` from the environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvTokenStore;

impl EnvTokenStore {
    pub fn variable(provider: &str) -> String {
        format!("FERRY_{}_TOKEN", provider.to_ascii_uppercase().replace('-', "_"))
    }
}

impl TokenStore for EnvTokenStore {
    fn token(&self, provider: &str, _locator: &Locator) -> Option<String> {
        std::env::var(Self::variable(provider))
            .ok()
            .filter(|t| !t.trim().is_empty())
    }
}
