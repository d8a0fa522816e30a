//! Remote registry hosts
//!
//! Every host is reached through the same three steps: `parse` a URL into a
//! canonical [`Locator`], `resolve_state` it (at most one metadata request,
//! falling back to a default instead of failing), then `fetch` files
//! relative to the registry root.

mod azure;
mod bitbucket;
mod github;
mod gitlab;
mod http;
mod index;
mod locator;
mod response;
mod state;

pub use azure::AzureProvider;
pub use bitbucket::BitbucketProvider;
pub use github::GitHubProvider;
pub use gitlab::GitLabProvider;
pub use http::HttpProvider;
pub use index::IndexProvider;
pub use locator::{Locator, ParsedUrl, split_item_specifier};
pub use response::{AuthHeader, default_client, status_error};
pub use state::ProviderState;

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{Error, Result};

/// What a provider call needs besides its own arguments.
#[derive(Debug, Clone, Copy)]
pub struct FetchContext<'a> {
    pub client: &'a Client,
    pub token: Option<&'a str>,
}

/// Protocol adapter for one class of remote host.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Short identifier, also used to look up tokens
    fn name(&self) -> &'static str;

    /// Whether this provider handles `url`
    fn matches(&self, url: &str) -> bool;

    /// Parse `url` into a locator. With `fully_qualified`, the last two
    /// segments name an item.
    fn parse(&self, url: &str, fully_qualified: bool) -> Result<ParsedUrl>;

    /// Learn what the locator leaves open, such as the default branch.
    async fn resolve_state(&self, locator: &Locator, ctx: FetchContext<'_>)
    -> Result<ProviderState>;

    /// Read one file, `path` relative to the registry root.
    async fn fetch(&self, state: &ProviderState, path: &str, ctx: FetchContext<'_>)
    -> Result<String>;
}

/// Ordered provider list; the first provider that matches a URL wins.
#[derive(Clone)]
pub struct Providers {
    providers: Vec<Arc<dyn Provider>>,
}

impl Providers {
    pub fn new(providers: Vec<Arc<dyn Provider>>) -> Self {
        Self { providers }
    }

    pub fn select(&self, url: &str) -> Result<Arc<dyn Provider>> {
        self.providers
            .iter()
            .find(|p| p.matches(url))
            .cloned()
            .ok_or_else(|| Error::parse(url, "no provider handles this registry URL"))
    }

    /// Provider that produced `state`.
    pub fn by_name(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.iter().find(|p| p.name() == name).cloned()
    }

    /// Parse `url` with whichever provider matches it.
    pub fn parse(&self, url: &str, fully_qualified: bool) -> Result<ParsedUrl> {
        self.select(url)?.parse(url, fully_qualified)
    }
}

impl Default for Providers {
    fn default() -> Self {
        Self::new(vec![
            Arc::new(IndexProvider::default()),
            Arc::new(GitHubProvider::default()),
            Arc::new(GitLabProvider::default()),
            Arc::new(BitbucketProvider::default()),
            Arc::new(AzureProvider::default()),
            Arc::new(HttpProvider),
        ])
    }
}

impl std::fmt::Debug for Providers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.providers.iter().map(|p| p.name()))
            .finish()
    }
}

/// Default branch used when discovery fails or is not possible.
pub const DEFAULT_BRANCH: &str = "main";
