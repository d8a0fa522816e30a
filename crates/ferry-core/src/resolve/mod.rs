//! Dependency resolution
//!
//! Requested items are looked up across resolved registries, their local
//! dependencies walked into install order, and the chosen files fetched
//! concurrently. Resolution fails as a whole on the first fatal error.

pub mod abort;
mod fetch;
mod graph;
mod request;

pub use abort::{AbortHandle, AbortSignal};
pub use fetch::{FetchedFile, FetchedItem, fetch_items};
pub use graph::{DependencyResolver, ResolvedItem};
pub use request::ItemRequest;

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::Result;
use crate::registry::{RegistryResolver, ResolvedRegistry};

/// Resolve the configured registries plus any registry a request names.
///
/// Registries are deduplicated by locator; configured ones come first, in
/// their configured order.
pub async fn resolve_registries(
    resolver: &RegistryResolver,
    configured: &[String],
    requests: &[ItemRequest],
) -> Result<Vec<Arc<ResolvedRegistry>>> {
    let mut seen = HashSet::new();
    let mut urls = Vec::new();
    let named = requests.iter().filter_map(|r| r.registry.as_ref());
    for url in configured.iter().chain(named) {
        let locator = resolver.providers().parse(url, false)?.locator;
        if seen.insert(locator) {
            urls.push(url.clone());
        }
    }
    resolver.resolve_all(&urls).await
}
