//! Registry resolution: URL to provider state plus manifest.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use reqwest::Client;
use tokio::task::JoinSet;
use tracing::{debug, info};

use super::cache::{MemoryStateCache, StateCache};
use super::tokens::{MemoryTokenStore, TokenStore};
use crate::error::{Error, Result};
use crate::manifest::{MANIFEST_FILE, Manifest};
use crate::provider::{FetchContext, Locator, Provider, ProviderState, Providers};
use crate::resolve::AbortSignal;
use crate::resolve::abort::join_error;

/// A registry whose manifest has been fetched.
#[derive(Debug, Clone)]
pub struct ResolvedRegistry {
    /// URL as the user wrote it
    pub url: String,
    pub state: ProviderState,
    pub manifest: Arc<Manifest>,
}

impl ResolvedRegistry {
    pub fn locator(&self) -> &Locator {
        &self.state.locator
    }
}

/// Resolves registries and fetches their files.
///
/// Tokens and the state cache are injected so tests can run against
/// in-memory fakes. Manifests are memoized per locator for the lifetime of
/// the resolver.
#[derive(Clone)]
pub struct RegistryResolver {
    providers: Providers,
    client: Client,
    tokens: Arc<dyn TokenStore>,
    cache: Arc<dyn StateCache>,
    manifests: Arc<Mutex<HashMap<Locator, Arc<Manifest>>>>,
    signal: AbortSignal,
}

impl RegistryResolver {
    pub fn new(providers: Providers, client: Client) -> Self {
        Self {
            providers,
            client,
            tokens: Arc::new(MemoryTokenStore::new()),
            cache: Arc::new(MemoryStateCache::new()),
            manifests: Arc::default(),
            signal: AbortSignal::never(),
        }
    }

    pub fn with_tokens(mut self, tokens: Arc<dyn TokenStore>) -> Self {
        self.tokens = tokens;
        self
    }

    pub fn with_cache(mut self, cache: Arc<dyn StateCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_signal(mut self, signal: AbortSignal) -> Self {
        self.signal = signal;
        self
    }

    pub fn providers(&self) -> &Providers {
        &self.providers
    }

    pub fn signal(&self) -> &AbortSignal {
        &self.signal
    }

    /// Resolve one registry URL: provider state (cached) then manifest.
    pub async fn resolve(&self, url: &str) -> Result<Arc<ResolvedRegistry>> {
        let provider = self.providers.select(url)?;
        let locator = provider.parse(url, false)?.locator;
        let token = self.tokens.token(provider.name(), &locator);
        let ctx = FetchContext {
            client: &self.client,
            token: token.as_deref(),
        };

        let cached = self
            .cache
            .get(&locator)
            .filter(|state| state.provider == provider.name());
        let from_cache = cached.is_some();
        let state = match cached {
            Some(state) => {
                debug!("Using cached state for {}", locator);
                state
            }
            None => {
                let state = self.signal.run(provider.resolve_state(&locator, ctx)).await?;
                self.cache.put(&state);
                state
            }
        };

        let manifest = match self.memoized(&locator) {
            Some(manifest) => manifest,
            None => {
                let manifest = match self.fetch_manifest(provider.as_ref(), &state, url, ctx).await {
                    Ok(manifest) => manifest,
                    Err(e) => {
                        // A stale ref is the usual reason a cached state stops working
                        if from_cache {
                            self.cache.invalidate(&locator);
                        }
                        return Err(e);
                    }
                };
                let manifest = Arc::new(manifest);
                self.manifests
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .insert(locator.clone(), Arc::clone(&manifest));
                manifest
            }
        };

        info!(
            "Resolved {} ({} item(s))",
            locator,
            manifest.items().count()
        );
        Ok(Arc::new(ResolvedRegistry {
            url: url.to_string(),
            state,
            manifest,
        }))
    }

    /// Resolve several registries concurrently, keeping input order.
    ///
    /// The first failure aborts the remaining work and is returned.
    pub async fn resolve_all(&self, urls: &[String]) -> Result<Vec<Arc<ResolvedRegistry>>> {
        let mut tasks = JoinSet::new();
        for (index, url) in urls.iter().enumerate() {
            let resolver = self.clone();
            let url = url.clone();
            tasks.spawn(async move { (index, resolver.resolve(&url).await) });
        }

        let mut slots: Vec<Option<Arc<ResolvedRegistry>>> = vec![None; urls.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined.map_err(join_error)? {
                (index, Ok(registry)) => slots[index] = Some(registry),
                (_, Err(e)) => {
                    tasks.abort_all();
                    return Err(e);
                }
            }
        }
        Ok(slots.into_iter().flatten().collect())
    }

    /// Fetch a file relative to a resolved registry's root.
    pub async fn fetch(&self, registry: &ResolvedRegistry, path: &str) -> Result<String> {
        let provider = self
            .providers
            .by_name(&registry.state.provider)
            .ok_or_else(|| Error::parse(&registry.url, "no provider produced this state"))?;
        let token = self.tokens.token(provider.name(), registry.locator());
        let ctx = FetchContext {
            client: &self.client,
            token: token.as_deref(),
        };
        self.signal
            .run(provider.fetch(&registry.state, path, ctx))
            .await
    }

    fn memoized(&self, locator: &Locator) -> Option<Arc<Manifest>> {
        self.manifests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(locator)
            .cloned()
    }

    async fn fetch_manifest(
        &self,
        provider: &dyn Provider,
        state: &ProviderState,
        url: &str,
        ctx: FetchContext<'_>,
    ) -> Result<Manifest> {
        let content = self
            .signal
            .run(provider.fetch(state, MANIFEST_FILE, ctx))
            .await?;
        Manifest::from_json(&content)
            .map_err(|e| Error::parse(format!("{}/{}", url, MANIFEST_FILE), e.to_string()))
    }
}

impl std::fmt::Debug for RegistryResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryResolver")
            .field("providers", &self.providers)
            .finish_non_exhaustive()
    }
}
