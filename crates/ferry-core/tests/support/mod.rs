#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{Value, json};

use ferry_core::Result;
use ferry_core::manifest::MANIFEST_FILE;
use ferry_core::provider::{
    FetchContext, Locator, ParsedUrl, Provider, ProviderState, Providers, split_item_specifier,
    status_error,
};
use ferry_core::registry::{MemoryStateCache, RegistryResolver};

/// In-memory registries addressed as `fake/<name>`.
#[derive(Default)]
pub struct FakeProvider {
    /// base url -> path -> content
    files: HashMap<String, HashMap<String, String>>,
    /// `base url/path` requests that never answer
    stalled: HashSet<String>,
    pub resolves: AtomicUsize,
    pub fetches: AtomicUsize,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_manifest(self, registry: &str, manifest: Value) -> Self {
        self.with_file(registry, MANIFEST_FILE, &manifest.to_string())
    }

    pub fn with_file(mut self, registry: &str, path: &str, content: &str) -> Self {
        self.files
            .entry(registry.to_string())
            .or_default()
            .insert(path.to_string(), content.to_string());
        self
    }

    pub fn with_stalled_file(mut self, registry: &str, path: &str) -> Self {
        self.stalled.insert(format!("{}/{}", registry, path));
        self
    }
}

#[async_trait]
impl Provider for FakeProvider {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn matches(&self, url: &str) -> bool {
        url.starts_with("fake/")
    }

    fn parse(&self, url: &str, fully_qualified: bool) -> Result<ParsedUrl> {
        if fully_qualified {
            let (registry, item) = split_item_specifier(url)?;
            return Ok(ParsedUrl {
                locator: Locator::new(registry),
                item: Some(item),
            });
        }
        Ok(ParsedUrl {
            locator: Locator::new(url.trim_end_matches('/')),
            item: None,
        })
    }

    async fn resolve_state(
        &self,
        locator: &Locator,
        _ctx: FetchContext<'_>,
    ) -> Result<ProviderState> {
        self.resolves.fetch_add(1, Ordering::SeqCst);
        Ok(ProviderState::new(
            "fake",
            locator.clone(),
            Some("main".to_string()),
            locator.as_str(),
        ))
    }

    async fn fetch(
        &self,
        state: &ProviderState,
        path: &str,
        ctx: FetchContext<'_>,
    ) -> Result<String> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.stalled.contains(&format!("{}/{}", state.base_url, path)) {
            std::future::pending::<()>().await;
        }
        self.files
            .get(&state.base_url)
            .and_then(|files| files.get(path))
            .cloned()
            .ok_or_else(|| {
                status_error(
                    "fake",
                    &format!("{}/{}", state.base_url, path),
                    404,
                    ctx.token.is_some(),
                )
            })
    }
}

pub fn resolver(provider: Arc<FakeProvider>) -> RegistryResolver {
    let provider: Arc<dyn Provider> = provider;
    RegistryResolver::new(Providers::new(vec![provider]), reqwest::Client::new())
        .with_cache(Arc::new(MemoryStateCache::new()))
}

/// Manifest JSON item with primary file `<name>.ts`.
pub fn item(category: &str, name: &str, local: &[&str]) -> Value {
    json!({
        "name": name,
        "category": category,
        "directory": category,
        "files": [format!("{}.ts", name)],
        "localDependencies": local,
    })
}

/// Manifest JSON from `(category, items)` pairs.
pub fn manifest(categories: &[(&str, Vec<Value>)]) -> Value {
    json!({
        "categories": categories
            .iter()
            .map(|(name, items)| json!({"name": name, "items": items}))
            .collect::<Vec<_>>(),
    })
}

pub fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}
