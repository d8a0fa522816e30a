//! Ferry Core Library
//!
//! Builds registry manifests from source directories, resolves items and
//! their local dependencies across remote registries, and rewrites imports
//! for the consumer's project layout.

pub mod build;
pub mod classify;
pub mod config;
pub mod error;
pub mod fs;
pub mod language;
pub mod manifest;
pub mod provider;
pub mod registry;
pub mod resolve;
pub mod rewrite;

pub use error::{Error, Result};

/// Re-exports of commonly used types
pub mod prelude {
    // Configuration
    pub use crate::config::{FerryConfig, parse_ferry_toml, parse_ferry_toml_str};

    // Manifest
    pub use crate::manifest::{FileRole, Item, ItemFile, ItemRef, MANIFEST_FILE, Manifest};

    // Building
    pub use crate::build::{BuildConfig, BuildReport, BuildWarning, ManifestBuilder};
    pub use crate::language::{Language, Languages};

    // Providers and registries
    pub use crate::provider::{Locator, Provider, ProviderState, Providers, default_client};
    pub use crate::registry::{
        EnvTokenStore, FileStateCache, MemoryStateCache, RegistryResolver, ResolvedRegistry,
        StateCache, TokenStore,
    };

    // Resolution and installation
    pub use crate::resolve::{
        AbortHandle, AbortSignal, DependencyResolver, FetchedItem, ItemRequest, ResolvedItem,
        fetch_items, resolve_registries,
    };
    pub use crate::rewrite::{InstallPaths, RewrittenFile, Rewriter};

    pub use crate::error::{Error, Result};
}
