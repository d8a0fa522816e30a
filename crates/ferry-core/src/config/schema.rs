//! Configuration schema for ferry.toml

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::build::BuildConfig;
use crate::error::{Error, Result};
use crate::manifest::FileRole;

/// Root of `ferry.toml`.
///
/// Consumers fill in `registries` and `[paths]`; registry authors add a
/// `[build]` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FerryConfig {
    /// Registry URLs in priority order
    #[serde(default)]
    pub registries: Vec<String>,

    #[serde(default)]
    pub include_tests: bool,

    #[serde(default)]
    pub include_docs: bool,

    #[serde(default)]
    pub include_examples: bool,

    /// Mark installed files with a one-line comment
    #[serde(default)]
    pub watermark: bool,

    /// Category -> install path; `"*"` covers categories without an entry
    #[serde(default)]
    pub paths: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build: Option<BuildConfig>,
}

impl FerryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Roles fetched in addition to primary files.
    pub fn soft_roles(&self) -> Vec<FileRole> {
        let mut roles = Vec::new();
        if self.include_tests {
            roles.push(FileRole::Test);
        }
        if self.include_docs {
            roles.push(FileRole::Doc);
        }
        if self.include_examples {
            roles.push(FileRole::Example);
        }
        roles
    }

    pub fn validate(&self) -> Result<()> {
        for (category, path) in &self.paths {
            if category.trim().is_empty() {
                return Err(Error::Config("paths: empty category name".to_string()));
            }
            if path.trim().is_empty() {
                return Err(Error::Config(format!(
                    "paths.{}: install path must not be empty",
                    category
                )));
            }
        }
        for url in &self.registries {
            if url.trim().is_empty() {
                return Err(Error::Config("registries: empty registry URL".to_string()));
            }
        }
        if let Some(build) = &self.build {
            build.validate()?;
        }
        Ok(())
    }
}
