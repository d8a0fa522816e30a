//! Builder settings, read from the `[build]` table of `ferry.toml`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use glob::Pattern;

use crate::error::{Error, Result};

/// Filters and metadata for one manifest build.
///
/// Category and item filters are independent: `include_*` narrows to the
/// named entries when non-empty, `exclude_*` always wins. Item filters
/// accept either the bare item name or `category/name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Registry roots, relative to the project directory
    pub dirs: Vec<PathBuf>,

    pub include_categories: Vec<String>,
    pub exclude_categories: Vec<String>,
    pub include_blocks: Vec<String>,
    pub exclude_blocks: Vec<String>,

    /// When non-empty, only these categories are listed
    pub list_categories: Vec<String>,
    pub list_blocks: Vec<String>,
    pub do_not_list_categories: Vec<String>,
    pub do_not_list_blocks: Vec<String>,

    /// Packages never recorded as dependencies
    pub exclude_deps: Vec<String>,

    pub allow_subdirectories: bool,
    pub include_docs: bool,

    /// Globs of files copied verbatim even if no language handles them
    pub include_files: Vec<String>,

    /// Drop unlisted items nothing depends on
    pub prune_unused: bool,

    /// Where `ferry-manifest.json` is written
    pub output_dir: PathBuf,

    pub name: Option<String>,
    pub version: Option<String>,
    pub homepage: Option<String>,
    pub meta: BTreeMap<String, String>,
    pub default_paths: BTreeMap<String, String>,
    pub config_files: Vec<ConfigFileEntry>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            dirs: Vec::new(),
            include_categories: Vec::new(),
            exclude_categories: Vec::new(),
            include_blocks: Vec::new(),
            exclude_blocks: Vec::new(),
            list_categories: Vec::new(),
            list_blocks: Vec::new(),
            do_not_list_categories: Vec::new(),
            do_not_list_blocks: Vec::new(),
            exclude_deps: Vec::new(),
            allow_subdirectories: false,
            include_docs: false,
            include_files: Vec::new(),
            prune_unused: true,
            output_dir: PathBuf::from("."),
            name: None,
            version: None,
            homepage: None,
            meta: BTreeMap::new(),
            default_paths: BTreeMap::new(),
            config_files: Vec::new(),
        }
    }
}

/// A standalone config file to publish with the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigFileEntry {
    pub name: String,
    /// Source path, relative to the project directory
    pub path: String,
    /// Where consumers keep it
    pub expected_path: String,
    #[serde(default)]
    pub optional: bool,
}

impl BuildConfig {
    pub fn with_dirs<I, P>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.dirs = dirs.into_iter().map(Into::into).collect();
        self
    }

    pub fn includes_category(&self, category: &str) -> bool {
        (self.include_categories.is_empty() || contains(&self.include_categories, category))
            && !contains(&self.exclude_categories, category)
    }

    pub fn includes_item(&self, category: &str, name: &str) -> bool {
        (self.include_blocks.is_empty() || matches_item(&self.include_blocks, category, name))
            && !matches_item(&self.exclude_blocks, category, name)
    }

    pub fn is_listed(&self, category: &str, name: &str) -> bool {
        let category_listed = (self.list_categories.is_empty()
            || contains(&self.list_categories, category))
            && !contains(&self.do_not_list_categories, category);
        let item_listed = (self.list_blocks.is_empty()
            || matches_item(&self.list_blocks, category, name))
            && !matches_item(&self.do_not_list_blocks, category, name);
        category_listed && item_listed
    }

    /// Compile `include_files` globs.
    pub fn include_patterns(&self) -> Result<Vec<Pattern>> {
        self.include_files
            .iter()
            .map(|glob| {
                Pattern::new(glob)
                    .map_err(|e| Error::Config(format!("invalid include_files glob '{}': {}", glob, e)))
            })
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        if self.dirs.is_empty() {
            return Err(Error::Config(
                "build.dirs must name at least one directory".to_string(),
            ));
        }
        if let Some(version) = &self.version {
            semver::Version::parse(version).map_err(|e| {
                Error::Config(format!("build.version '{}' is not valid semver: {}", version, e))
            })?;
        }
        self.include_patterns()?;
        Ok(())
    }
}

fn contains(list: &[String], value: &str) -> bool {
    list.iter().any(|v| v == value)
}

fn matches_item(list: &[String], category: &str, name: &str) -> bool {
    list.iter().any(|entry| match entry.split_once('/') {
        Some((c, n)) => c == category && n == name,
        None => entry == name,
    })
}
