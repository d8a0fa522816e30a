//! Consumer install paths.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::classify::{ALIAS_CONFIG_FILES, PathAliases};
use crate::error::{Error, Result};
use crate::fs::normalize;
use crate::manifest::{Item, ItemFile, Manifest};

/// Key in the path map that applies to every category without its own entry.
pub const WILDCARD: &str = "*";

/// Where each category installs in the consumer's project.
///
/// Paths are kept the way the user wrote them. Relative paths (`./src/lib`)
/// are taken from `cwd`; alias-style paths (`$lib/utils`, `@/components`)
/// are mapped to disk through the project's tsconfig/jsconfig aliases.
#[derive(Debug, Clone)]
pub struct InstallPaths {
    cwd: PathBuf,
    paths: BTreeMap<String, String>,
    aliases: Option<PathAliases>,
}

impl InstallPaths {
    pub fn new(cwd: impl Into<PathBuf>, paths: BTreeMap<String, String>) -> Self {
        Self {
            cwd: cwd.into(),
            paths,
            aliases: None,
        }
    }

    pub fn with_aliases(mut self, aliases: PathAliases) -> Self {
        self.aliases = Some(aliases);
        self
    }

    /// Pick up `tsconfig.json` or `jsconfig.json` from `cwd`, if present.
    pub fn with_project_aliases(self) -> Result<Self> {
        for name in ALIAS_CONFIG_FILES {
            let path = self.cwd.join(name);
            if path.is_file() {
                debug!("Using aliases from {}", path.display());
                let aliases = PathAliases::load(&path)?;
                return Ok(self.with_aliases(aliases));
            }
        }
        Ok(self)
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Alias-style paths start with one of `$ @ ~ #`.
    pub fn is_alias(path: &str) -> bool {
        path.starts_with(['$', '@', '~', '#'])
    }

    /// Base directory for `category`, as configured.
    ///
    /// Lookup order: the category's own entry, the wildcard entry joined
    /// with the category name, the manifest's default path.
    pub fn category_dir(&self, category: &str, manifest: &Manifest) -> Result<String> {
        if let Some(path) = self.paths.get(category) {
            return Ok(path.clone());
        }
        if let Some(path) = self.paths.get(WILDCARD) {
            return Ok(join(path, category));
        }
        manifest
            .default_paths
            .get(category)
            .cloned()
            .ok_or_else(|| Error::NoInstallPath {
                category: category.to_string(),
            })
    }

    /// Directory an item's files go to; subdirectory items get their own.
    pub fn item_dir(&self, item: &Item, manifest: &Manifest) -> Result<String> {
        let base = self.category_dir(&item.category, manifest)?;
        Ok(if item.subdirectory {
            join(&base, &item.name)
        } else {
            base
        })
    }

    /// Final on-disk path of one file.
    pub fn file_path(&self, item: &Item, file: &ItemFile, manifest: &Manifest) -> Result<PathBuf> {
        if let Some(target) = &file.target {
            return Ok(normalize(&self.cwd.join(target)));
        }
        let dir = self.item_dir(item, manifest)?;
        self.to_fs(&join(&dir, &file.path))
    }

    /// Map a configured path to the filesystem.
    pub fn to_fs(&self, path: &str) -> Result<PathBuf> {
        if !Self::is_alias(path) {
            return Ok(normalize(&self.cwd.join(path)));
        }
        self.aliases
            .as_ref()
            .and_then(|aliases| aliases.resolve(path))
            .ok_or_else(|| {
                Error::Config(format!(
                    "install path '{}' looks like an alias but no tsconfig.json or jsconfig.json maps it",
                    path
                ))
            })
    }
}

/// Join configured path segments with `/`.
pub(crate) fn join(base: &str, rest: &str) -> String {
    let base = base.trim_end_matches('/');
    let rest = rest.trim_start_matches("./").trim_start_matches('/');
    if base.is_empty() {
        rest.to_string()
    } else {
        format!("{}/{}", base, rest)
    }
}
