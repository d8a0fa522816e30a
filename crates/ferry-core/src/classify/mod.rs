//! Import classification
//!
//! Decides what each extracted specifier is: a platform builtin, a reference
//! to another item of the same registry, or an external package. Local
//! references are turned into placeholder templates the rewriter replays at
//! install time.

mod builtins;
mod package_json;
mod package_name;
mod path;
mod tsconfig;

pub use builtins::is_builtin;
pub use package_json::{PACKAGE_JSON, PackageJson, PinnedVersion};
pub use package_name::{split as split_package_specifier, validate as validate_package_name};
pub use path::{INDEX_ITEM, LocalTarget, RegistryRoots, placeholder, split_item_segment};
pub use tsconfig::{CONFIG_FILES as ALIAS_CONFIG_FILES, PathAliases};

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::fs::{is_path_specifier, normalize};
use crate::manifest::{ItemRef, RemoteDependency};

/// Outcome of classifying one specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Platform module, ignored
    Builtin,
    /// Points inside the item being scanned
    Internal,
    Local {
        dependency: ItemRef,
        template: String,
    },
    External {
        dependency: RemoteDependency,
        /// Pinned from `devDependencies` only
        dev: bool,
    },
    /// Named in the excluded dependency list
    Excluded { name: String },
    /// Not a valid package name and not an alias of anything local
    Skipped { reason: String },
}

/// Where the specifier was found.
#[derive(Debug, Clone, Copy)]
pub struct ClassifyContext<'a> {
    pub file: &'a Path,
    /// Directory of the item being scanned, for subdirectory items
    pub containing_dir: Option<&'a Path>,
}

/// Classifier for one build. Caches `package.json` and alias configs by
/// directory so sibling files share one lookup.
#[derive(Debug, Default)]
pub struct ImportClassifier {
    roots: RegistryRoots,
    exclude_deps: BTreeSet<String>,
    packages: HashMap<PathBuf, Option<Arc<PackageJson>>>,
    aliases: HashMap<PathBuf, Option<Arc<PathAliases>>>,
}

impl ImportClassifier {
    pub fn new(roots: RegistryRoots) -> Self {
        Self {
            roots,
            ..Self::default()
        }
    }

    pub fn with_excluded<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_deps = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn roots(&self) -> &RegistryRoots {
        &self.roots
    }

    pub fn classify(&mut self, specifier: &str, ctx: &ClassifyContext<'_>) -> Result<Classification> {
        if is_builtin(specifier) {
            return Ok(Classification::Builtin);
        }

        let file_dir = ctx.file.parent().unwrap_or(Path::new(""));

        if is_path_specifier(specifier) {
            let resolved = normalize(&file_dir.join(specifier));
            return self.classify_path(specifier, resolved, ctx);
        }

        if let Some(resolved) = self.resolve_alias(specifier, file_dir)
            && self.roots.root_of(&resolved).is_some()
        {
            debug!(
                "{}: alias '{}' -> {}",
                ctx.file.display(),
                specifier,
                resolved.display()
            );
            return self.classify_path(specifier, resolved, ctx);
        }

        Ok(self.classify_external(specifier, file_dir))
    }

    fn classify_path(
        &self,
        specifier: &str,
        resolved: PathBuf,
        ctx: &ClassifyContext<'_>,
    ) -> Result<Classification> {
        if let Some(dir) = ctx.containing_dir
            && resolved.starts_with(normalize(dir))
        {
            return Ok(Classification::Internal);
        }

        match self.roots.locate(&resolved) {
            Some(LocalTarget {
                dependency,
                template,
            }) => Ok(Classification::Local {
                dependency,
                template,
            }),
            None => Err(Error::LocalDependencyUnresolved {
                file: ctx.file.to_path_buf(),
                specifier: specifier.to_string(),
                resolved,
            }),
        }
    }

    fn classify_external(&mut self, specifier: &str, file_dir: &Path) -> Classification {
        let (name, _) = split_package_specifier(specifier);
        if let Err(reason) = validate_package_name(name) {
            return Classification::Skipped { reason };
        }
        if self.exclude_deps.contains(name) {
            return Classification::Excluded {
                name: name.to_string(),
            };
        }

        let pinned = self
            .nearest_package(file_dir)
            .and_then(|package| package.version_of(name));
        let dev = pinned.as_ref().is_some_and(|p| p.dev);
        Classification::External {
            dependency: RemoteDependency::new(name, pinned.map(|p| p.version)),
            dev,
        }
    }

    fn resolve_alias(&mut self, specifier: &str, file_dir: &Path) -> Option<PathBuf> {
        if specifier.starts_with('#') {
            return self.nearest_package(file_dir)?.resolve_import(specifier);
        }
        self.nearest_aliases(file_dir)?.resolve(specifier)
    }

    fn nearest_package(&mut self, dir: &Path) -> Option<Arc<PackageJson>> {
        nearest(&mut self.packages, dir, &[PACKAGE_JSON], PackageJson::load)
    }

    fn nearest_aliases(&mut self, dir: &Path) -> Option<Arc<PathAliases>> {
        nearest(&mut self.aliases, dir, tsconfig::CONFIG_FILES, PathAliases::load)
    }
}

/// Walk up from `dir` to the first directory holding one of `names`,
/// memoizing the answer for every directory passed on the way.
fn nearest<T>(
    cache: &mut HashMap<PathBuf, Option<Arc<T>>>,
    dir: &Path,
    names: &[&str],
    load: impl Fn(&Path) -> Result<T>,
) -> Option<Arc<T>> {
    let mut visited = Vec::new();
    let mut current = Some(normalize(dir));
    let mut found = None;

    while let Some(dir) = current {
        if let Some(hit) = cache.get(&dir) {
            found = hit.clone();
            break;
        }
        let candidate = names.iter().map(|n| dir.join(n)).find(|p| p.is_file());
        if let Some(path) = candidate {
            found = match load(&path) {
                Ok(value) => Some(Arc::new(value)),
                Err(e) => {
                    warn!("Ignoring {}: {}", path.display(), e);
                    None
                }
            };
            visited.push(dir);
            break;
        }
        current = dir.parent().map(Path::to_path_buf);
        visited.push(dir);
    }

    for dir in visited {
        cache.insert(dir, found.clone());
    }
    found
}
