//! Manifest assembly
//!
//! Runs language extraction and import classification over every discovered
//! file, merges the results per item and validates the finished graph.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::config::{BuildConfig, ConfigFileEntry};
use super::report::{BuildReport, BuildWarning};
use super::walker::{ItemSource, SourceFile, Walker};
use crate::classify::{Classification, ClassifyContext, ImportClassifier, RegistryRoots};
use crate::error::{Error, Result};
use crate::fs::{normalize, to_slash};
use crate::language::Languages;
use crate::manifest::{
    Category, ConfigFile, FileRole, Item, ItemFile, ItemRef, Manifest, RemoteDependency,
};

/// Builds a [`Manifest`] from a project directory.
///
/// # Algorithm
/// - Every immediate subdirectory of a root is a category
/// - Every file or directory in a category is an item
/// - Imports of every included file are classified and merged per item
/// - Local dependencies must name items of the same manifest
/// - Unlisted items nothing reaches are pruned when enabled
pub struct ManifestBuilder {
    cwd: PathBuf,
    config: BuildConfig,
    languages: Languages,
}

impl ManifestBuilder {
    pub fn new(cwd: impl Into<PathBuf>, config: BuildConfig) -> Self {
        Self {
            cwd: cwd.into(),
            config,
            languages: Languages::default(),
        }
    }

    pub fn with_languages(mut self, languages: Languages) -> Self {
        self.languages = languages;
        self
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    pub fn build(&self) -> Result<BuildReport> {
        self.config.validate()?;

        let roots: Vec<PathBuf> = self
            .config
            .dirs
            .iter()
            .map(|dir| normalize(&self.cwd.join(dir)))
            .collect();
        let mut classifier = ImportClassifier::new(RegistryRoots::new(&roots))
            .with_excluded(self.config.exclude_deps.iter().cloned());

        let mut warnings = Vec::new();
        let walker = Walker {
            config: &self.config,
            languages: &self.languages,
            patterns: self.config.include_patterns()?,
            cwd: &self.cwd,
        };
        let discovered = walker.discover(&roots, &mut warnings)?;

        let mut errors = Vec::new();
        let mut categories = Vec::new();
        for (name, sources) in discovered {
            let items = sources
                .iter()
                .map(|source| self.assemble_item(source, &mut classifier, &mut warnings, &mut errors))
                .collect();
            categories.push(Category { name, items });
        }

        let config_files = self
            .config
            .config_files
            .iter()
            .filter_map(|entry| {
                self.assemble_config_file(entry, &mut classifier, &mut warnings)
                    .map_err(|e| errors.push(e))
                    .ok()
            })
            .collect();

        let mut manifest = Manifest {
            name: self.config.name.clone(),
            version: self.config.version.clone(),
            homepage: self.config.homepage.clone(),
            meta: self.config.meta.clone(),
            default_paths: self.config.default_paths.clone(),
            config_files,
            categories,
        };

        errors.extend(missing_dependencies(&manifest));
        if !errors.is_empty() {
            return Err(Error::Build { errors });
        }

        let pruned = if self.config.prune_unused {
            prune_unused(&mut manifest)
        } else {
            Vec::new()
        };

        for warning in &warnings {
            warn!("{}", warning);
        }
        info!(
            "Built manifest with {} item(s) in {} categories",
            manifest.items().count(),
            manifest.categories.len()
        );

        Ok(BuildReport {
            manifest,
            warnings,
            pruned,
        })
    }

    fn assemble_item(
        &self,
        source: &ItemSource,
        classifier: &mut ImportClassifier,
        warnings: &mut Vec<BuildWarning>,
        errors: &mut Vec<Error>,
    ) -> Item {
        let id = ItemRef::new(&source.category, &source.name);
        let mut deps = DependencySet::default();
        let mut imports = BTreeMap::new();
        let containing_dir = source.subdirectory.then_some(source.dir.as_path());

        for file in &source.files {
            if file.verbatim {
                continue;
            }
            let specifiers = match self.read_imports(file) {
                Ok(specifiers) => specifiers,
                Err(e) => {
                    errors.push(e);
                    continue;
                }
            };

            let ctx = ClassifyContext {
                file: &file.absolute,
                containing_dir,
            };
            for specifier in specifiers {
                match classifier.classify(&specifier, &ctx) {
                    Ok(Classification::Local {
                        dependency,
                        template,
                    }) => {
                        if dependency == id {
                            continue;
                        }
                        deps.add_local(dependency);
                        imports.insert(specifier, template);
                    }
                    Ok(Classification::External { dependency, dev }) => {
                        deps.add_external(dependency, dev || file.role == FileRole::Test);
                    }
                    Ok(Classification::Skipped { reason }) => {
                        warnings.push(BuildWarning::InvalidPackageName {
                            file: file.absolute.clone(),
                            specifier,
                            reason,
                        });
                    }
                    Ok(other) => debug!("{}: '{}' -> {:?}", file.path, specifier, other),
                    Err(e) => errors.push(e),
                }
            }
        }

        let (local_dependencies, dependencies, dev_dependencies) = deps.into_parts();
        Item {
            listed: self.config.is_listed(&source.category, &source.name),
            name: source.name.clone(),
            category: source.category.clone(),
            directory: self.relative_to_cwd(&source.dir),
            files: source
                .files
                .iter()
                .map(|f| ItemFile::new(f.path.clone(), f.role.clone()))
                .collect(),
            subdirectory: source.subdirectory,
            local_dependencies,
            dependencies,
            dev_dependencies,
            imports,
        }
    }

    fn assemble_config_file(
        &self,
        entry: &ConfigFileEntry,
        classifier: &mut ImportClassifier,
        warnings: &mut Vec<BuildWarning>,
    ) -> Result<ConfigFile> {
        let absolute = normalize(&self.cwd.join(&entry.path));
        let mut deps = DependencySet::default();

        if self.languages.supports(&absolute) {
            let file = SourceFile {
                absolute: absolute.clone(),
                path: entry.path.clone(),
                role: FileRole::Primary,
                verbatim: false,
            };
            let ctx = ClassifyContext {
                file: &absolute,
                containing_dir: None,
            };
            for specifier in self.read_imports(&file)? {
                match classifier.classify(&specifier, &ctx)? {
                    Classification::Local { .. } => {
                        return Err(Error::ConfigFileLocalImport {
                            name: entry.name.clone(),
                            specifier,
                        });
                    }
                    Classification::External { dependency, dev } => {
                        deps.add_external(dependency, dev);
                    }
                    Classification::Skipped { reason } => {
                        warnings.push(BuildWarning::InvalidPackageName {
                            file: absolute.clone(),
                            specifier,
                            reason,
                        });
                    }
                    _ => {}
                }
            }
        } else if !absolute.is_file() {
            return Err(Error::read_path(
                &absolute,
                std::io::Error::from(std::io::ErrorKind::NotFound),
            ));
        }

        let (_, dependencies, dev_dependencies) = deps.into_parts();
        Ok(ConfigFile {
            name: entry.name.clone(),
            path: self.relative_to_cwd(&absolute),
            expected_path: entry.expected_path.clone(),
            optional: entry.optional,
            dependencies,
            dev_dependencies,
        })
    }

    fn read_imports(&self, file: &SourceFile) -> Result<Vec<String>> {
        let Some(language) = self.languages.for_path(&file.absolute) else {
            return Ok(Vec::new());
        };
        let content = std::fs::read_to_string(&file.absolute)
            .map_err(|e| Error::read_path(&file.absolute, e))?;
        language.extract_imports(&file.absolute, &content)
    }

    fn relative_to_cwd(&self, path: &Path) -> String {
        let cwd = normalize(&self.cwd);
        match path.strip_prefix(&cwd) {
            Ok(relative) => to_slash(relative),
            Err(_) => to_slash(path),
        }
    }
}

/// Dependencies of one item, deduplicated by identity in first-seen order.
#[derive(Debug, Default)]
struct DependencySet {
    local: Vec<ItemRef>,
    external: Vec<RemoteDependency>,
    dev: Vec<RemoteDependency>,
}

impl DependencySet {
    fn add_local(&mut self, item: ItemRef) {
        if !self.local.contains(&item) {
            self.local.push(item);
        }
    }

    fn add_external(&mut self, dependency: RemoteDependency, dev: bool) {
        let target = if dev { &mut self.dev } else { &mut self.external };
        if !target.iter().any(|d| d.name == dependency.name) {
            target.push(dependency);
        }
    }

    /// Split into (local, runtime, dev). A package used at runtime anywhere
    /// is not also a dev dependency.
    fn into_parts(self) -> (Vec<ItemRef>, Vec<RemoteDependency>, Vec<RemoteDependency>) {
        let runtime: BTreeSet<&str> = self.external.iter().map(|d| d.name.as_str()).collect();
        let dev = self
            .dev
            .iter()
            .filter(|d| !runtime.contains(d.name.as_str()))
            .cloned()
            .collect();
        (self.local, self.external, dev)
    }
}

fn missing_dependencies(manifest: &Manifest) -> Vec<Error> {
    manifest
        .items()
        .flat_map(|item| {
            item.local_dependencies
                .iter()
                .filter(|dep| !manifest.contains(dep))
                .map(|dep| Error::MissingLocalDependency {
                    item: item.id().to_string(),
                    dependency: dep.to_string(),
                })
        })
        .collect()
}

/// Drop unlisted items that no listed item reaches. Returns what was dropped.
fn prune_unused(manifest: &mut Manifest) -> Vec<ItemRef> {
    let mut reachable: BTreeSet<ItemRef> = BTreeSet::new();
    let mut queue: VecDeque<ItemRef> = manifest.listed_items().map(Item::id).collect();

    while let Some(id) = queue.pop_front() {
        if !reachable.insert(id.clone()) {
            continue;
        }
        if let Some(item) = manifest.find(&id) {
            queue.extend(item.local_dependencies.iter().cloned());
        }
    }

    let mut pruned = Vec::new();
    for category in &mut manifest.categories {
        category.items.retain(|item| {
            let keep = reachable.contains(&item.id());
            if !keep {
                debug!("Pruning unused item '{}'", item.id());
                pruned.push(item.id());
            }
            keep
        });
    }
    manifest.categories.retain(|c| !c.items.is_empty());
    pruned
}
