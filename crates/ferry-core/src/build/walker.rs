//! Discovering categories, items and their files under the registry roots.

use std::fs;
use std::path::{Path, PathBuf};

use glob::Pattern;
use tracing::debug;
use walkdir::WalkDir;

use super::config::BuildConfig;
use super::report::BuildWarning;
use crate::classify::split_item_segment;
use crate::error::{Error, Result};
use crate::fs::to_slash;
use crate::language::Languages;
use crate::manifest::FileRole;

/// One file that belongs to an item.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub absolute: PathBuf,
    /// Relative to the item directory, `/`-separated
    pub path: String,
    pub role: FileRole,
    /// Matched an include glob; copied without import analysis
    pub verbatim: bool,
}

/// An item as found on disk, before its imports are analysed.
#[derive(Debug, Clone)]
pub struct ItemSource {
    pub category: String,
    pub name: String,
    /// Absolute directory holding the files
    pub dir: PathBuf,
    pub subdirectory: bool,
    pub files: Vec<SourceFile>,
}

/// Categories in discovery order, each with its items.
pub type Discovered = Vec<(String, Vec<ItemSource>)>;

pub(crate) struct Walker<'a> {
    pub config: &'a BuildConfig,
    pub languages: &'a Languages,
    pub patterns: Vec<Pattern>,
    /// Project directory, for matching include globs
    pub cwd: &'a Path,
}

impl Walker<'_> {
    /// Walk every root. An unreadable root is fatal; everything below a
    /// root degrades to warnings.
    pub fn discover(
        &self,
        roots: &[PathBuf],
        warnings: &mut Vec<BuildWarning>,
    ) -> Result<Discovered> {
        let mut categories: Discovered = Vec::new();

        for root in roots {
            for category_dir in sorted_entries(root)? {
                if !category_dir.is_dir() {
                    continue;
                }
                let Some(category) = file_name(&category_dir) else {
                    continue;
                };
                if !self.config.includes_category(&category) {
                    debug!("Skipping excluded category '{}'", category);
                    continue;
                }

                let items = self.discover_category(&category, &category_dir, warnings)?;
                if items.is_empty() {
                    continue;
                }
                match categories.iter_mut().find(|(name, _)| *name == category) {
                    Some((_, existing)) => existing.extend(items),
                    None => categories.push((category, items)),
                }
            }
        }

        Ok(categories)
    }

    fn discover_category(
        &self,
        category: &str,
        dir: &Path,
        warnings: &mut Vec<BuildWarning>,
    ) -> Result<Vec<ItemSource>> {
        let mut items: Vec<ItemSource> = Vec::new();
        // Attachments wait until every primary file of the category is known.
        let mut attachments: Vec<(String, SourceFile)> = Vec::new();

        for entry in sorted_entries(dir)? {
            let Some(entry_name) = file_name(&entry) else {
                continue;
            };

            if entry.is_dir() {
                if self.config.includes_item(category, &entry_name) {
                    items.push(self.discover_directory_item(category, &entry_name, &entry, warnings));
                }
                continue;
            }

            let (base, _) = split_item_segment(&entry_name);
            let base = base.to_string();
            if !self.config.includes_item(category, &base) {
                continue;
            }
            let Some(file) = self.source_file(&entry, entry_name.clone(), warnings) else {
                continue;
            };

            if file.role == FileRole::Primary {
                match items.iter_mut().find(|i| !i.subdirectory && i.name == base) {
                    Some(item) => item.files.push(file),
                    None => items.push(ItemSource {
                        category: category.to_string(),
                        name: base,
                        dir: dir.to_path_buf(),
                        subdirectory: false,
                        files: vec![file],
                    }),
                }
            } else {
                attachments.push((base, file));
            }
        }

        for (base, file) in attachments {
            match items.iter_mut().find(|i| !i.subdirectory && i.name == base) {
                Some(item) => item.files.push(file),
                None => warnings.push(BuildWarning::OrphanedFile {
                    path: file.absolute,
                    name: base,
                    role: file.role,
                }),
            }
        }

        Ok(items)
    }

    fn discover_directory_item(
        &self,
        category: &str,
        name: &str,
        dir: &Path,
        warnings: &mut Vec<BuildWarning>,
    ) -> ItemSource {
        let max_depth = if self.config.allow_subdirectories {
            usize::MAX
        } else {
            1
        };

        let mut files = Vec::new();
        let walker = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(max_depth)
            .sort_by_file_name();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("Skipping unreadable entry under {}: {}", dir.display(), e);
                    continue;
                }
            };
            let path = entry.path();

            if entry.file_type().is_dir() {
                if !self.config.allow_subdirectories {
                    warnings.push(BuildWarning::NestedDirectory {
                        path: path.to_path_buf(),
                    });
                }
                continue;
            }

            let Ok(relative) = path.strip_prefix(dir) else {
                continue;
            };
            if let Some(file) = self.source_file(path, to_slash(relative), warnings) {
                files.push(file);
            }
        }

        ItemSource {
            category: category.to_string(),
            name: name.to_string(),
            dir: dir.to_path_buf(),
            subdirectory: true,
            files,
        }
    }

    /// Decide whether and how a file is included.
    fn source_file(
        &self,
        absolute: &Path,
        path: String,
        warnings: &mut Vec<BuildWarning>,
    ) -> Option<SourceFile> {
        if self.is_explicitly_included(absolute) {
            return Some(SourceFile {
                absolute: absolute.to_path_buf(),
                path,
                role: FileRole::Primary,
                verbatim: true,
            });
        }

        let file_name = absolute.file_name()?.to_string_lossy().into_owned();
        let role = role_for(&file_name);

        if role == FileRole::Doc && !self.config.include_docs {
            warnings.push(BuildWarning::DocsNotIncluded {
                path: absolute.to_path_buf(),
            });
            return None;
        }
        if !self.languages.supports(absolute) {
            warnings.push(BuildWarning::UnsupportedFileType {
                path: absolute.to_path_buf(),
            });
            return None;
        }

        Some(SourceFile {
            absolute: absolute.to_path_buf(),
            path,
            role,
            verbatim: false,
        })
    }

    fn is_explicitly_included(&self, absolute: &Path) -> bool {
        if self.patterns.is_empty() {
            return false;
        }
        let relative = absolute
            .strip_prefix(self.cwd)
            .map(to_slash)
            .unwrap_or_else(|_| to_slash(absolute));
        let name = absolute
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.patterns
            .iter()
            .any(|p| p.matches(&relative) || p.matches(&name))
    }
}

/// Role implied by a file name.
///
/// `x.test.ts` and `x.spec.ts` are tests, `x.example.ts` is an example and
/// Markdown is documentation.
pub fn role_for(file_name: &str) -> FileRole {
    let segments: Vec<&str> = file_name.split('.').collect();
    let inner = if segments.len() > 2 {
        &segments[1..segments.len() - 1]
    } else {
        &[][..]
    };
    if inner.iter().any(|s| *s == "test" || *s == "spec") {
        return FileRole::Test;
    }
    if inner.contains(&"example") {
        return FileRole::Example;
    }
    match segments.last().map(|ext| ext.to_ascii_lowercase()) {
        Some(ext) if segments.len() > 1 && (ext == "md" || ext == "mdx") => FileRole::Doc,
        _ => FileRole::Primary,
    }
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| Error::read_path(dir, e))?;
    let mut paths = entries
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(|e| Error::read_path(dir, e))?;
    paths.sort();
    Ok(paths)
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}
