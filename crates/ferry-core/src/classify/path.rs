//! Mapping resolved paths onto registry items.

use std::path::{Path, PathBuf};

use crate::fs::{normalize, to_slash};
use crate::manifest::ItemRef;

/// Item name used when an import points at a category directory itself.
pub const INDEX_ITEM: &str = "index";

/// A path that landed inside a registry root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalTarget {
    pub dependency: ItemRef,
    /// `{{category/item}}` followed by whatever trailed the item segment
    pub template: String,
}

/// Directories whose immediate subdirectories are categories.
#[derive(Debug, Clone, Default)]
pub struct RegistryRoots {
    roots: Vec<PathBuf>,
}

impl RegistryRoots {
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        Self {
            roots: roots.into_iter().map(|r| normalize(r.as_ref())).collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.roots.iter().map(PathBuf::as_path)
    }

    /// The most specific root containing `path`.
    pub fn root_of(&self, path: &Path) -> Option<&Path> {
        self.roots
            .iter()
            .filter(|root| path.starts_with(root))
            .max_by_key(|root| root.components().count())
            .map(PathBuf::as_path)
    }

    /// Map an absolute, normalized path to the item it belongs to.
    ///
    /// Returns `None` when the path is outside every root or names a root
    /// itself rather than something inside a category.
    pub fn locate(&self, path: &Path) -> Option<LocalTarget> {
        let root = self.root_of(path)?;
        let rest = path.strip_prefix(root).ok()?;
        let rest = to_slash(rest);
        let mut segments = rest.splitn(3, '/');

        let category = segments.next().filter(|s| !s.is_empty())?;
        let (item, suffix) = match segments.next() {
            None | Some("") => (INDEX_ITEM.to_string(), String::new()),
            // A segment followed by more path, or naming a directory on disk,
            // is a directory item and keeps its full name.
            Some(segment) => match segments.next() {
                Some(tail) => (segment.to_string(), format!("/{}", tail)),
                None if path.is_dir() => (segment.to_string(), String::new()),
                None => {
                    let (name, ext) = split_item_segment(segment);
                    (name.to_string(), ext.to_string())
                }
            },
        };

        let dependency = ItemRef::new(category, item);
        let template = format!("{}{}", placeholder(&dependency), suffix);
        Some(LocalTarget {
            dependency,
            template,
        })
    }
}

/// `{{category/item}}`
pub fn placeholder(item: &ItemRef) -> String {
    format!("{{{{{}}}}}", item)
}

/// File items are named by everything before the first dot.
pub fn split_item_segment(segment: &str) -> (&str, &str) {
    match segment.find('.') {
        Some(idx) if idx > 0 => segment.split_at(idx),
        _ => (segment, ""),
    }
}
