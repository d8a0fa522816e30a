//! Build outcome: the manifest plus everything worth telling the publisher.

use std::path::PathBuf;

use crate::manifest::{FileRole, ItemRef, Manifest};

/// Non-fatal conditions met while building. The affected file is left out
/// and the build carries on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildWarning {
    #[error("{}: unsupported file type, skipped", .path.display())]
    UnsupportedFileType { path: PathBuf },

    #[error("{}: documentation files are skipped unless include_docs is set", .path.display())]
    DocsNotIncluded { path: PathBuf },

    #[error(
        "{}: nested directory skipped, set allow_subdirectories to include it",
        .path.display()
    )]
    NestedDirectory { path: PathBuf },

    #[error("{}: no item named '{name}' to attach this {role} file to", .path.display())]
    OrphanedFile {
        path: PathBuf,
        name: String,
        role: FileRole,
    },

    #[error("{}: '{specifier}' is not a valid package name ({reason}), skipped", .file.display())]
    InvalidPackageName {
        file: PathBuf,
        specifier: String,
        reason: String,
    },
}

/// Result of a successful build.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub manifest: Manifest,
    pub warnings: Vec<BuildWarning>,
    /// Unlisted items dropped because nothing reaches them
    pub pruned: Vec<ItemRef>,
}

impl BuildReport {
    pub fn item_count(&self) -> usize {
        self.manifest.items().count()
    }
}
