//! Per-language import extraction
//!
//! Each supported file type is one [`Language`] variant. The builder picks
//! the first variant whose `matches` accepts a path; files no variant claims
//! are skipped with a warning. New languages are added as new variants.

mod component;
mod data;
pub(crate) mod lexer;
mod script;
mod style;

pub use component::ComponentLanguage;
pub use data::DataLanguage;
pub use script::ScriptLanguage;
pub use style::{StyleDialect, StyleLanguage};

use std::path::Path;

use crate::error::Result;

/// A source language the builder can scan.
pub trait Language: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &'static str;

    /// Whether this variant handles `path`
    fn matches(&self, path: &Path) -> bool;

    /// Raw module specifiers referenced by `content`, in source order.
    ///
    /// Returns `Error::Syntax` only when the file is too malformed to scan;
    /// anything merely unusual yields whatever could be found.
    fn extract_imports(&self, path: &Path, content: &str) -> Result<Vec<String>>;

    /// Wrap `text` in this language's comment syntax, if it has one.
    fn comment(&self, path: &Path, text: &str) -> Option<String>;

    /// `content` with `text` added as a leading comment, unless it is
    /// already there or the language has no comments.
    fn watermark(&self, path: &Path, content: &str, text: &str) -> String {
        match self.comment(path, text) {
            Some(comment) if !content.starts_with(&comment) => format!("{}\n{}", comment, content),
            _ => content.to_string(),
        }
    }

    /// Normalize installed content: LF line endings and one trailing newline.
    fn format(&self, content: &str) -> String {
        let mut out = content.replace("\r\n", "\n");
        let trimmed = out.trim_end_matches('\n').len();
        out.truncate(trimmed);
        out.push('\n');
        out
    }
}

/// Ordered set of language variants.
pub struct Languages {
    variants: Vec<Box<dyn Language>>,
}

impl Languages {
    pub fn new(variants: Vec<Box<dyn Language>>) -> Self {
        Self { variants }
    }

    /// The first variant claiming `path`.
    pub fn for_path(&self, path: &Path) -> Option<&dyn Language> {
        self.variants
            .iter()
            .find(|lang| lang.matches(path))
            .map(|lang| lang.as_ref())
    }

    pub fn supports(&self, path: &Path) -> bool {
        self.for_path(path).is_some()
    }
}

impl Default for Languages {
    fn default() -> Self {
        Self::new(vec![
            Box::new(ScriptLanguage),
            Box::new(StyleLanguage),
            Box::new(ComponentLanguage),
            Box::new(DataLanguage),
        ])
    }
}

impl std::fmt::Debug for Languages {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.variants.iter().map(|v| v.name()))
            .finish()
    }
}

pub(crate) fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

pub(crate) fn push_unique(list: &mut Vec<String>, value: String) {
    if !list.contains(&value) {
        list.push(value);
    }
}
