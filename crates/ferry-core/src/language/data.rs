//! Structured data and prose: never imports anything.

use std::path::Path;

use super::{Language, has_extension};
use crate::error::Result;

const HASH_COMMENTED: &[&str] = &["yaml", "yml", "toml"];
const MARKUP_COMMENTED: &[&str] = &["md", "mdx", "html", "svg"];
const UNCOMMENTED: &[&str] = &["json", "jsonc", "json5", "txt"];

#[derive(Debug, Default, Clone, Copy)]
pub struct DataLanguage;

impl Language for DataLanguage {
    fn name(&self) -> &'static str {
        "data"
    }

    fn matches(&self, path: &Path) -> bool {
        has_extension(path, HASH_COMMENTED)
            || has_extension(path, MARKUP_COMMENTED)
            || has_extension(path, UNCOMMENTED)
    }

    fn extract_imports(&self, _path: &Path, _content: &str) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    fn comment(&self, path: &Path, text: &str) -> Option<String> {
        if has_extension(path, HASH_COMMENTED) {
            Some(format!("# {}", text))
        } else if has_extension(path, MARKUP_COMMENTED) {
            Some(format!("<!-- {} -->", text))
        } else {
            None
        }
    }
}
