//! `compilerOptions.paths` aliases from `tsconfig.json` / `jsconfig.json`.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use super::package_json::wildcard_capture;
use crate::error::{Error, Result};
use crate::fs::{normalize, split_source_extension};
use crate::language::lexer::{Syntax, strip_comments};

/// Checked in this order within one directory.
pub const CONFIG_FILES: &[&str] = &["tsconfig.json", "jsconfig.json"];

static TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",(\s*[}\]])").expect("trailing comma pattern"));

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawConfig {
    #[serde(default)]
    compiler_options: RawCompilerOptions,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCompilerOptions {
    base_url: Option<String>,
    #[serde(default)]
    paths: BTreeMap<String, Vec<String>>,
}

/// Alias table of one config file.
#[derive(Debug, Clone, Default)]
pub struct PathAliases {
    /// Directory targets are resolved against
    base_dir: PathBuf,
    paths: BTreeMap<String, Vec<String>>,
}

impl PathAliases {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::read_path(path, e))?;
        let dir = path.parent().unwrap_or(Path::new(""));
        Self::parse(dir, &content).map_err(|message| Error::parse(path.display().to_string(), message))
    }

    /// Parse JSON-with-comments config text located in `dir`.
    pub fn parse(dir: &Path, content: &str) -> std::result::Result<Self, String> {
        let stripped = strip_comments(content, Syntax::JSONC)?;
        let json = TRAILING_COMMA.replace_all(&stripped, "$1");
        let raw: RawConfig = serde_json::from_str(&json).map_err(|e| e.to_string())?;

        let base_dir = match &raw.compiler_options.base_url {
            Some(base) => normalize(&dir.join(base)),
            None => normalize(dir),
        };
        Ok(Self {
            base_dir,
            paths: raw.compiler_options.paths,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Resolve `specifier` to a path through the first target of the best
    /// matching pattern.
    ///
    /// A specifier with a source extension matches an extensionless pattern
    /// and vice versa.
    pub fn resolve(&self, specifier: &str) -> Option<PathBuf> {
        let (stem, _) = split_source_extension(specifier);

        for (pattern, targets) in &self.paths {
            if pattern.contains('*') {
                continue;
            }
            if pattern == specifier || split_source_extension(pattern).0 == stem {
                let target = targets.first()?;
                return Some(normalize(&self.base_dir.join(target)));
            }
        }

        let (pattern, capture) = self
            .paths
            .keys()
            .filter_map(|pattern| wildcard_capture(pattern, specifier).map(|c| (pattern, c)))
            .max_by_key(|(pattern, _)| pattern.find('*').unwrap_or(0))?;
        let target = self.paths.get(pattern)?.first()?;
        Some(normalize(&self.base_dir.join(target.replacen('*', capture, 1))))
    }
}
