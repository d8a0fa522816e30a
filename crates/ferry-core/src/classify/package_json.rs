//! The parts of `package.json` the classifier reads: dependency versions and
//! `#` subpath imports.

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::fs::normalize;

pub const PACKAGE_JSON: &str = "package.json";

/// Where a pinned version came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinnedVersion {
    pub version: String,
    /// Only listed under `devDependencies`
    pub dev: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageJson {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,

    #[serde(default)]
    pub dev_dependencies: BTreeMap<String, String>,

    #[serde(default)]
    pub peer_dependencies: BTreeMap<String, String>,

    /// `#alias` -> target or condition map
    #[serde(default)]
    pub imports: BTreeMap<String, Value>,

    /// Directory holding the file
    #[serde(skip)]
    pub dir: PathBuf,
}

impl PackageJson {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::read_path(path, e))?;
        let mut package: PackageJson = serde_json::from_str(&content)?;
        package.dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(package)
    }

    /// Version of `name` from the direct, peer or dev dependency maps.
    pub fn version_of(&self, name: &str) -> Option<PinnedVersion> {
        if let Some(version) = self
            .dependencies
            .get(name)
            .or_else(|| self.peer_dependencies.get(name))
        {
            return Some(PinnedVersion {
                version: version.clone(),
                dev: false,
            });
        }
        self.dev_dependencies.get(name).map(|version| PinnedVersion {
            version: version.clone(),
            dev: true,
        })
    }

    /// Resolve a `#` specifier through the `imports` map.
    ///
    /// Exact keys win over wildcard keys; among wildcards the longest prefix
    /// wins. Returns `None` when no key matches or the target is not a
    /// relative path (a target may also name a package, which is not local).
    pub fn resolve_import(&self, specifier: &str) -> Option<PathBuf> {
        if !specifier.starts_with('#') {
            return None;
        }

        let target = if let Some(value) = self.imports.get(specifier) {
            condition_target(value)?.to_string()
        } else {
            let (key, value) = self
                .imports
                .iter()
                .filter(|(key, _)| wildcard_capture(key, specifier).is_some())
                .max_by_key(|(key, _)| key.find('*').unwrap_or(0))?;
            let capture = wildcard_capture(key, specifier)?;
            condition_target(value)?.replacen('*', capture, 1)
        };

        if !target.starts_with("./") {
            return None;
        }
        Some(normalize(&self.dir.join(target)))
    }
}

/// The text matched by `*` when `specifier` fits `pattern`.
pub(crate) fn wildcard_capture<'a>(pattern: &str, specifier: &'a str) -> Option<&'a str> {
    let (prefix, suffix) = pattern.split_once('*')?;
    if specifier.len() < prefix.len() + suffix.len() {
        return None;
    }
    specifier
        .strip_prefix(prefix)?
        .strip_suffix(suffix)
}

/// Pick a target out of a condition map, preferring module conditions.
fn condition_target(value: &Value) -> Option<&str> {
    match value {
        Value::String(s) => Some(s),
        Value::Object(map) => ["import", "module", "default", "node", "require"]
            .iter()
            .find_map(|key| map.get(*key).and_then(condition_target))
            .or_else(|| map.values().find_map(condition_target)),
        Value::Array(items) => items.iter().find_map(condition_target),
        _ => None,
    }
}
