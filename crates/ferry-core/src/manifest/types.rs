//! Manifest schema
//!
//! The published description of a registry: categories, items, files and
//! dependencies. Every optional field defaults so manifests written by older
//! builders keep parsing; unknown fields are ignored.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::ItemRef;

/// Root of `ferry-manifest.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,

    /// Free-form registry metadata
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: BTreeMap<String, String>,

    /// Category -> suggested install path
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub default_paths: BTreeMap<String, String>,

    /// Standalone config files shipped with the registry
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub config_files: Vec<ConfigFile>,

    #[serde(default)]
    pub categories: Vec<Category>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    #[serde(default)]
    pub items: Vec<Item>,
}

/// A named, categorized, independently distributable unit of source files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub name: String,

    pub category: String,

    /// Directory holding the item's files, relative to the registry root
    #[serde(default)]
    pub directory: String,

    #[serde(default)]
    pub files: Vec<ItemFile>,

    /// Shown in interactive selection
    #[serde(default = "default_listed")]
    pub listed: bool,

    /// Files live in their own directory named after the item
    #[serde(default)]
    pub subdirectory: bool,

    #[serde(default)]
    pub local_dependencies: Vec<ItemRef>,

    #[serde(default)]
    pub dependencies: Vec<RemoteDependency>,

    #[serde(default)]
    pub dev_dependencies: Vec<RemoteDependency>,

    /// Literal import specifier -> placeholder template
    #[serde(default)]
    pub imports: BTreeMap<String, String>,
}

fn default_listed() -> bool {
    true
}

impl Item {
    pub fn id(&self) -> ItemRef {
        ItemRef::new(&self.category, &self.name)
    }

    /// Files whose role is primary or one of `roles`.
    pub fn files_for_roles<'a>(
        &'a self,
        roles: &'a [FileRole],
    ) -> impl Iterator<Item = &'a ItemFile> + 'a {
        self.files
            .iter()
            .filter(move |f| f.role == FileRole::Primary || roles.contains(&f.role))
    }

    /// Path of `file` relative to the registry root, the path a provider fetches.
    pub fn remote_path(&self, file: &ItemFile) -> String {
        let dir = self.directory.trim_matches('/');
        if dir.is_empty() {
            file.path.clone()
        } else {
            format!("{}/{}", dir, file.path)
        }
    }
}

/// One file of an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ItemFileRepr")]
pub struct ItemFile {
    /// Path relative to the item directory
    pub path: String,

    #[serde(default)]
    pub role: FileRole,

    /// Fixed install path that must not be relocated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl ItemFile {
    pub fn new(path: impl Into<String>, role: FileRole) -> Self {
        Self {
            path: path.into(),
            role,
            target: None,
        }
    }
}

/// Older manifests list files as bare strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum ItemFileRepr {
    Path(String),
    Full {
        path: String,
        #[serde(default)]
        role: FileRole,
        #[serde(default)]
        target: Option<String>,
    },
}

impl From<ItemFileRepr> for ItemFile {
    fn from(repr: ItemFileRepr) -> Self {
        match repr {
            ItemFileRepr::Path(path) => ItemFile::new(path, FileRole::Primary),
            ItemFileRepr::Full { path, role, target } => ItemFile { path, role, target },
        }
    }
}

/// Purpose of a file within an item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FileRole {
    #[default]
    Primary,
    Test,
    Doc,
    Example,
    Other(String),
}

impl FileRole {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Primary => "primary",
            Self::Test => "test",
            Self::Doc => "doc",
            Self::Example => "example",
            Self::Other(role) => role,
        }
    }
}

impl From<String> for FileRole {
    fn from(value: String) -> Self {
        match value.as_str() {
            "primary" => Self::Primary,
            "test" => Self::Test,
            "doc" | "docs" => Self::Doc,
            "example" => Self::Example,
            _ => Self::Other(value),
        }
    }
}

impl From<FileRole> for String {
    fn from(value: FileRole) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for FileRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Package ecosystem an external dependency belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ecosystem {
    #[default]
    Js,
}

/// An external package reference, optionally pinned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "RemoteDependencyRepr")]
pub struct RemoteDependency {
    #[serde(default)]
    pub ecosystem: Ecosystem,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl RemoteDependency {
    pub fn new(name: impl Into<String>, version: Option<String>) -> Self {
        Self {
            ecosystem: Ecosystem::Js,
            name: name.into(),
            version,
        }
    }

    /// Parse the older `name@version` string shape.
    pub fn from_spec(spec: &str) -> Self {
        // A leading '@' is the scope marker, not a version separator.
        let (scope, rest) = match spec.strip_prefix('@') {
            Some(rest) => ("@", rest),
            None => ("", spec),
        };
        match rest.rsplit_once('@') {
            Some((name, version)) if !version.is_empty() => {
                Self::new(format!("{scope}{name}"), Some(version.to_string()))
            }
            _ => Self::new(spec.trim_end_matches('@'), None),
        }
    }
}

impl fmt::Display for RemoteDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}@{}", self.name, version),
            None => f.write_str(&self.name),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RemoteDependencyRepr {
    Spec(String),
    Full {
        #[serde(default)]
        ecosystem: Ecosystem,
        name: String,
        #[serde(default)]
        version: Option<String>,
    },
}

impl From<RemoteDependencyRepr> for RemoteDependency {
    fn from(repr: RemoteDependencyRepr) -> Self {
        match repr {
            RemoteDependencyRepr::Spec(spec) => RemoteDependency::from_spec(&spec),
            RemoteDependencyRepr::Full {
                ecosystem,
                name,
                version,
            } => RemoteDependency {
                ecosystem,
                name,
                version,
            },
        }
    }
}

/// A standalone config file shipped alongside the items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFile {
    pub name: String,
    /// Path relative to the registry root
    pub path: String,
    /// Where the consumer is expected to keep it
    pub expected_path: String,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub dependencies: Vec<RemoteDependency>,
    #[serde(default)]
    pub dev_dependencies: Vec<RemoteDependency>,
}

impl fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Js => f.write_str("js"),
        }
    }
}
