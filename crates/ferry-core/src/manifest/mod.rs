//! Registry manifest model
//!
//! A manifest is produced once per publish by the builder and is read-only
//! afterwards. Consumers look items up by `category/name`.

mod item_ref;
mod types;

pub use item_ref::ItemRef;
pub use types::{
    Category, ConfigFile, Ecosystem, FileRole, Item, ItemFile, Manifest, RemoteDependency,
};

use crate::error::Result;

/// Well-known file name of a published manifest, relative to the registry root.
pub const MANIFEST_FILE: &str = "ferry-manifest.json";

impl Manifest {
    /// Parse a manifest from JSON
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Serialize to pretty JSON with a trailing newline
    pub fn to_json_pretty(&self) -> Result<String> {
        let mut out = serde_json::to_string_pretty(self)?;
        out.push('\n');
        Ok(out)
    }

    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }

    pub fn find(&self, item: &ItemRef) -> Option<&Item> {
        self.category(&item.category)?
            .items
            .iter()
            .find(|i| i.name == item.name)
    }

    pub fn contains(&self, item: &ItemRef) -> bool {
        self.find(item).is_some()
    }

    /// All items in manifest order
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.categories.iter().flat_map(|c| c.items.iter())
    }

    /// Items shown in interactive selection
    pub fn listed_items(&self) -> impl Iterator<Item = &Item> {
        self.items().filter(|i| i.listed)
    }
}
