//! Item identity: `category/name`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Identity of an item within one registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ItemRef {
    pub category: String,
    pub name: String,
}

impl ItemRef {
    pub fn new(category: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.category, self.name)
    }
}

impl FromStr for ItemRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (category, name) = s
            .split_once('/')
            .ok_or_else(|| Error::parse(s, "expected <category>/<item>"))?;
        if category.is_empty() || name.is_empty() || name.contains('/') {
            return Err(Error::parse(s, "expected <category>/<item>"));
        }
        Ok(Self::new(category, name))
    }
}

impl TryFrom<String> for ItemRef {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ItemRef> for String {
    fn from(value: ItemRef) -> Self {
        value.to_string()
    }
}
