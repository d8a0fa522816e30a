//! Canonical registry addresses.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};
use crate::manifest::ItemRef;

/// Canonical address of a registry, independent of how it was typed.
///
/// Providers produce locators in shorthand form (`github/owner/repo`,
/// `github/owner/repo/tree/dev`, `@scope/name@1.0.0`, or a bare base URL
/// for plain HTTP), so two spellings of the same address compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locator(String);

impl Locator {
    pub fn new(canonical: impl Into<String>) -> Self {
        Self(canonical.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Locator {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Result of parsing a registry URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUrl {
    pub locator: Locator,
    /// Present when the URL was fully qualified with `/<category>/<item>`
    pub item: Option<ItemRef>,
}

/// Split a trailing `/<category>/<item>` off a fully qualified URL.
pub fn split_item_specifier(url: &str) -> Result<(&str, ItemRef)> {
    let trimmed = url.trim_end_matches('/');
    let (rest, name) = trimmed
        .rsplit_once('/')
        .ok_or_else(|| Error::parse(url, "expected '<registry>/<category>/<item>'"))?;
    let (registry, category) = rest
        .rsplit_once('/')
        .ok_or_else(|| Error::parse(url, "expected '<registry>/<category>/<item>'"))?;
    if registry.is_empty() || category.is_empty() || name.is_empty() {
        return Err(Error::parse(url, "expected '<registry>/<category>/<item>'"));
    }
    Ok((registry, ItemRef::new(category, name)))
}

/// Split a `/`-separated address, rejecting empty segments.
pub(crate) fn segments<'a>(url: &'a str, input: &str) -> Result<Vec<&'a str>> {
    let segments: Vec<&str> = url.trim_end_matches('/').split('/').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(Error::parse(input, "empty path segment"));
    }
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_item_specifier() {
        let (registry, item) = split_item_specifier("github/o/r/utils/math").unwrap();
        assert_eq!(registry, "github/o/r");
        assert_eq!(item, ItemRef::new("utils", "math"));

        let (registry, item) =
            split_item_specifier("https://example.com/reg/ui/button/").unwrap();
        assert_eq!(registry, "https://example.com/reg");
        assert_eq!(item, ItemRef::new("ui", "button"));

        assert!(split_item_specifier("math").is_err());
        assert!(split_item_specifier("/utils/math").is_err());
    }

    #[test]
    fn test_locator_serializes_as_string() {
        let locator = Locator::new("github/o/r");
        assert_eq!(serde_json::to_string(&locator).unwrap(), "\"github/o/r\"");
    }
}
