//! Splitting and validating bare package specifiers.

use std::sync::LazyLock;

use regex::Regex;

static NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:@[a-z0-9\-*~][a-z0-9\-*._~]*/)?[a-z0-9\-~][a-z0-9\-._~]*$")
        .expect("package name pattern")
});

const MAX_NAME_LENGTH: usize = 214;

/// Split `@scope/pkg/sub/path` into (`@scope/pkg`, `Some("sub/path")`).
pub fn split(specifier: &str) -> (&str, Option<&str>) {
    let name_segments = if specifier.starts_with('@') { 2 } else { 1 };
    let mut end = specifier.len();
    let mut seen = 0;
    for (idx, c) in specifier.char_indices() {
        if c == '/' {
            seen += 1;
            if seen == name_segments {
                end = idx;
                break;
            }
        }
    }
    let name = &specifier[..end];
    let subpath = specifier[end..].strip_prefix('/').filter(|s| !s.is_empty());
    (name, subpath)
}

/// Check a package name against registry naming rules.
pub fn validate(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("name is empty".to_string());
    }
    if name.len() > MAX_NAME_LENGTH {
        return Err(format!("name is longer than {} characters", MAX_NAME_LENGTH));
    }
    if name.starts_with('.') || name.starts_with('_') {
        return Err("name cannot start with '.' or '_'".to_string());
    }
    if name.trim() != name {
        return Err("name cannot contain leading or trailing spaces".to_string());
    }
    if name.chars().any(|c| c.is_ascii_uppercase()) {
        return Err("name cannot contain capital letters".to_string());
    }
    if name.starts_with('@') && !name.contains('/') {
        return Err("scoped name is missing a package part".to_string());
    }
    if !NAME.is_match(name) {
        return Err("name contains characters that are not URL-safe".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("react", "react", None)]
    #[case("react-dom/client", "react-dom", Some("client"))]
    #[case("@scope/pkg", "@scope/pkg", None)]
    #[case("@scope/pkg/deep/path.js", "@scope/pkg", Some("deep/path.js"))]
    #[case("lodash/", "lodash", None)]
    fn test_split(#[case] spec: &str, #[case] name: &str, #[case] subpath: Option<&str>) {
        assert_eq!(split(spec), (name, subpath));
    }

    #[rstest]
    #[case("react")]
    #[case("@sveltejs/kit")]
    #[case("lodash.merge")]
    #[case("a~b")]
    fn test_valid_names(#[case] name: &str) {
        assert!(validate(name).is_ok(), "{name} should be valid");
    }

    #[rstest]
    #[case("")]
    #[case("React")]
    #[case("_private")]
    #[case(".hidden")]
    #[case("@scope")]
    #[case("@/lib/utils")]
    #[case("has space")]
    fn test_invalid_names(#[case] name: &str) {
        let (name, _) = split(name);
        assert!(validate(name).is_err(), "{name} should be invalid");
    }
}
