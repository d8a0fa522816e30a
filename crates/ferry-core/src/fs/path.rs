//! Lexical path helpers.
//!
//! Registry paths are compared and rewritten without touching the
//! filesystem, so `..` is resolved textually and output always uses `/`.

use std::path::{Component, Path, PathBuf};

/// Extensions that may be dropped from an import specifier.
pub const SOURCE_EXTENSIONS: &[&str] = &[
    "ts", "tsx", "mts", "cts", "js", "jsx", "mjs", "cjs", "svelte", "vue", "astro", "css", "scss",
    "sass", "less",
];

/// Resolve `.` and `..` components without consulting the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// `path` as a `/`-separated string.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::RootDir => Some(String::new()),
            Component::CurDir => None,
            other => Some(other.as_os_str().to_string_lossy().into_owned()),
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Relative path from directory `from` to `to`, both normalized first.
///
/// The result always starts with `./` or `../` so it reads as a relative
/// import specifier.
pub fn relative_specifier(from: &Path, to: &Path) -> String {
    let from = normalize(from);
    let to = normalize(to);
    let from_parts: Vec<_> = from.components().collect();
    let to_parts: Vec<_> = to.components().collect();

    let common = from_parts
        .iter()
        .zip(to_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut rel = PathBuf::new();
    for _ in common..from_parts.len() {
        rel.push("..");
    }
    for part in &to_parts[common..] {
        rel.push(part.as_os_str());
    }

    let rel = to_slash(&rel);
    if rel.starts_with("..") {
        rel
    } else if rel.is_empty() {
        ".".to_string()
    } else {
        format!("./{}", rel)
    }
}

/// Split a trailing source extension off a file name: `math.ts` -> (`math`, `.ts`).
pub fn split_source_extension(name: &str) -> (&str, &str) {
    if let Some((stem, ext)) = name.rsplit_once('.')
        && !stem.is_empty()
        && SOURCE_EXTENSIONS.contains(&ext)
    {
        return (stem, &name[stem.len()..]);
    }
    (name, "")
}

/// Whether a specifier is written as a filesystem path.
pub fn is_path_specifier(spec: &str) -> bool {
    spec == "."
        || spec == ".."
        || spec.starts_with("./")
        || spec.starts_with("../")
        || spec.starts_with('/')
}
