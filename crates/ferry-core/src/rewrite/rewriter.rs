//! Placeholder replay: turn `{{category/item}}` templates back into real
//! import specifiers for the consumer's layout.

use std::collections::{HashMap, HashSet};
use std::ops::Range;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::paths::{InstallPaths, join};
use crate::error::{Error, Result};
use crate::fs::relative_specifier;
use crate::language::Languages;
use crate::manifest::{ItemFile, ItemRef, Manifest};
use crate::resolve::{FetchedItem, ResolvedItem};

/// A file ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewrittenFile {
    pub path: PathBuf,
    pub content: String,
}

/// Rewrites fetched files for installation.
///
/// Only whole literals equal to a recorded specifier are replaced, and
/// content already in its installed form is left alone, so rewriting
/// twice changes nothing.
#[derive(Debug)]
pub struct Rewriter<'a> {
    paths: &'a InstallPaths,
    languages: &'a Languages,
    watermark: bool,
}

impl<'a> Rewriter<'a> {
    pub fn new(paths: &'a InstallPaths, languages: &'a Languages) -> Self {
        Self {
            paths,
            languages,
            watermark: false,
        }
    }

    /// Prepend an "Installed by ferry" comment to each file.
    pub fn with_watermark(mut self, watermark: bool) -> Self {
        self.watermark = watermark;
        self
    }

    pub fn rewrite(&self, fetched: &FetchedItem) -> Result<Vec<RewrittenFile>> {
        fetched
            .files
            .iter()
            .map(|f| self.rewrite_file(&fetched.resolved, &f.file, &f.content))
            .collect()
    }

    pub fn rewrite_file(
        &self,
        resolved: &ResolvedItem,
        file: &ItemFile,
        content: &str,
    ) -> Result<RewrittenFile> {
        let manifest = resolved.registry.manifest.as_ref();
        let path = self.paths.file_path(&resolved.item, file, manifest)?;
        let from_dir = path.parent().unwrap_or(Path::new(""));

        let mut replacements = HashMap::new();
        for (literal, template) in &resolved.item.imports {
            let specifier = self.resolve_template(template, from_dir, manifest)?;
            if specifier != *literal {
                replacements.insert(literal.as_str(), specifier);
            }
        }
        let mut content = replace_literals(content, &replacements);

        if let Some(language) = self.languages.for_path(&path) {
            if self.watermark {
                let text = format!("Installed by ferry from {}", resolved.registry.url);
                content = language.watermark(&path, &content, &text);
            }
            content = language.format(&content);
        }

        debug!("Rewrote {} ({} specifier(s))", path.display(), replacements.len());
        Ok(RewrittenFile { path, content })
    }

    /// Specifier for `template` as seen from a file in `from_dir`.
    ///
    /// Alias-style category paths produce an alias specifier; anything else
    /// a relative one.
    fn resolve_template(&self, template: &str, from_dir: &Path, manifest: &Manifest) -> Result<String> {
        let Some(rest) = template.strip_prefix("{{") else {
            return Ok(template.to_string());
        };
        let (id, suffix) = rest
            .split_once("}}")
            .ok_or_else(|| Error::parse(template, "unterminated placeholder"))?;
        let dependency: ItemRef = id.parse()?;

        let base = self.paths.category_dir(&dependency.category, manifest)?;
        let target = join(&base, &format!("{}{}", dependency.name, suffix));
        if InstallPaths::is_alias(&base) {
            return Ok(target);
        }
        Ok(relative_specifier(from_dir, &self.paths.to_fs(&target)?))
    }
}

/// Replace specifier literals whose whole body is a key of `replacements`.
///
/// Content that already carries the installed specifiers is returned as is,
/// so a second pass with the same table changes nothing.
fn replace_literals(content: &str, replacements: &HashMap<&str, String>) -> String {
    if replacements.is_empty() {
        return content.to_string();
    }
    let spans = literal_spans(content);
    if already_rewritten(content, &spans, replacements) {
        return content.to_string();
    }

    let mut out = String::with_capacity(content.len());
    let mut last = 0;
    for span in spans {
        if let Some(replacement) = replacements.get(&content[span.clone()]) {
            out.push_str(&content[last..span.start]);
            out.push_str(replacement);
            last = span.end;
        }
    }
    out.push_str(&content[last..]);
    out
}

/// True when the literals include an installed specifier and none of the
/// published ones that only exist before rewriting.
///
/// A literal that is both a published and an installed specifier (one
/// item moved onto another's old place) says nothing either way.
fn already_rewritten(
    content: &str,
    spans: &[Range<usize>],
    replacements: &HashMap<&str, String>,
) -> bool {
    let installed: HashSet<&str> = replacements.values().map(String::as_str).collect();
    let mut seen_installed = false;
    for span in spans {
        let literal = &content[span.clone()];
        match (replacements.contains_key(literal), installed.contains(literal)) {
            (true, false) => return false,
            (false, true) => seen_installed = true,
            _ => {}
        }
    }
    seen_installed
}

/// Byte ranges of every literal that may hold a specifier: quoted strings,
/// unquoted `url(...)` values and unquoted `@import` targets.
///
/// Single- and double-quoted literals end at the line; template literals
/// may span lines. An unterminated quote is skipped.
fn literal_spans(content: &str) -> Vec<Range<usize>> {
    let bytes = content.as_bytes();
    let mut spans = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let rest = &content[i..];
        match bytes[i] {
            quote @ (b'"' | b'\'' | b'`') => match closing_quote(&rest[1..], quote) {
                Some(end) => {
                    spans.push(i + 1..i + 1 + end);
                    i += end + 2;
                }
                None => i += 1,
            },
            b'u' if rest.starts_with("url(") && !follows_identifier(bytes, i) => {
                let open = i + "url(".len();
                let start = open + leading_space(&content[open..]);
                if matches!(bytes.get(start), Some(b'"' | b'\'')) {
                    i = start;
                    continue;
                }
                match content[start..].find([')', '\n']) {
                    Some(close) if bytes[start + close] == b')' => {
                        let body = content[start..start + close].trim_end();
                        if !body.is_empty() {
                            spans.push(start..start + body.len());
                        }
                        i = start + close + 1;
                    }
                    _ => i = open,
                }
            }
            b'@' if rest.starts_with("@import") => {
                let open = i + "@import".len();
                let start = open + leading_space(&content[open..]);
                if start == open
                    || matches!(bytes.get(start), None | Some(b'"' | b'\''))
                    || content[start..].starts_with("url(")
                {
                    i = start;
                    continue;
                }
                let end = content[start..]
                    .find(['\n', ';'])
                    .map_or(content.len(), |e| start + e);
                let mut offset = start;
                for target in content[start..end].split(',') {
                    let lead = leading_space(target);
                    let body = target[lead..].trim_end();
                    if !body.is_empty() {
                        spans.push(offset + lead..offset + lead + body.len());
                    }
                    offset += target.len() + 1;
                }
                i = end;
            }
            _ => i += rest.chars().next().map_or(1, char::len_utf8),
        }
    }
    spans
}

fn closing_quote(body: &str, quote: u8) -> Option<usize> {
    let bytes = body.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'\n' if quote != b'`' => return None,
            b if b == quote => return Some(i),
            _ => i += 1,
        }
    }
    None
}

fn leading_space(text: &str) -> usize {
    text.len() - text.trim_start_matches([' ', '\t']).len()
}

fn follows_identifier(bytes: &[u8], at: usize) -> bool {
    at > 0 && (bytes[at - 1].is_ascii_alphanumeric() || matches!(bytes[at - 1], b'_' | b'-' | b'$'))
}
