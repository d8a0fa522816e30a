//! Single-file components: Svelte, Vue and Astro.
//!
//! Imports live in `<script>` blocks, `<style>` blocks, `src` attributes on
//! those blocks and, for Astro, the leading `---` frontmatter fence.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use super::script::ScriptLanguage;
use super::style::{StyleDialect, StyleLanguage};
use super::{Language, has_extension, push_unique};
use crate::error::{Error, Result};

static HTML_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("html comment pattern"));

static SCRIPT_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b([^>]*)>(.*?)</script\s*>").expect("script block pattern")
});

static STYLE_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<style\b([^>]*)>(.*?)</style\s*>").expect("style block pattern")
});

static LANG_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\blang\s*=\s*['"]([\w-]+)['"]"#).expect("lang attribute pattern")
});

static SRC_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bsrc\s*=\s*['"]([^'"]+)['"]"#).expect("src attribute pattern")
});

static FRONTMATTER_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\A\s*---\r?\n").expect("frontmatter fence pattern"));

static FRONTMATTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\A\s*---\r?\n(.*?)\r?\n---").expect("frontmatter pattern")
});

#[derive(Debug, Default, Clone, Copy)]
pub struct ComponentLanguage;

impl Language for ComponentLanguage {
    fn name(&self) -> &'static str {
        "component"
    }

    fn matches(&self, path: &Path) -> bool {
        has_extension(path, &["svelte", "vue", "astro"])
    }

    fn extract_imports(&self, path: &Path, content: &str) -> Result<Vec<String>> {
        if let Some(open) = content.find("<!--")
            && !content[open..].contains("-->")
        {
            return Err(Error::Syntax {
                file: path.to_path_buf(),
                message: "unterminated HTML comment".to_string(),
            });
        }
        let markup = HTML_COMMENT.replace_all(content, "");

        let mut imports = Vec::new();

        if has_extension(path, &["astro"])
            && let Some(caps) = FRONTMATTER.captures(&markup)
        {
            for spec in ScriptLanguage.extract_from(path, &caps[1])? {
                push_unique(&mut imports, spec);
            }
        }

        for caps in SCRIPT_BLOCK.captures_iter(&markup) {
            if let Some(src) = SRC_ATTR.captures(&caps[1]) {
                push_unique(&mut imports, src[1].to_string());
            }
            for spec in ScriptLanguage.extract_from(path, &caps[2])? {
                push_unique(&mut imports, spec);
            }
        }

        for caps in STYLE_BLOCK.captures_iter(&markup) {
            let attrs = &caps[1];
            if let Some(src) = SRC_ATTR.captures(attrs) {
                push_unique(&mut imports, src[1].to_string());
            }
            let dialect = LANG_ATTR
                .captures(attrs)
                .and_then(|lang| StyleDialect::from_extension(&lang[1]))
                .unwrap_or(StyleDialect::Css);
            for spec in StyleLanguage.extract_dialect(path, &caps[2], dialect)? {
                push_unique(&mut imports, spec);
            }
        }

        Ok(imports)
    }

    fn comment(&self, _path: &Path, text: &str) -> Option<String> {
        Some(format!("<!-- {} -->", text))
    }

    /// Astro frontmatter must open the file, so the mark goes inside it.
    fn watermark(&self, path: &Path, content: &str, text: &str) -> String {
        if has_extension(path, &["astro"])
            && FRONTMATTER.is_match(content)
            && let Some(fence) = FRONTMATTER_OPEN.find(content)
        {
            let comment = format!("// {}", text);
            let body = &content[fence.end()..];
            if body.starts_with(&comment) {
                return content.to_string();
            }
            return format!("{}{}\n{}", &content[..fence.end()], comment, body);
        }

        match self.comment(path, text) {
            Some(comment) if !content.starts_with(&comment) => format!("{}\n{}", comment, content),
            _ => content.to_string(),
        }
    }
}
