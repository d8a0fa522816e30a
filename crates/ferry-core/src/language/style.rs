//! Stylesheets: CSS, SCSS, Sass and Less.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use super::lexer::{Syntax, strip_comments};
use super::{Language, has_extension, push_unique};
use crate::error::{Error, Result};

static AT_RULE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)@(import|use|forward)\s+([^;\n]+)").expect("at-rule pattern")
});

static QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"['"]([^'"\n]+)['"]"#).expect("quoted pattern"));

static URL_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"url\(\s*['"]?([^'")\s]+)['"]?\s*\)"#).expect("url() pattern")
});

/// Which stylesheet flavour a block of text is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleDialect {
    Css,
    Scss,
    /// Indented syntax: quotes around `@import` targets are optional
    Sass,
    Less,
}

impl StyleDialect {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "css" | "pcss" | "postcss" => Some(Self::Css),
            "scss" => Some(Self::Scss),
            "sass" => Some(Self::Sass),
            "less" => Some(Self::Less),
            _ => None,
        }
    }

    fn syntax(self) -> Syntax {
        match self {
            Self::Css => Syntax::CSS,
            Self::Scss | Self::Sass | Self::Less => Syntax::SASS,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct StyleLanguage;

impl StyleLanguage {
    pub(crate) fn extract_dialect(
        &self,
        path: &Path,
        content: &str,
        dialect: StyleDialect,
    ) -> Result<Vec<String>> {
        let code = strip_comments(content, dialect.syntax()).map_err(|message| Error::Syntax {
            file: path.to_path_buf(),
            message,
        })?;

        let mut imports = Vec::new();
        for caps in AT_RULE.captures_iter(&code) {
            let rule = &caps[1];
            let body = caps[2].trim();

            if rule != "import" {
                // `@use 'x' with (...)`: only the first string is a module.
                if let Some(m) = QUOTED.captures(body).and_then(|c| c.get(1)) {
                    push_specifier(&mut imports, m.as_str());
                }
                continue;
            }

            let mut matched = false;
            for source in [&*URL_VALUE, &*QUOTED] {
                for m in source.captures_iter(body).filter_map(|c| c.get(1)) {
                    matched = true;
                    push_specifier(&mut imports, m.as_str());
                }
                if matched {
                    break;
                }
            }
            if !matched && dialect == StyleDialect::Sass {
                for target in body.split(',') {
                    push_specifier(&mut imports, target.trim());
                }
            }
        }
        Ok(imports)
    }
}

/// Remote and inline resources are not modules.
fn push_specifier(imports: &mut Vec<String>, spec: &str) {
    if spec.is_empty()
        || spec.starts_with("http://")
        || spec.starts_with("https://")
        || spec.starts_with("//")
        || spec.starts_with("data:")
    {
        return;
    }
    push_unique(imports, spec.to_string());
}

impl Language for StyleLanguage {
    fn name(&self) -> &'static str {
        "style"
    }

    fn matches(&self, path: &Path) -> bool {
        has_extension(path, &["css", "pcss", "postcss", "scss", "sass", "less"])
    }

    fn extract_imports(&self, path: &Path, content: &str) -> Result<Vec<String>> {
        let dialect = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(StyleDialect::from_extension)
            .unwrap_or(StyleDialect::Css);
        self.extract_dialect(path, content, dialect)
    }

    fn comment(&self, _path: &Path, text: &str) -> Option<String> {
        Some(format!("/* {} */", text))
    }
}
