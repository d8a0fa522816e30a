//! JavaScript / TypeScript (including JSX and TSX).

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use super::lexer::{Syntax, strip_comments};
use super::{Language, has_extension, push_unique};
use crate::error::{Error, Result};

/// `import x from 'y'`, `import type { x } from 'y'`, `import 'y'`
static STATIC_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)(?:^|[^\w$.])import\s+(?:[^'";]*?\s+from\s*)?['"]([^'"\n]+)['"]"#)
        .expect("static import pattern")
});

/// `export * from 'y'`, `export { x } from 'y'`
static RE_EXPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)(?:^|[^\w$.])export\s+(?:type\s+)?(?:\*(?:\s+as\s+[\w$]+)?|\{[^}]*\})\s*from\s*['"]([^'"\n]+)['"]"#)
        .expect("re-export pattern")
});

/// `import('y')` and `require('y')`
static CALL_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:^|[^\w$.])(?:import|require)\s*\(\s*['"]([^'"\n]+)['"]\s*\)"#)
        .expect("call import pattern")
});

const EXTENSIONS: &[&str] = &["js", "jsx", "mjs", "cjs", "ts", "tsx", "mts", "cts"];

/// Script dialects: `.js`, `.jsx`, `.mjs`, `.cjs`, `.ts`, `.tsx`, `.mts`, `.cts`
#[derive(Debug, Default, Clone, Copy)]
pub struct ScriptLanguage;

impl ScriptLanguage {
    /// Extract specifiers from script text already known to be script.
    pub(crate) fn extract_from(&self, path: &Path, content: &str) -> Result<Vec<String>> {
        let code = strip_comments(content, Syntax::SCRIPT).map_err(|message| Error::Syntax {
            file: path.to_path_buf(),
            message,
        })?;

        let mut found: Vec<(usize, String)> = Vec::new();
        for pattern in [&*STATIC_IMPORT, &*RE_EXPORT, &*CALL_IMPORT] {
            for caps in pattern.captures_iter(&code) {
                if let Some(m) = caps.get(1) {
                    found.push((m.start(), m.as_str().to_string()));
                }
            }
        }
        // Report in source order regardless of which pattern matched.
        found.sort_by_key(|(pos, _)| *pos);

        let mut imports = Vec::new();
        for (_, spec) in found {
            push_unique(&mut imports, spec);
        }
        Ok(imports)
    }
}

impl Language for ScriptLanguage {
    fn name(&self) -> &'static str {
        "script"
    }

    fn matches(&self, path: &Path) -> bool {
        has_extension(path, EXTENSIONS)
    }

    fn extract_imports(&self, path: &Path, content: &str) -> Result<Vec<String>> {
        self.extract_from(path, content)
    }

    fn comment(&self, _path: &Path, text: &str) -> Option<String> {
        Some(
            text.lines()
                .map(|line| format!("// {}", line))
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn extract(src: &str) -> Vec<String> {
        ScriptLanguage
            .extract_imports(Path::new("file.ts"), src)
            .unwrap()
    }

    #[test]
    fn test_extracts_every_import_form() {
        let src = r#"
import React from "react";
import type { Result } from '../types/result.ts';
import {
    a,
    b,
} from "./multi";
import "./side-effect.css";
export * from './reexport';
export { x as y } from "./named";
const lazy = await import('./lazy');
const fs = require("node:fs");
"#;
        assert_eq!(
            extract(src),
            vec![
                "react",
                "../types/result.ts",
                "./multi",
                "./side-effect.css",
                "./reexport",
                "./named",
                "./lazy",
                "node:fs",
            ]
        );
    }

    #[test]
    fn test_ignores_commented_imports() {
        let src = "// import a from 'a';\n/* import b from 'b'; */\nimport c from 'c';\n";
        assert_eq!(extract(src), vec!["c"]);
    }

    #[test]
    fn test_deduplicates_specifiers() {
        let src = "import a from './a';\nimport { b } from './a';\n";
        assert_eq!(extract(src), vec!["./a"]);
    }

    #[test]
    fn test_ignores_member_named_import() {
        let src = "const u = import.meta.url;\nobj.require('nope');\n";
        assert!(extract(src).is_empty());
    }

    #[test]
    fn test_malformed_source_reports_file() {
        let err = ScriptLanguage
            .extract_imports(Path::new("src/broken.ts"), "/* open")
            .unwrap_err();
        assert!(err.to_string().contains("src/broken.ts"));
    }

    #[test]
    fn test_matches_extensions() {
        assert!(ScriptLanguage.matches(Path::new("a.tsx")));
        assert!(ScriptLanguage.matches(Path::new("a.mjs")));
        assert!(!ScriptLanguage.matches(Path::new("a.svelte")));
    }
}
