//! TOML parser with helpful error messages

use std::path::Path;

use super::schema::FerryConfig;
use crate::error::{Error, Result};

/// Parse ferry.toml with detailed error messages
pub fn parse_ferry_toml(path: &Path) -> Result<FerryConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::read_path(path, e))?;

    parse_ferry_toml_str(&content).map_err(|e| match e {
        Error::Config(message) => {
            Error::Config(format!("{}: {}", path.display(), message))
        }
        other => other,
    })
}

/// Parse ferry.toml content from string
pub fn parse_ferry_toml_str(content: &str) -> Result<FerryConfig> {
    let config: FerryConfig =
        toml::from_str(content).map_err(|e| enhance_toml_error(e, content))?;

    config.validate()?;

    Ok(config)
}

/// Enhance TOML parsing errors with the surrounding lines
fn enhance_toml_error(error: toml::de::Error, content: &str) -> Error {
    let message = error.message().to_string();

    let line_num = error
        .span()
        .map(|span| content[..span.start.min(content.len())].matches('\n').count() + 1);

    match line_num {
        Some(line_num) => Error::Config(format!(
            "TOML parsing error at line {}:\n{}\n\nError: {}",
            line_num,
            get_line_context(content, line_num),
            message
        )),
        None => Error::Config(format!("TOML parsing error: {}", message)),
    }
}

/// Get context lines around an error
fn get_line_context(content: &str, line_num: usize) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let start = line_num.saturating_sub(2);
    let end = (line_num + 2).min(lines.len());
    if start >= end {
        return String::new();
    }

    lines[start..end]
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let num = start + i + 1;
            let marker = if num == line_num { ">>>" } else { "   " };
            format!("{} {:4} | {}", marker, num, line)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Serialize a configuration to TOML string
pub fn to_toml(config: &FerryConfig) -> Result<String> {
    toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Failed to serialize configuration to TOML: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_consumer_config() {
        let toml = r#"
registries = ["github/acme/std", "@acme/ui"]
include_tests = true
watermark = true

[paths]
utils = "./src/lib/utils"
"*" = "$lib"
"#;

        let config = parse_ferry_toml_str(toml).unwrap();
        assert_eq!(config.registries, vec!["github/acme/std", "@acme/ui"]);
        assert_eq!(config.paths["*"], "$lib");
        assert!(config.include_tests);
        assert!(config.watermark);
        assert!(config.build.is_none());
    }

    #[test]
    fn test_parse_empty_config() {
        let config = parse_ferry_toml_str("").unwrap();
        assert!(config.registries.is_empty());
        assert!(config.paths.is_empty());
    }

    #[test]
    fn test_parse_build_table() {
        let toml = r#"
[build]
dirs = ["src"]
version = "1.2.0"
exclude_deps = ["react"]
include_files = ["**/*.png"]

[build.default_paths]
utils = "./src/utils"

[[build.config_files]]
name = "tailwind"
path = "tailwind.config.ts"
expected_path = "./tailwind.config.ts"
optional = true
"#;

        let config = parse_ferry_toml_str(toml).unwrap();
        let build = config.build.unwrap();
        assert_eq!(build.dirs, vec![std::path::PathBuf::from("src")]);
        assert!(build.prune_unused);
        assert_eq!(build.exclude_deps, vec!["react"]);
        assert_eq!(build.default_paths["utils"], "./src/utils");
        assert!(build.config_files[0].optional);
    }

    #[test]
    fn test_parse_invalid_toml_shows_line() {
        let toml = "registries = [\"github/a/b\"]\n[paths\nutils = \"./x\"\n";

        let err = parse_ferry_toml_str(toml).unwrap_err().to_string();
        assert!(err.contains("line 2"), "{}", err);
        assert!(err.contains(">>>"));
    }

    #[test]
    fn test_invalid_build_version() {
        let toml = "[build]\ndirs = [\"src\"]\nversion = \"one\"\n";
        let err = parse_ferry_toml_str(toml).unwrap_err().to_string();
        assert!(err.contains("not valid semver"));
    }

    #[test]
    fn test_parse_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "registries = [\"https://example.com/r\"]").unwrap();
        let config = parse_ferry_toml(file.path()).unwrap();
        assert_eq!(config.registries, vec!["https://example.com/r"]);
    }

    #[test]
    fn test_round_trip() {
        let toml = "registries = [\"github/a/b\"]\n\n[paths]\nutils = \"./lib\"\n";
        let config = parse_ferry_toml_str(toml).unwrap();
        let again = parse_ferry_toml_str(&to_toml(&config).unwrap()).unwrap();
        assert_eq!(config, again);
    }
}
