//! Error types for ferry-core

use std::path::PathBuf;

/// Result type for ferry-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Why a provider fetch failed, as far as the response lets us tell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchFailure {
    /// 404: the file, repository or ref does not exist
    NotFound,
    /// 401/403: the token is missing, expired or lacks scope
    Unauthorized,
    /// Any other non-2xx status
    Status(u16),
    /// The request never produced a response
    Transport,
}

impl FetchFailure {
    pub fn from_status(status: u16) -> Self {
        match status {
            404 => Self::NotFound,
            401 | 403 => Self::Unauthorized,
            other => Self::Status(other),
        }
    }
}

/// Errors that can occur while building, resolving or rewriting items.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed registry URL, item specifier or manifest field.
    #[error("Failed to parse '{input}': {reason}")]
    Parse { input: String, reason: String },

    /// Network or HTTP failure talking to a provider.
    #[error("{message}")]
    ProviderFetch {
        provider: String,
        url: String,
        failure: FetchFailure,
        message: String,
    },

    #[error("Item '{item}' was not found in {registry}")]
    ItemNotFound { item: String, registry: String },

    #[error("Item '{item}' exists in more than one registry: {}", .candidates.join(", "))]
    AmbiguousRegistry {
        item: String,
        candidates: Vec<String>,
    },

    /// A relative or aliased import escapes every registry directory.
    #[error(
        "{}: import '{specifier}' resolves to {} which is outside every registry directory",
        .file.display(),
        .resolved.display()
    )]
    LocalDependencyUnresolved {
        file: PathBuf,
        specifier: String,
        resolved: PathBuf,
    },

    /// Source too malformed to extract imports from.
    #[error("{}: {message}", .file.display())]
    Syntax { file: PathBuf, message: String },

    #[error("Item '{item}' depends on '{dependency}' which is not part of the manifest")]
    MissingLocalDependency { item: String, dependency: String },

    #[error("Config file '{name}' imports '{specifier}' from inside the registry")]
    ConfigFileLocalImport { name: String, specifier: String },

    /// Every fatal per-file error collected during one build.
    #[error("Build failed with {} error(s):\n{}", .errors.len(), render_errors(.errors))]
    Build { errors: Vec<Error> },

    #[error("No install path configured for category '{category}'")]
    NoInstallPath { category: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Operation was cancelled")]
    Cancelled,

    #[error("Failed to read {}: {source}", .path.display())]
    ReadPath {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn parse(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            input: input.into(),
            reason: reason.into(),
        }
    }

    pub fn read_path(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadPath {
            path: path.into(),
            source,
        }
    }

    /// The fetch failure kind, if this is a provider error.
    pub fn fetch_failure(&self) -> Option<FetchFailure> {
        match self {
            Self::ProviderFetch { failure, .. } => Some(*failure),
            _ => None,
        }
    }
}

fn render_errors(errors: &[Error]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_failure_from_status() {
        assert_eq!(FetchFailure::from_status(404), FetchFailure::NotFound);
        assert_eq!(FetchFailure::from_status(401), FetchFailure::Unauthorized);
        assert_eq!(FetchFailure::from_status(403), FetchFailure::Unauthorized);
        assert_eq!(FetchFailure::from_status(500), FetchFailure::Status(500));
    }

    #[test]
    fn test_ambiguous_error_lists_candidates() {
        let err = Error::AmbiguousRegistry {
            item: "utils/math".to_string(),
            candidates: vec![
                "github/a/one".to_string(),
                "github/b/two".to_string(),
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("github/a/one"));
        assert!(msg.contains("github/b/two"));
    }

    #[test]
    fn test_build_error_renders_each_file() {
        let err = Error::Build {
            errors: vec![
                Error::Syntax {
                    file: PathBuf::from("src/a.ts"),
                    message: "unterminated string".to_string(),
                },
                Error::Syntax {
                    file: PathBuf::from("src/b.ts"),
                    message: "unterminated comment".to_string(),
                },
            ],
        };
        let msg = err.to_string();
        assert!(msg.starts_with("Build failed with 2 error(s)"));
        assert!(msg.contains("src/a.ts"));
        assert!(msg.contains("src/b.ts"));
    }
}
