//! Error types for scopecss
//!
//! All modules use `ScopeResult<T>` as their return type.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for scopecss operations
pub type ScopeResult<T> = Result<T, ScopeError>;

/// All errors that can occur in scopecss
#[derive(Error, Debug)]
pub enum ScopeError {
    // Configuration errors
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Stylesheet errors
    #[error("Stylesheet not found: {0}")]
    StylesheetNotFound(PathBuf),

    #[error("Syntax error in {path} at {location}: {message}")]
    StylesheetSyntax {
        path: PathBuf,
        location: String,
        message: String,
    },

    // Composition errors
    #[error("Cyclic composition: {}", display_chain(.chain))]
    CyclicComposition { chain: Vec<PathBuf> },

    #[error("Composition target '{specifier}' not found (requested by {})", display_chain(.chain))]
    MissingCompositionTarget {
        requester: PathBuf,
        specifier: String,
        chain: Vec<PathBuf>,
    },

    #[error("Unknown composed token '{token}' in {target} (requested by {})", display_chain(.chain))]
    UnknownComposedToken {
        token: String,
        target: PathBuf,
        chain: Vec<PathBuf>,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Task failed: {0}")]
    Task(String),

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

fn display_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

impl ScopeError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Configuration(reason.into())
    }

    /// Create a syntax error for a stylesheet position
    pub fn syntax(path: &Path, line: usize, column: usize, message: impl Into<String>) -> Self {
        Self::StylesheetSyntax {
            path: path.to_path_buf(),
            location: format!("{}:{}", line, column),
            message: message.into(),
        }
    }

    /// Failures reflect bad configuration or bad input, never transient state
    pub fn is_retryable(&self) -> bool {
        false
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Configuration(_) | Self::ConfigInvalid { .. } => {
                Some("Run: scopecss config show")
            }
            Self::CyclicComposition { .. } => {
                Some("Break the cycle by moving shared classes into their own stylesheet")
            }
            Self::MissingCompositionTarget { .. } => {
                Some("Composition paths are resolved relative to the composing stylesheet")
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ScopeError::config("unknown hash algorithm 'md2'");
        assert!(err.to_string().contains("unknown hash algorithm"));
    }

    #[test]
    fn cycle_display_joins_chain() {
        let err = ScopeError::CyclicComposition {
            chain: vec![
                PathBuf::from("/a.css"),
                PathBuf::from("/b.css"),
                PathBuf::from("/a.css"),
            ],
        };
        assert_eq!(
            err.to_string(),
            "Cyclic composition: /a.css -> /b.css -> /a.css"
        );
    }

    #[test]
    fn syntax_location() {
        let err = ScopeError::syntax(Path::new("/x.css"), 3, 7, "unclosed block");
        assert!(err.to_string().contains("/x.css at 3:7"));
    }

    #[test]
    fn error_hint() {
        let err = ScopeError::CyclicComposition { chain: vec![] };
        assert!(err.hint().is_some());
        assert_eq!(ScopeError::Task("x".into()).hint(), None);
    }

    #[test]
    fn nothing_is_retryable() {
        assert!(!ScopeError::config("x").is_retryable());
        assert!(!ScopeError::CyclicComposition { chain: vec![] }.is_retryable());
    }
}
