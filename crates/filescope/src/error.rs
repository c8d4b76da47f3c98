//! Error types for file selection

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Selection error type
///
/// Everything except `Io` is a configuration error: it is raised while the
/// selector is being built and aborts the run before any traversal.
#[derive(Error, Debug)]
pub enum ScopeError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid value '{value}' for {name} (expected {expected})")]
    InvalidSetting {
        name: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("Invalid filter on line {line}: '{directive}' (expected include:<glob> or exclude:<glob>)")]
    FilterDirective { line: usize, directive: String },

    #[error("Pattern error: {pattern}: {message}")]
    Pattern { pattern: String, message: String },

    #[error("Path '{0}' is outside the source root")]
    PathOutsideRoot(String),

    #[error("Source root not found: {0}")]
    RootNotFound(PathBuf),

    #[error("Source root is not a directory: {0}")]
    RootNotDirectory(PathBuf),
}

impl ScopeError {
    /// True for errors caused by the supplied configuration rather than the filesystem.
    pub fn is_config(&self) -> bool {
        !matches!(self, ScopeError::Io(_))
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ScopeError>;

/// A recoverable anomaly: the entry was skipped and the run carried on.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Diagnostic {
    pub path: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}
