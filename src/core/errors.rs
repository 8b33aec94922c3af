//! Infrastructure error type.
//!
//! Validation findings about analysed code are never errors: they travel as
//! `Diagnostic` values next to the outputs. `RouteGenError` covers the things
//! that stop a run from happening at all.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RouteGenError {
    /// File system related errors
    #[error("File system error: {message}")]
    FileSystem {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    /// A source file could not be parsed
    #[error("Parse error in {file}:{line}:{column}: {message}")]
    Parse {
        file: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The run was cancelled at a checkpoint
    #[error("Run cancelled")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Pattern(#[from] glob::PatternError),

    #[error(transparent)]
    Walk(#[from] ignore::Error),
}

impl RouteGenError {
    /// Create a file system error with path context
    pub fn file_system(message: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::FileSystem {
            message: message.into(),
            path: Some(path.into()),
            source: None,
        }
    }

    /// Create a parse error with location
    pub fn parse(
        file: impl Into<PathBuf>,
        line: usize,
        column: usize,
        message: impl Into<String>,
    ) -> Self {
        Self::Parse {
            file: file.into(),
            line,
            column,
            message: message.into(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, RouteGenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = RouteGenError::parse("src/api.rs", 3, 7, "expected `fn`");
        assert_eq!(err.to_string(), "Parse error in src/api.rs:3:7: expected `fn`");
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: RouteGenError = io.into();
        assert!(matches!(err, RouteGenError::Io(_)));
        assert!(!err.is_cancelled());
    }
}
