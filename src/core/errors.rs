//! Shared error types for the extractor

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for context extraction.
///
/// Only failures that make a run meaningless surface here. Per-identifier
/// language service failures are logged and skipped by the extraction
/// algorithms instead of being returned.
#[derive(Debug, Error)]
pub enum Error {
    /// File system related errors
    #[error("File system error: {message}")]
    FileSystem {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    /// The sketch does not contain a recognizable hole
    #[error("No hole found in {path}: {message}")]
    HoleNotFound { path: PathBuf, message: String },

    /// A language service request was answered with an error
    #[error("Language service error in {method}: {message}")]
    LanguageService { method: String, message: String },

    /// Malformed or unexpected traffic on the language service channel
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Generic errors with context
    #[error("{context}: {message}")]
    WithContext { context: String, message: String },

    /// IO errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Pattern errors
    #[error(transparent)]
    Pattern(#[from] glob::PatternError),
}

impl Error {
    /// Create a file system error with path context
    pub fn file_system(message: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::FileSystem {
            message: message.into(),
            path: Some(path.into()),
            source: None,
        }
    }

    /// Create a file system error that keeps the underlying io error
    pub fn read_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        Self::FileSystem {
            message: format!("failed to read {}", path.display()),
            path: Some(path),
            source: Some(source),
        }
    }

    pub fn hole_not_found(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::HoleNotFound {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn language_service(method: impl Into<String>, message: impl Into<String>) -> Self {
        Self::LanguageService {
            method: method.into(),
            message: message.into(),
        }
    }

    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            message: self.to_string(),
        }
    }
}

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_context_prefixes_message() {
        let err = Error::Protocol("unexpected end of stream".to_string())
            .with_context("reading hover response");
        assert_eq!(
            err.to_string(),
            "reading hover response: Protocol error: unexpected end of stream"
        );
    }

    #[test]
    fn test_result_ext_context() {
        let result: Result<()> = Err(Error::Configuration("missing server".into()));
        let err = result.context("loading config").unwrap_err();
        assert!(matches!(err, Error::WithContext { .. }));
    }

    #[test]
    fn test_read_failed_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = Error::read_failed("/tmp/prelude.ts", io);
        match err {
            Error::FileSystem { path, source, .. } => {
                assert_eq!(path, Some(PathBuf::from("/tmp/prelude.ts")));
                assert!(source.is_some());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
