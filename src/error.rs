//! Error handling module for adb-cleaner
//!
//! Provides the error taxonomy shared by the catalog, configuration and
//! device bridge layers. The binary wraps these with `anyhow` context at
//! startup; inside the batch they are downgraded to counters.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Main error type for adb-cleaner
#[derive(Error, Debug)]
pub enum CleanerError {
    /// File read/write/create failures (manifest, config, backup, directories)
    #[error("IO error: failed to {action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed configuration JSON
    #[error("Parse error: {0}")]
    Parse(String),

    /// adb unavailable, no authorized device, subprocess could not run
    #[error("Device error: {0}")]
    Device(String),

    /// A single uninstall call failed
    #[error("Operation failed: {0}")]
    Operation(String),

    /// Terminal setup or drawing failed
    #[error("Terminal error: {0}")]
    Terminal(String),
}

/// Result type alias for adb-cleaner operations
pub type Result<T> = std::result::Result<T, CleanerError>;

impl CleanerError {
    /// Create an IO error carrying the file it concerns
    pub fn io(action: &'static str, path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a device error
    pub fn device(msg: impl Into<String>) -> Self {
        Self::Device(msg.into())
    }

    /// Create an operation error
    pub fn operation(msg: impl Into<String>) -> Self {
        Self::Operation(msg.into())
    }

    /// Create a terminal error
    pub fn terminal(msg: impl Into<String>) -> Self {
        Self::Terminal(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CleanerError::device("no device found or device not authorized");
        assert_eq!(
            err.to_string(),
            "Device error: no device found or device not authorized"
        );

        let err = CleanerError::operation("uninstall com.foo returned Failure");
        assert_eq!(
            err.to_string(),
            "Operation failed: uninstall com.foo returned Failure"
        );
    }

    #[test]
    fn test_io_error_mentions_path() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = CleanerError::io("read", "packs.txt", io_err);
        let msg = err.to_string();
        assert!(msg.contains("read packs.txt"));
        assert!(msg.contains("file not found"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_error_constructors() {
        assert!(matches!(CleanerError::parse("bad"), CleanerError::Parse(_)));
        assert!(matches!(
            CleanerError::terminal("raw mode"),
            CleanerError::Terminal(_)
        ));
    }
}
