//! Error types for tree building and fingerprinting.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while building a tree from a root.
///
/// Only failures on a root supplied by the caller surface as `ScanError`.
/// Failures deeper in the tree are recorded as [`ScanWarning`]s on the
/// directory they affect.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl ScanError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}

/// Failure to compute a strong fingerprint.
///
/// Memoized per node, so it is `Clone` and keeps only the rendered message of
/// the underlying I/O error. A directory returns the first failing
/// descendant's error unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum HashError {
    /// A file could not be opened or read.
    #[error("Cannot read {path}: {message}")]
    Read { path: PathBuf, message: String },

    /// A directory's listing was incomplete when the tree was built.
    #[error("Incomplete listing of {path}: {message}")]
    IncompleteListing { path: PathBuf, message: String },
}

impl HashError {
    /// Create a read error from an I/O error.
    pub fn read(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            message: error.to_string(),
        }
    }

    /// Path of the node that caused the failure.
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::Read { path, .. } | Self::IncompleteListing { path, .. } => path,
        }
    }
}

impl From<&ScanWarning> for HashError {
    fn from(warning: &ScanWarning) -> Self {
        Self::IncompleteListing {
            path: warning.path.clone(),
            message: warning.message.clone(),
        }
    }
}

/// Kind of scan warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    /// Permission was denied.
    PermissionDenied,
    /// Error listing a directory.
    ReadError,
    /// Error reading metadata of an entry.
    MetadataError,
}

/// Non-fatal failure encountered below a root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanWarning {
    /// Path where the warning occurred.
    pub path: PathBuf,
    /// Human-readable message.
    pub message: String,
    /// Kind of warning.
    pub kind: WarningKind,
}

impl ScanWarning {
    /// Create a new scan warning.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>, kind: WarningKind) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind,
        }
    }

    /// Create a permission denied warning.
    pub fn permission_denied(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            message: format!("Permission denied: {}", path.display()),
            path,
            kind: WarningKind::PermissionDenied,
        }
    }

    /// Create a read error warning, classifying permission failures.
    pub fn read_error(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        if error.kind() == std::io::ErrorKind::PermissionDenied {
            return Self::permission_denied(path);
        }
        Self {
            message: format!("Read error: {error}"),
            path: path.into(),
            kind: WarningKind::ReadError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_error_io() {
        let err = ScanError::io(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, ScanError::PermissionDenied { .. }));

        let err = ScanError::io(
            "/test/missing",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, ScanError::NotFound { path } if path == PathBuf::from("/test/missing")));
    }

    #[test]
    fn test_read_error_classifies_permission() {
        let denied = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let warning = ScanWarning::read_error("/locked", &denied);
        assert_eq!(warning.kind, WarningKind::PermissionDenied);

        let other = std::io::Error::other("bad sector");
        let warning = ScanWarning::read_error("/broken", &other);
        assert_eq!(warning.kind, WarningKind::ReadError);
        assert!(warning.message.contains("bad sector"));
    }

    #[test]
    fn test_hash_error_from_warning_keeps_path() {
        let warning = ScanWarning::permission_denied("/root/secret");
        let err = HashError::from(&warning);
        assert_eq!(err.path(), &PathBuf::from("/root/secret"));
        assert!(matches!(err, HashError::IncompleteListing { .. }));
    }
}
