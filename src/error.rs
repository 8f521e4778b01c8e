// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

/// Core error types for wpup
#[derive(Error, Debug)]
pub enum Error {
    /// Archive is missing, unreadable, or not a ZIP container
    #[error("Cannot read package archive {path}: {reason}")]
    ArchiveUnreadable { path: PathBuf, reason: String },

    /// Archive opened fine but holds no plugin header or theme stylesheet
    #[error("The specified file {0} does not contain a valid WordPress plugin or theme")]
    InvalidPackage(PathBuf),

    /// No package archive exists for the requested slug
    #[error("Package not found: {0}")]
    PackageNotFound(String),

    /// Cache storage errors
    #[error("Cache error: {0}")]
    CacheError(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn unreadable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Error::ArchiveUnreadable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// True for errors the update API reports as "no such package"
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::ArchiveUnreadable { .. } | Error::PackageNotFound(_))
    }
}

/// Result type alias using wpup's Error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_classification() {
        assert!(Error::unreadable("/tmp/a.zip", "missing").is_not_found());
        assert!(Error::PackageNotFound("hello".to_string()).is_not_found());
        assert!(!Error::InvalidPackage(PathBuf::from("/tmp/a.zip")).is_not_found());
    }

    #[test]
    fn test_invalid_package_message() {
        let err = Error::InvalidPackage(PathBuf::from("packages/foo.zip"));
        assert_eq!(
            err.to_string(),
            "The specified file packages/foo.zip does not contain a valid WordPress plugin or theme"
        );
    }
}
