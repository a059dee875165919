//! Storage error types.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// IO error while touching a document file.
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid key format
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Lock was poisoned (another thread panicked while holding the lock)
    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),
}

impl StorageError {
    /// Create an IO error bound to the file it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create an invalid key error.
    pub fn invalid_key(message: impl Into<String>) -> Self {
        Self::InvalidKey(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_error_invalid_key_formats_message() {
        let err = StorageError::invalid_key("empty key component");
        assert_eq!(err.to_string(), "Invalid key: empty key component");
    }

    #[test]
    fn storage_error_io_names_path() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = StorageError::io("/repo/.snapvault/index.json", io_err);
        let rendered = err.to_string();
        assert!(rendered.contains("index.json"));
        assert!(rendered.contains("denied"));
    }

    #[test]
    fn storage_error_json_wraps_serde_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err = StorageError::from(json_err);
        assert!(err.to_string().contains("JSON error"));
    }

    #[test]
    fn storage_error_lock_poisoned_displays() {
        let err = StorageError::LockPoisoned("mutex poisoned".to_string());
        assert_eq!(err.to_string(), "Lock poisoned: mutex poisoned");
    }
}
