//! Snapshot error types.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for snapshot operations.
pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Coarse classification of a [`SnapshotError`], for callers that only care
/// about what went wrong rather than where.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unknown snapshot id, unknown trash batch, or no repository.
    NotFound,
    /// Nothing to snapshot, or not enough snapshots to compare.
    EmptyInput,
    /// Repository already initialized. Informational.
    AlreadyExists,
    /// Read/write/move failure on files, archives or the index.
    Io,
    /// Archive could not be decoded.
    Corrupt,
    /// Configuration rejected.
    Config,
}

/// Errors that can occur during snapshot operations.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Snapshot not found.
    #[error("Snapshot not found: {0}")]
    NotFound(String),

    /// Trash batch not found.
    #[error("Trash batch not found: {0}")]
    BatchNotFound(String),

    /// No repository at the given root.
    #[error("Not a snapvault repository: {}", .0.display())]
    NotInitialized(PathBuf),

    /// Repository already exists.
    #[error("Repository already initialized at {}", .0.display())]
    AlreadyInitialized(PathBuf),

    /// The working tree has no snapshottable files.
    #[error("Nothing to snapshot: no files left after applying ignore rules")]
    NothingToSnapshot,

    /// Diff needs two snapshots.
    #[error("At least two snapshots are required to compare (found {available})")]
    NotEnoughSnapshots { available: usize },

    /// IO error on a known path.
    #[error("IO error at {}: {source}", .path.display())]
    IoAt {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Directory walk failed.
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// Index or configuration storage failed.
    #[error("Storage error: {0}")]
    Storage(#[from] snapvault_storage::StorageError),

    /// Archive is corrupted or malformed.
    #[error("Corrupt archive {}: {message}", .path.display())]
    Corrupt { path: PathBuf, message: String },

    /// Configuration value out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl SnapshotError {
    /// Create a not found error.
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound(id.into())
    }

    /// Attach a path to an IO error.
    pub fn io_at(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoAt {
            path: path.into(),
            source,
        }
    }

    /// Create a corrupt archive error.
    pub fn corrupt(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Corrupt {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) | Self::BatchNotFound(_) | Self::NotInitialized(_) => {
                ErrorKind::NotFound
            }
            Self::NothingToSnapshot | Self::NotEnoughSnapshots { .. } => ErrorKind::EmptyInput,
            Self::AlreadyInitialized(_) => ErrorKind::AlreadyExists,
            Self::IoAt { .. } | Self::Io(_) | Self::Walk(_) | Self::Storage(_) => ErrorKind::Io,
            Self::Corrupt { .. } => ErrorKind::Corrupt,
            Self::InvalidConfig(_) => ErrorKind::Config,
        }
    }
}
