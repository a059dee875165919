//! Storage layer for snapvault.
//!
//! This crate provides a small key-value document abstraction with two backends:
//! - JSON file storage (used for a repository's index and configuration)
//! - In-memory storage (for testing)

pub mod error;
pub mod json;
pub mod memory;

pub use error::{StorageError, StorageResult};
pub use json::JsonStorage;
pub use memory::MemoryStorage;

use serde::{de::DeserializeOwned, Serialize};

/// A trait for key-value document storage backends.
///
/// Keys are represented as path segments, e.g., `["index"]`.
/// Values are serialized/deserialized as JSON.
pub trait Storage {
    /// Read a value from storage.
    ///
    /// Returns `None` if the key doesn't exist.
    fn read<T: DeserializeOwned>(&self, key: &[&str]) -> StorageResult<Option<T>>;

    /// Write a value to storage, replacing any previous value.
    fn write<T: Serialize>(&self, key: &[&str], value: &T) -> StorageResult<()>;

    /// Check if a key exists.
    fn exists(&self, key: &[&str]) -> StorageResult<bool>;
}
