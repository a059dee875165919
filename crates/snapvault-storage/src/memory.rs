//! In-memory storage implementation for testing.

use crate::{Storage, StorageError, StorageResult};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory storage for testing.
///
/// This stores all data in memory and is not persistent.
#[derive(Debug)]
pub struct MemoryStorage {
    data: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create a new in-memory storage.
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
        }
    }

    fn key_to_string(key: &[&str]) -> StorageResult<String> {
        if key.is_empty() {
            return Err(StorageError::invalid_key("Key cannot be empty"));
        }
        Ok(key.join("/"))
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for MemoryStorage {
    fn read<T: DeserializeOwned>(&self, key: &[&str]) -> StorageResult<Option<T>> {
        let key_str = Self::key_to_string(key)?;
        let data = self
            .data
            .read()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))?;

        match data.get(&key_str) {
            Some(json) => Ok(Some(serde_json::from_str(json)?)),
            None => Ok(None),
        }
    }

    fn write<T: Serialize>(&self, key: &[&str], value: &T) -> StorageResult<()> {
        let key_str = Self::key_to_string(key)?;
        let json = serde_json::to_string(value)?;

        let mut data = self
            .data
            .write()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))?;
        data.insert(key_str, json);

        Ok(())
    }

    fn exists(&self, key: &[&str]) -> StorageResult<bool> {
        let key_str = Self::key_to_string(key)?;
        let data = self
            .data
            .read()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))?;
        Ok(data.contains_key(&key_str))
    }
}
