//! JSON file-based storage implementation.
//!
//! This storage backend stores each key as a separate JSON file.
//! Keys are mapped to file paths: `["index"]` -> `<base>/index.json`.

use crate::{Storage, StorageError, StorageResult};
use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// JSON file-based storage.
#[derive(Debug, Clone)]
pub struct JsonStorage {
    base_path: PathBuf,
}

impl JsonStorage {
    /// Create a new JSON storage at the given base path.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Directory holding the documents.
    pub fn base_path(&self) -> &PathBuf {
        &self.base_path
    }

    /// Get the file path for a key.
    pub fn key_to_path(&self, key: &[&str]) -> StorageResult<PathBuf> {
        if key.is_empty() {
            return Err(StorageError::invalid_key("Key cannot be empty"));
        }

        // No path traversal
        for component in key {
            if component.is_empty()
                || component.contains('/')
                || component.contains('\\')
                || *component == "."
                || *component == ".."
            {
                return Err(StorageError::invalid_key(format!(
                    "Invalid key component: {}",
                    component
                )));
            }
        }

        let mut path = self.base_path.clone();
        for component in key {
            path.push(component);
        }
        path.set_extension("json");

        Ok(path)
    }
}

impl Storage for JsonStorage {
    fn read<T: DeserializeOwned>(&self, key: &[&str]) -> StorageResult<Option<T>> {
        let path = self.key_to_path(key)?;
        debug!(path = %path.display(), "Reading from storage");

        match fs::read_to_string(&path) {
            Ok(content) => {
                let value: T = serde_json::from_str(&content)?;
                Ok(Some(value))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::io(path, e)),
        }
    }

    fn write<T: Serialize>(&self, key: &[&str], value: &T) -> StorageResult<()> {
        let path = self.key_to_path(key)?;
        debug!(path = %path.display(), "Writing to storage");

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
        }

        let mut content = serde_json::to_string_pretty(value)?;
        content.push('\n');

        // Write to temp file, then rename
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, &content).map_err(|e| StorageError::io(&temp_path, e))?;
        fs::rename(&temp_path, &path).map_err(|e| StorageError::io(&path, e))?;

        Ok(())
    }

    fn exists(&self, key: &[&str]) -> StorageResult<bool> {
        let path = self.key_to_path(key)?;
        Ok(path.is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::tempdir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
    struct TestData {
        name: String,
        value: i32,
    }

    #[test]
    fn test_write_and_read() {
        let dir = tempdir().unwrap();
        let storage = JsonStorage::new(dir.path());

        let data = TestData {
            name: "test".to_string(),
            value: 42,
        };

        storage.write(&["test", "data"], &data).unwrap();

        let read: Option<TestData> = storage.read(&["test", "data"]).unwrap();
        assert_eq!(read, Some(data));
        assert!(dir.path().join("test").join("data.json").is_file());
        assert!(!dir.path().join("test").join("data.json.tmp").exists());
    }

    #[test]
    fn test_read_not_found() {
        let dir = tempdir().unwrap();
        let storage = JsonStorage::new(dir.path());

        let read: Option<TestData> = storage.read(&["nonexistent"]).unwrap();
        assert_eq!(read, None);
        assert!(!storage.exists(&["nonexistent"]).unwrap());
    }

    #[test]
    fn test_read_malformed_is_json_error() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("index.json"), "{ not json").unwrap();
        let storage = JsonStorage::new(dir.path());

        let result: StorageResult<Option<TestData>> = storage.read(&["index"]);
        assert!(matches!(result, Err(StorageError::Json(_))));
    }

    #[test]
    fn test_invalid_key() {
        let dir = tempdir().unwrap();
        let storage = JsonStorage::new(dir.path());
        let data = TestData::default();

        assert!(storage.write(&[], &data).is_err());
        assert!(storage.write(&["..", "etc", "passwd"], &data).is_err());
        assert!(storage.write(&["path/traversal"], &data).is_err());
    }
}
