//! The snapshot index: the ordered record of which snapshots exist.

use crate::{SnapshotId, SnapshotRecord, SnapshotResult};
use serde::{Deserialize, Serialize};
use snapvault_storage::Storage;
use tracing::debug;

/// Storage key of the index document.
pub const INDEX_KEY: &str = "index";

/// Label used until a branch is named.
pub const DEFAULT_LABEL: &str = "main";

fn default_label() -> String {
    DEFAULT_LABEL.to_string()
}

/// Ordered snapshot records plus the current branch label.
///
/// Records are kept in insertion order, which is chronological order. An
/// archive with no record here does not exist as far as every reader is
/// concerned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotIndex {
    #[serde(default)]
    pub snapshots: Vec<SnapshotRecord>,

    #[serde(default = "default_label")]
    pub current: String,
}

impl Default for SnapshotIndex {
    fn default() -> Self {
        Self {
            snapshots: Vec::new(),
            current: default_label(),
        }
    }
}

impl SnapshotIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record at the end.
    pub fn append(&mut self, record: SnapshotRecord) {
        self.snapshots.push(record);
    }

    /// Drop the oldest records until at most `max_count` remain.
    ///
    /// Returns the dropped records oldest-first. `0` means unlimited.
    pub fn evict(&mut self, max_count: usize) -> Vec<SnapshotRecord> {
        if max_count == 0 || self.snapshots.len() <= max_count {
            return Vec::new();
        }
        let excess = self.snapshots.len() - max_count;
        let evicted: Vec<_> = self.snapshots.drain(..excess).collect();
        debug!(evicted = evicted.len(), kept = self.snapshots.len(), "Evicted snapshots");
        evicted
    }

    /// Overwrite the branch label.
    pub fn set_label(&mut self, name: impl Into<String>) {
        self.current = name.into();
    }

    /// Most recent record.
    pub fn latest(&self) -> Option<&SnapshotRecord> {
        self.snapshots.last()
    }

    /// Second most recent record.
    pub fn previous(&self) -> Option<&SnapshotRecord> {
        self.snapshots
            .len()
            .checked_sub(2)
            .and_then(|i| self.snapshots.get(i))
    }

    /// Look up a record by id. With duplicate ids, the newest wins.
    pub fn find(&self, id: &SnapshotId) -> Option<&SnapshotRecord> {
        self.position(id).map(|i| &self.snapshots[i])
    }

    /// Index position of a record (0 = oldest).
    pub fn position(&self, id: &SnapshotId) -> Option<usize> {
        self.snapshots.iter().rposition(|r| &r.id == id)
    }

    /// Remove every record carrying `id`, returning the newest one removed.
    pub fn remove(&mut self, id: &SnapshotId) -> Option<SnapshotRecord> {
        let mut removed = None;
        let mut kept = Vec::with_capacity(self.snapshots.len());
        for record in self.snapshots.drain(..) {
            if &record.id == id {
                removed = Some(record);
            } else {
                kept.push(record);
            }
        }
        self.snapshots = kept;
        removed
    }

    pub fn contains(&self, id: &SnapshotId) -> bool {
        self.position(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Records oldest-first.
    pub fn iter(&self) -> impl Iterator<Item = &SnapshotRecord> {
        self.snapshots.iter()
    }
}

/// Loads and saves the index through a [`Storage`] backend.
pub struct IndexStore<S: Storage> {
    storage: S,
}

impl<S: Storage> IndexStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Load the index. `None` means no repository has been initialized here,
    /// which is distinct from an empty index.
    pub fn load(&self) -> SnapshotResult<Option<SnapshotIndex>> {
        Ok(self.storage.read(&[INDEX_KEY])?)
    }

    /// Persist the full index, replacing what was there.
    pub fn save(&self, index: &SnapshotIndex) -> SnapshotResult<()> {
        self.storage.write(&[INDEX_KEY], index)?;
        debug!(records = index.len(), "Index saved");
        Ok(())
    }

    pub fn exists(&self) -> SnapshotResult<bool> {
        Ok(self.storage.exists(&[INDEX_KEY])?)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};
    use snapvault_storage::MemoryStorage;

    fn record(second: u32, hash: &str) -> SnapshotRecord {
        let created = Local.with_ymd_and_hms(2025, 3, 1, 12, 0, second).unwrap();
        SnapshotRecord::new(created, format!("snap {second}"), hash, vec!["a.txt".into()])
    }

    fn index_of(n: u32) -> SnapshotIndex {
        let mut index = SnapshotIndex::new();
        for i in 0..n {
            index.append(record(i, &format!("{:0>12}", i)));
        }
        index
    }

    #[test]
    fn test_default_label() {
        let index = SnapshotIndex::new();
        assert_eq!(index.current, "main");
        assert!(index.is_empty());
        assert!(index.latest().is_none());
        assert!(index.previous().is_none());
    }

    #[test]
    fn test_latest_and_previous() {
        let index = index_of(3);
        assert_eq!(index.latest().unwrap().message, "snap 2");
        assert_eq!(index.previous().unwrap().message, "snap 1");

        let single = index_of(1);
        assert!(single.previous().is_none());
    }

    #[test]
    fn test_evict_keeps_newest() {
        let mut index = index_of(5);
        let evicted = index.evict(2);

        let evicted_msgs: Vec<_> = evicted.iter().map(|r| r.message.as_str()).collect();
        assert_eq!(evicted_msgs, vec!["snap 0", "snap 1", "snap 2"]);
        let kept: Vec<_> = index.iter().map(|r| r.message.as_str()).collect();
        assert_eq!(kept, vec!["snap 3", "snap 4"]);
    }

    #[test]
    fn test_evict_zero_is_unlimited() {
        let mut index = index_of(4);
        assert!(index.evict(0).is_empty());
        assert_eq!(index.len(), 4);
    }

    #[test]
    fn test_evict_under_limit() {
        let mut index = index_of(2);
        assert!(index.evict(2).is_empty());
        assert!(index.evict(10).is_empty());
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_find_position_remove() {
        let mut index = index_of(3);
        let id = index.snapshots[1].id.clone();

        assert_eq!(index.position(&id), Some(1));
        assert!(index.contains(&id));
        assert_eq!(index.find(&id).unwrap().message, "snap 1");

        let removed = index.remove(&id).unwrap();
        assert_eq!(removed.id, id);
        assert!(!index.contains(&id));
        assert_eq!(index.len(), 2);
        assert!(index.remove(&id).is_none());
    }

    #[test]
    fn test_set_label_unconditional() {
        let mut index = SnapshotIndex::new();
        index.set_label("");
        assert_eq!(index.current, "");
        index.set_label("feature");
        assert_eq!(index.current, "feature");
    }

    #[test]
    fn test_store_absent_vs_empty() {
        let store = IndexStore::new(MemoryStorage::new());
        assert!(store.load().unwrap().is_none());
        assert!(!store.exists().unwrap());

        store.save(&SnapshotIndex::new()).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert!(loaded.is_empty());
        assert!(store.exists().unwrap());
    }

    #[test]
    fn test_store_preserves_order_and_label() {
        let store = IndexStore::new(MemoryStorage::new());
        let mut index = index_of(3);
        index.set_label("experiment");
        store.save(&index).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded, index);
    }

    #[test]
    fn test_missing_fields_default() {
        let index: SnapshotIndex = serde_json::from_str("{}").unwrap();
        assert_eq!(index, SnapshotIndex::new());
    }
}
