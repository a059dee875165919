//! File-set comparison between two indexed snapshots.
//!
//! Only the recorded file lists are compared. Files present in both
//! snapshots are counted as possibly modified; their bytes are never read.

use crate::resolve::IdResolver;
use crate::{SnapshotError, SnapshotId, SnapshotIndex, SnapshotRecord, SnapshotResult};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Identifying fields of one side of a comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffSide {
    pub id: SnapshotId,
    pub created_at: String,
    pub message: String,
}

impl From<&SnapshotRecord> for DiffSide {
    fn from(record: &SnapshotRecord) -> Self {
        Self {
            id: record.id.clone(),
            created_at: record.created_at.clone(),
            message: record.message.clone(),
        }
    }
}

/// Differences between an older and a newer snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    pub older: DiffSide,
    pub newer: DiffSide,
    /// In the newer snapshot only, sorted.
    pub added: Vec<String>,
    /// In the older snapshot only, sorted.
    pub removed: Vec<String>,
    /// Number of paths present in both.
    pub possibly_modified: usize,
}

impl FileDiff {
    /// No file was added or removed.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffReport {
    /// Both references named the same snapshot.
    Same { id: SnapshotId },
    Changes(Box<FileDiff>),
}

impl DiffReport {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Same { .. } => true,
            Self::Changes(diff) => diff.is_empty(),
        }
    }
}

/// Read-only comparison over an index.
pub struct DiffEngine<'a> {
    index: &'a SnapshotIndex,
}

impl<'a> DiffEngine<'a> {
    pub fn new(index: &'a SnapshotIndex) -> Self {
        Self { index }
    }

    /// Compare two snapshot references (ids, `HEAD` or `PREV`).
    ///
    /// The older side is chosen by `created_at`. When either timestamp does
    /// not parse, or both are equal, index position decides.
    pub fn diff(&self, a: &str, b: &str) -> SnapshotResult<DiffReport> {
        let resolver = IdResolver::new(self.index);
        let id_a = resolver.resolve_id(a);
        let id_b = resolver.resolve_id(b);

        if id_a == id_b {
            return Ok(DiffReport::Same { id: id_a });
        }

        if self.index.len() < 2 {
            return Err(SnapshotError::NotEnoughSnapshots {
                available: self.index.len(),
            });
        }

        let pos_a = self
            .index
            .position(&id_a)
            .ok_or_else(|| SnapshotError::not_found(id_a.as_str()))?;
        let pos_b = self
            .index
            .position(&id_b)
            .ok_or_else(|| SnapshotError::not_found(id_b.as_str()))?;
        let rec_a = &self.index.snapshots[pos_a];
        let rec_b = &self.index.snapshots[pos_b];

        let (older, newer) = match chronological(rec_a, rec_b) {
            Some(Ordering::Less) => (rec_a, rec_b),
            Some(Ordering::Greater) => (rec_b, rec_a),
            _ if pos_a <= pos_b => (rec_a, rec_b),
            _ => (rec_b, rec_a),
        };

        Ok(DiffReport::Changes(Box::new(compare(older, newer))))
    }
}

/// Order two records by parsed creation time, if both parse and differ.
fn chronological(a: &SnapshotRecord, b: &SnapshotRecord) -> Option<Ordering> {
    let (ta, tb) = (a.created()?, b.created()?);
    match ta.cmp(&tb) {
        Ordering::Equal => None,
        other => Some(other),
    }
}

fn compare(older: &SnapshotRecord, newer: &SnapshotRecord) -> FileDiff {
    let old_set: BTreeSet<&str> = older.files.iter().map(String::as_str).collect();
    let new_set: BTreeSet<&str> = newer.files.iter().map(String::as_str).collect();

    FileDiff {
        older: older.into(),
        newer: newer.into(),
        added: new_set.difference(&old_set).map(|s| s.to_string()).collect(),
        removed: old_set.difference(&new_set).map(|s| s.to_string()).collect(),
        possibly_modified: old_set.intersection(&new_set).count(),
    }
}
