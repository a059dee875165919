//! Snapshot data structures.

use chrono::{DateTime, FixedOffset, Local, SecondsFormat};
use serde::{Deserialize, Serialize};

/// Length of the content-hash prefix embedded in a snapshot id.
pub const ID_HASH_PREFIX_LEN: usize = 12;

/// Unique identifier for a snapshot.
///
/// Format: `YYYYMMDD-HHMMSS-<hash prefix>`. Also the archive's file stem.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotId(pub String);

impl SnapshotId {
    /// Derive an id from a creation time and a hex content hash.
    pub fn derive(created: &DateTime<Local>, content_hash: &str) -> Self {
        let prefix: String = content_hash.chars().take(ID_HASH_PREFIX_LEN).collect();
        Self(format!("{}-{}", created.format("%Y%m%d-%H%M%S"), prefix))
    }

    /// Create a snapshot ID from a string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the ID as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SnapshotId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// One immutable index entry per successful snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    /// Unique identifier, also the archive key.
    pub id: SnapshotId,

    /// RFC 3339 creation time. Kept as text: records written by hand or by
    /// older tools may not parse, and diff ordering copes with that.
    pub created_at: String,

    /// Operator-supplied description.
    pub message: String,

    /// Hex SHA-256 over every (path, bytes) pair in `files` order.
    pub content_hash: String,

    /// Number of files captured.
    pub file_count: usize,

    /// Root-relative, slash-separated paths, sorted.
    pub files: Vec<String>,
}

impl SnapshotRecord {
    /// Build a record for a freshly hashed file list.
    pub fn new(
        created: DateTime<Local>,
        message: impl Into<String>,
        content_hash: impl Into<String>,
        files: Vec<String>,
    ) -> Self {
        let content_hash = content_hash.into();
        Self {
            id: SnapshotId::derive(&created, &content_hash),
            created_at: created.to_rfc3339_opts(SecondsFormat::Micros, false),
            message: message.into(),
            content_hash,
            file_count: files.len(),
            files,
        }
    }

    /// Parse `created_at`, if it is valid RFC 3339.
    pub fn created(&self) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(&self.created_at).ok()
    }

    /// Check if this snapshot includes a specific file.
    pub fn contains_file(&self, path: &str) -> bool {
        self.files.iter().any(|f| f == path)
    }
}
