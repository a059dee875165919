//! Repository configuration.

use crate::{SnapshotError, SnapshotResult};
use serde::{Deserialize, Serialize};

/// Highest accepted gzip compression level.
pub const MAX_COMPRESSION_LEVEL: u32 = 9;

/// Per-repository configuration, stored at `.snapvault/config.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepoConfig {
    /// Configuration format version.
    pub version: String,

    /// Patterns ignored in addition to the repository's ignore file.
    pub auto_ignore: Vec<String>,

    /// Gzip level for archives, 0-9.
    pub compression_level: u32,

    /// Retention limit; 0 keeps every snapshot.
    pub max_snapshots: usize,

    /// Declared for forward compatibility. Not read by the snapshot engine.
    pub chunk_size_mb: u32,

    /// Declared for forward compatibility. Snapshots are always full
    /// archives; this flag is never consulted.
    pub use_delta: bool,

    /// Whether the CLI expands short command aliases.
    pub enable_aliases: bool,

    /// Whether a forced restore moves the current files to the trash first.
    pub enable_trash: bool,

    /// Whether the CLI passes the sync commands through to `git`.
    pub external_sync: bool,
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            auto_ignore: default_auto_ignore(),
            compression_level: 6,
            max_snapshots: 100,
            chunk_size_mb: 10,
            use_delta: false,
            enable_aliases: true,
            enable_trash: true,
            external_sync: false,
        }
    }
}

fn default_auto_ignore() -> Vec<String> {
    [
        "node_modules/",
        ".git/",
        "__pycache__/",
        ".snapvault/",
        "_restore_*",
        "*.exe",
        "*.dll",
        "*.so",
        "*.dylib",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl RepoConfig {
    /// Reject values the engine cannot act on.
    pub fn validate(&self) -> SnapshotResult<()> {
        if self.compression_level > MAX_COMPRESSION_LEVEL {
            return Err(SnapshotError::InvalidConfig(format!(
                "compression_level must be between 0 and {}, got {}",
                MAX_COMPRESSION_LEVEL, self.compression_level
            )));
        }
        Ok(())
    }

    /// Retention limit, `None` when unlimited.
    pub fn retention_limit(&self) -> Option<usize> {
        (self.max_snapshots > 0).then_some(self.max_snapshots)
    }
}
