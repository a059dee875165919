//! Local snapshot store for snapvault.
//!
//! This crate captures the full state of a working directory into immutable,
//! content-hashed archives and keeps a chronological index of them:
//! - Create snapshots with bounded retention
//! - Restore a snapshot beside or over the working tree
//! - Compare the file sets of two snapshots
//! - Move files aside into the trash and bring them back
//!
//! # Example
//!
//! ```no_run
//! use snapvault_snapshot::{DiffEngine, Repository, SnapshotEngine};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let repo = Repository::open_or_init("/project/root")?;
//! let engine = SnapshotEngine::new(&repo);
//!
//! // Capture the tree before a risky change
//! let snapshot = engine.create("Before refactor")?;
//!
//! // ... edit files ...
//!
//! let index = repo.load_index()?;
//! let report = DiffEngine::new(&index).diff("PREV", "HEAD")?;
//!
//! // Put everything back, keeping the current state in the trash
//! engine.restore(snapshot.id.as_str(), true)?;
//! # let _ = report;
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod collect;
pub mod config;
pub mod diff;
pub mod engine;
mod error;
pub mod ignore;
pub mod index;
pub mod repository;
pub mod resolve;
mod snapshot;
pub mod trash;

pub use archive::{ArchiveCodec, ArchiveEntry, ArchiveSummary};
pub use collect::{collect_files, FileCollector};
pub use config::RepoConfig;
pub use diff::{DiffEngine, DiffReport, DiffSide, FileDiff};
pub use engine::{content_hash, RestoreOutcome, SnapshotEngine, StatusReport};
pub use error::{ErrorKind, SnapshotError, SnapshotResult};
pub use ignore::{is_ignored, IgnoreMatcher};
pub use index::{IndexStore, SnapshotIndex};
pub use repository::{Diagnostics, RecordCheck, Repository};
pub use resolve::{IdResolver, Resolution};
pub use snapshot::{SnapshotId, SnapshotRecord};
pub use trash::{BatchRestoreReport, CaptureReport, MoveFailure, TrashBatch, TrashStore};
