//! Reversible relocation of working-tree files.
//!
//! A capture moves every non-ignored file into a fresh batch directory under
//! `.snapvault/trash/`, mirroring relative paths. Restoring a batch moves the
//! files back. Batches are self-contained and never consult the index.

use crate::collect::collect_files;
use crate::repository::Repository;
use crate::{SnapshotError, SnapshotResult};
use chrono::{DateTime, Local};
use snapvault_util::path::{is_descending, join_slash, relative_slash};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// A file that could not be moved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveFailure {
    pub path: String,
    pub error: String,
}

/// Outcome of [`TrashStore::capture`].
#[derive(Debug, Clone)]
pub struct CaptureReport {
    pub batch: String,
    pub path: PathBuf,
    pub moved: usize,
    pub failed: Vec<MoveFailure>,
}

/// Outcome of [`TrashStore::restore_batch`].
#[derive(Debug, Clone)]
pub struct BatchRestoreReport {
    pub batch: String,
    pub restored: Vec<String>,
    pub failed: Vec<MoveFailure>,
    /// The batch directory was deleted; only when nothing failed.
    pub batch_removed: bool,
}

/// One batch directory as listed.
#[derive(Debug, Clone)]
pub struct TrashBatch {
    pub name: String,
    pub path: PathBuf,
    pub file_count: usize,
    pub modified: Option<DateTime<Local>>,
}

pub struct TrashStore<'a> {
    repo: &'a Repository,
}

impl<'a> TrashStore<'a> {
    pub fn new(repo: &'a Repository) -> Self {
        Self { repo }
    }

    /// Move the working tree's current files into a new batch.
    ///
    /// Returns `None` when trash is disabled or there is nothing to move.
    /// Files that fail to move stay in place and are listed in the report.
    pub fn capture(&self, reason: &str) -> SnapshotResult<Option<CaptureReport>> {
        let config = self.repo.config()?;
        if !config.enable_trash {
            debug!("Trash disabled, nothing captured");
            return Ok(None);
        }

        let matcher = self.repo.ignore_matcher(&config)?;
        let files = collect_files(self.repo.root(), &matcher)?;
        if files.is_empty() {
            return Ok(None);
        }

        let (batch, batch_dir) = self.new_batch_dir(reason)?;
        let mut moved = 0;
        let mut failed = Vec::new();

        for rel in &files {
            let src = join_slash(self.repo.root(), rel);
            let dst = join_slash(&batch_dir, rel);
            match move_file(&src, &dst) {
                Ok(()) => {
                    moved += 1;
                    debug!(path = %rel, batch = %batch, "Moved to trash");
                }
                Err(e) => {
                    warn!(path = %rel, error = %e, "Could not move file to trash");
                    failed.push(MoveFailure {
                        path: rel.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(batch = %batch, moved, failed = failed.len(), "Captured working tree");
        Ok(Some(CaptureReport {
            batch,
            path: batch_dir,
            moved,
            failed,
        }))
    }

    /// Move every file of a batch back into the working tree.
    ///
    /// The batch directory is removed only if every file made it back.
    pub fn restore_batch(&self, batch_id: &str) -> SnapshotResult<BatchRestoreReport> {
        let batch_dir = self.batch_path(batch_id)?;

        let mut pending = Vec::new();
        for entry in WalkDir::new(&batch_dir).follow_links(false) {
            let entry = entry?;
            if entry.file_type().is_dir() {
                continue;
            }
            if let Some(rel) = relative_slash(entry.path(), &batch_dir) {
                pending.push((entry.into_path(), rel));
            }
        }

        let mut restored = Vec::new();
        let mut failed = Vec::new();
        for (src, rel) in pending {
            let dst = join_slash(self.repo.root(), &rel);
            match move_file(&src, &dst) {
                Ok(()) => {
                    debug!(path = %rel, "Restored from trash");
                    restored.push(rel);
                }
                Err(e) => {
                    warn!(path = %rel, error = %e, "Could not restore file from trash");
                    failed.push(MoveFailure {
                        path: rel,
                        error: e.to_string(),
                    });
                }
            }
        }

        let batch_removed = failed.is_empty();
        if batch_removed {
            fs::remove_dir_all(&batch_dir).map_err(|e| SnapshotError::io_at(&batch_dir, e))?;
        } else {
            warn!(batch = %batch_id, failed = failed.len(), "Batch kept, some files were not restored");
        }

        info!(batch = %batch_id, restored = restored.len(), "Restored trash batch");
        Ok(BatchRestoreReport {
            batch: batch_id.to_string(),
            restored,
            failed,
            batch_removed,
        })
    }

    /// Every batch, oldest first.
    pub fn list(&self) -> SnapshotResult<Vec<TrashBatch>> {
        let trash_dir = self.repo.trash_dir();
        let entries = match fs::read_dir(&trash_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(SnapshotError::io_at(&trash_dir, e)),
        };

        let mut batches = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| SnapshotError::io_at(&trash_dir, e))?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let modified = entry
                .metadata()
                .and_then(|m| m.modified())
                .ok()
                .map(DateTime::<Local>::from);
            batches.push(TrashBatch {
                name: entry.file_name().to_string_lossy().into_owned(),
                file_count: count_files(&path),
                path,
                modified,
            });
        }
        batches.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(batches)
    }

    /// Delete every batch. Returns how many were deleted.
    pub fn empty_all(&self) -> SnapshotResult<usize> {
        let count = self.list()?.len();
        let trash_dir = self.repo.trash_dir();
        if trash_dir.exists() {
            fs::remove_dir_all(&trash_dir).map_err(|e| SnapshotError::io_at(&trash_dir, e))?;
        }
        fs::create_dir_all(&trash_dir).map_err(|e| SnapshotError::io_at(&trash_dir, e))?;
        info!(batches = count, "Emptied trash");
        Ok(count)
    }

    fn batch_path(&self, batch_id: &str) -> SnapshotResult<PathBuf> {
        if !is_descending(batch_id) || batch_id.contains('/') || batch_id.contains('\\') {
            return Err(SnapshotError::BatchNotFound(batch_id.to_string()));
        }
        let path = self.repo.trash_dir().join(batch_id);
        if !path.is_dir() {
            return Err(SnapshotError::BatchNotFound(batch_id.to_string()));
        }
        Ok(path)
    }

    fn new_batch_dir(&self, reason: &str) -> SnapshotResult<(String, PathBuf)> {
        let trash_dir = self.repo.trash_dir();
        fs::create_dir_all(&trash_dir).map_err(|e| SnapshotError::io_at(&trash_dir, e))?;

        let reason: String = reason
            .chars()
            .map(|c| if c == '/' || c == '\\' { '_' } else { c })
            .collect();
        let base = format!("{}_{}", Local::now().format("%Y%m%d_%H%M%S"), reason);

        let mut name = base.clone();
        let mut suffix = 2;
        while trash_dir.join(&name).exists() {
            name = format!("{}-{}", base, suffix);
            suffix += 1;
        }

        let path = trash_dir.join(&name);
        fs::create_dir(&path).map_err(|e| SnapshotError::io_at(&path, e))?;
        Ok((name, path))
    }
}

fn move_file(src: &Path, dst: &Path) -> std::io::Result<()> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::rename(src, dst)
}

fn count_files(dir: &Path) -> usize {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| !e.file_type().is_dir())
        .count()
}
