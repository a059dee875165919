//! Snapshot lifecycle: create, restore, delete, retention and status.

use crate::archive::ArchiveCodec;
use crate::collect::collect_files;
use crate::repository::Repository;
use crate::resolve::IdResolver;
use crate::trash::{CaptureReport, TrashStore};
use crate::{SnapshotError, SnapshotId, SnapshotIndex, SnapshotRecord, SnapshotResult};
use chrono::Local;
use sha2::{Digest, Sha256};
use snapvault_util::path::join_slash;
use snapvault_util::TimingGuard;
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Prefix of the directory a non-forced restore extracts into.
pub const RESTORE_DIR_PREFIX: &str = "_restore_";

/// Trash reason used by forced restores.
pub const PRE_RESTORE_REASON: &str = "pre_restore";

/// What a restore did.
#[derive(Debug, Clone)]
pub struct RestoreOutcome {
    pub id: SnapshotId,
    /// Where the files were written.
    pub target: PathBuf,
    pub forced: bool,
    pub files_restored: usize,
    /// `PREV` resolved to the only snapshot.
    pub degraded: bool,
    /// Snapshot of the pre-restore state; `None` if the tree was empty.
    pub backup: Option<SnapshotRecord>,
    /// Files moved aside before extraction.
    pub trash: Option<CaptureReport>,
    /// Why moving files aside failed, if it did.
    pub trash_error: Option<String>,
}

/// Working tree compared with the latest snapshot.
#[derive(Debug, Clone)]
pub struct StatusReport {
    pub label: String,
    pub latest: Option<SnapshotRecord>,
    /// Files currently present and not ignored.
    pub current: Vec<String>,
    /// Present now, absent from the latest snapshot.
    pub untracked: Vec<String>,
    /// Recorded in the latest snapshot, gone now.
    pub missing: Vec<String>,
}

impl StatusReport {
    /// No snapshot has been taken yet.
    pub fn is_first_snapshot(&self) -> bool {
        self.latest.is_none()
    }

    pub fn is_clean(&self) -> bool {
        self.latest.is_some() && self.untracked.is_empty() && self.missing.is_empty()
    }
}

/// Drives snapshot creation and restoration for one repository.
pub struct SnapshotEngine<'a> {
    repo: &'a Repository,
}

impl<'a> SnapshotEngine<'a> {
    pub fn new(repo: &'a Repository) -> Self {
        Self { repo }
    }

    /// Capture the working tree as a new snapshot.
    ///
    /// The archive is published before the index entry is written. Records
    /// evicted by retention lose their archives on a best-effort basis.
    pub fn create(&self, message: &str) -> SnapshotResult<SnapshotRecord> {
        self.create_inner(message, None)
    }

    fn create_inner(
        &self,
        message: &str,
        keep_archive: Option<&SnapshotId>,
    ) -> SnapshotResult<SnapshotRecord> {
        if !self.repo.is_initialized()? {
            Repository::init(self.repo.root())?;
        }

        let config = self.repo.config()?;
        let matcher = self.repo.ignore_matcher(&config)?;
        let root = self.repo.root();
        let files = collect_files(root, &matcher)?;
        if files.is_empty() {
            return Err(SnapshotError::NothingToSnapshot);
        }

        let hash = content_hash(root, &files)?;
        let record = SnapshotRecord::new(Local::now(), message, hash, files);
        let mut index = self.repo.load_index()?;
        if index.contains(&record.id) {
            warn!(id = %record.id, "Snapshot id already indexed, archive will be replaced");
        }

        let archive = self.repo.archive_path(&record.id);
        {
            let _timing = TimingGuard::archive(record.id.as_str());
            ArchiveCodec::new(config.compression_level).write(root, &archive, &record.files)?;
        }

        index.append(record.clone());
        self.repo.save_index(&index)?;

        let evicted = index.evict(config.max_snapshots);
        if !evicted.is_empty() {
            self.repo.save_index(&index)?;
            self.remove_archives(&index, &evicted, keep_archive);
        }

        info!(
            id = %record.id,
            files = record.file_count,
            evicted = evicted.len(),
            "Created snapshot"
        );
        Ok(record)
    }

    /// Restore a snapshot by id, `HEAD` or `PREV`.
    ///
    /// Without `force` the files land in `<root>/_restore_<id>` and the
    /// working tree is untouched. With `force` the current state is first
    /// snapshotted, then moved to the trash, then overwritten.
    pub fn restore(&self, id: &str, force: bool) -> SnapshotResult<RestoreOutcome> {
        let index = self.repo.load_index()?;
        let resolution = IdResolver::new(&index).resolve(id);
        let id = resolution.id;

        if !index.contains(&id) {
            return Err(SnapshotError::not_found(id.as_str()));
        }
        let archive = self.repo.archive_path(&id);
        if !archive.is_file() {
            warn!(id = %id, path = %archive.display(), "Indexed snapshot has no archive");
            return Err(SnapshotError::not_found(id.as_str()));
        }

        let config = self.repo.config()?;
        let mut outcome = RestoreOutcome {
            id: id.clone(),
            target: self.repo.root().to_path_buf(),
            forced: force,
            files_restored: 0,
            degraded: resolution.degraded,
            backup: None,
            trash: None,
            trash_error: None,
        };

        if force {
            let message = format!("Backup before restoring {}", id);
            outcome.backup = match self.create_inner(&message, Some(&id)) {
                Ok(record) => Some(record),
                Err(SnapshotError::NothingToSnapshot) => {
                    debug!("Working tree empty, no backup needed");
                    None
                }
                Err(e) => return Err(e),
            };

            match TrashStore::new(self.repo).capture(PRE_RESTORE_REASON) {
                Ok(report) => outcome.trash = report,
                Err(e) => {
                    warn!(error = %e, "Could not move current files to trash, restoring anyway");
                    outcome.trash_error = Some(e.to_string());
                }
            }
        } else {
            outcome.target = self
                .repo
                .root()
                .join(format!("{}{}", RESTORE_DIR_PREFIX, id));
        }

        fs::create_dir_all(&outcome.target)
            .map_err(|e| SnapshotError::io_at(&outcome.target, e))?;
        outcome.files_restored = {
            let _timing = TimingGuard::extract(id.as_str());
            ArchiveCodec::new(config.compression_level).extract(&archive, &outcome.target)?
        };

        // The backup may have pushed the restored snapshot out of retention
        if outcome.backup.is_some() && !self.repo.load_index()?.contains(&id) {
            remove_archive(&archive, &id);
        }

        info!(
            id = %id,
            target = %outcome.target.display(),
            files = outcome.files_restored,
            forced = force,
            "Restored snapshot"
        );
        Ok(outcome)
    }

    /// Delete one snapshot: its index entry and its archive.
    pub fn delete(&self, id: &str) -> SnapshotResult<SnapshotRecord> {
        let mut index = self.repo.load_index()?;
        let id = IdResolver::new(&index).resolve_id(id);
        let record = index
            .remove(&id)
            .ok_or_else(|| SnapshotError::not_found(id.as_str()))?;
        self.repo.save_index(&index)?;

        let archive = self.repo.archive_path(&id);
        match fs::remove_file(&archive) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(id = %id, "Archive already gone");
            }
            Err(e) => return Err(SnapshotError::io_at(&archive, e)),
        }

        info!(id = %id, "Deleted snapshot");
        Ok(record)
    }

    /// Apply the retention limit now. Returns the evicted ids, oldest first.
    pub fn clean(&self) -> SnapshotResult<Vec<SnapshotId>> {
        let config = self.repo.config()?;
        let mut index = self.repo.load_index()?;
        let evicted = index.evict(config.max_snapshots);
        if evicted.is_empty() {
            return Ok(Vec::new());
        }

        self.repo.save_index(&index)?;
        self.remove_archives(&index, &evicted, None);
        info!(evicted = evicted.len(), "Cleaned old snapshots");
        Ok(evicted.into_iter().map(|r| r.id).collect())
    }

    /// Every snapshot, oldest first.
    pub fn list(&self) -> SnapshotResult<Vec<SnapshotRecord>> {
        Ok(self.repo.load_index()?.snapshots)
    }

    /// Look up a snapshot by id, `HEAD` or `PREV`.
    pub fn show(&self, id: &str) -> SnapshotResult<SnapshotRecord> {
        let index = self.repo.load_index()?;
        let id = IdResolver::new(&index).resolve_id(id);
        index
            .find(&id)
            .cloned()
            .ok_or_else(|| SnapshotError::not_found(id.as_str()))
    }

    /// Compare the working tree's file set with the latest snapshot.
    pub fn status(&self) -> SnapshotResult<StatusReport> {
        let index = self.repo.load_index()?;
        let matcher = self.repo.ignore_patterns()?;
        let current = collect_files(self.repo.root(), &matcher)?;

        let SnapshotIndex { snapshots, current: label } = index;
        let latest = snapshots.into_iter().last();

        let (untracked, missing) = match &latest {
            Some(record) => {
                let recorded: BTreeSet<&str> = record.files.iter().map(String::as_str).collect();
                let present: BTreeSet<&str> = current.iter().map(String::as_str).collect();
                (
                    present.difference(&recorded).map(|s| s.to_string()).collect(),
                    recorded.difference(&present).map(|s| s.to_string()).collect(),
                )
            }
            None => (current.clone(), Vec::new()),
        };

        Ok(StatusReport {
            label,
            latest,
            current,
            untracked,
            missing,
        })
    }

    fn remove_archives(
        &self,
        index: &SnapshotIndex,
        evicted: &[SnapshotRecord],
        keep: Option<&SnapshotId>,
    ) {
        for record in evicted {
            if index.contains(&record.id) {
                debug!(id = %record.id, "Archive still referenced, kept");
                continue;
            }
            if keep == Some(&record.id) {
                continue;
            }
            remove_archive(&self.repo.archive_path(&record.id), &record.id);
        }
    }
}

fn remove_archive(path: &Path, id: &SnapshotId) {
    match fs::remove_file(path) {
        Ok(()) => debug!(id = %id, "Removed archive"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(id = %id, error = %e, "Failed to remove archive"),
    }
}

/// Lowercase hex SHA-256 over each file's relative path followed by its
/// bytes, in the given order.
pub fn content_hash(root: &Path, files: &[String]) -> SnapshotResult<String> {
    let mut hasher = Sha256::new();
    for rel in files {
        hasher.update(rel.as_bytes());
        let path = join_slash(root, rel);
        let mut file = File::open(&path).map_err(|e| SnapshotError::io_at(&path, e))?;
        io::copy(&mut file, &mut hasher).map_err(|e| SnapshotError::io_at(&path, e))?;
    }
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::{HEAD, PREV};
    use crate::{ErrorKind, RepoConfig};
    use tempfile::TempDir;

    fn repo() -> (TempDir, Repository) {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        fs::write(dir.path().join("a.txt"), "alpha").unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/main.rs"), "fn main() {}").unwrap();
        (dir, repo)
    }

    fn with_config(repo: &Repository, edit: impl FnOnce(&mut RepoConfig)) {
        let mut config = repo.config().unwrap();
        edit(&mut config);
        repo.save_config(&config).unwrap();
    }

    #[test]
    fn test_content_hash_order_and_paths_matter() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("x"), "1").unwrap();
        fs::write(dir.path().join("y"), "2").unwrap();

        let xy = content_hash(dir.path(), &["x".into(), "y".into()]).unwrap();
        let yx = content_hash(dir.path(), &["y".into(), "x".into()]).unwrap();
        assert_ne!(xy, yx);
        assert_eq!(xy.len(), 64);
        assert_eq!(xy, content_hash(dir.path(), &["x".into(), "y".into()]).unwrap());
    }

    #[test]
    fn test_create_writes_archive_and_record() {
        let (_dir, repo) = repo();
        let record = SnapshotEngine::new(&repo).create("first").unwrap();

        assert_eq!(record.files, vec!["a.txt", "src/main.rs"]);
        assert_eq!(record.file_count, 2);
        assert_eq!(record.message, "first");
        assert!(record.id.as_str().ends_with(&record.content_hash[..12]));
        assert!(repo.archive_path(&record.id).is_file());
        assert_eq!(repo.load_index().unwrap().latest(), Some(&record));
    }

    #[test]
    fn test_create_initializes_repository() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();
        let repo = Repository::at(dir.path());

        let record = SnapshotEngine::new(&repo).create("auto").unwrap();
        assert!(repo.is_initialized().unwrap());
        assert!(record.files.contains(&"a.txt".to_string()));
    }

    #[test]
    fn test_nothing_to_snapshot() {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();

        let err = SnapshotEngine::new(&repo).create("empty").unwrap_err();
        assert!(matches!(err, SnapshotError::NothingToSnapshot));
        assert!(repo.load_index().unwrap().is_empty());
        assert_eq!(fs::read_dir(repo.snapshots_dir()).unwrap().count(), 0);
    }

    #[test]
    fn test_hash_stable_without_changes() {
        let (_dir, repo) = repo();
        let engine = SnapshotEngine::new(&repo);
        let first = engine.create("one").unwrap();
        let second = engine.create("two").unwrap();
        assert_eq!(first.content_hash, second.content_hash);
    }

    #[test]
    fn test_hash_independent_of_compression() {
        let (_dir, repo) = repo();
        let engine = SnapshotEngine::new(&repo);
        with_config(&repo, |c| c.compression_level = 0);
        let stored = engine.create("stored").unwrap();
        with_config(&repo, |c| c.compression_level = 9);
        let packed = engine.create("packed").unwrap();
        assert_eq!(stored.content_hash, packed.content_hash);
    }

    #[test]
    fn test_retention_evicts_oldest_with_archives() {
        let (dir, repo) = repo();
        with_config(&repo, |c| c.max_snapshots = 2);
        let engine = SnapshotEngine::new(&repo);

        let mut created = Vec::new();
        for i in 0..4 {
            fs::write(dir.path().join("a.txt"), format!("version {i}")).unwrap();
            created.push(engine.create(&format!("v{i}")).unwrap());
        }

        let ids: Vec<_> = engine.list().unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![created[2].id.clone(), created[3].id.clone()]);
        for old in &created[..2] {
            assert!(!repo.archive_path(&old.id).exists());
        }
        for kept in &created[2..] {
            assert!(repo.archive_path(&kept.id).exists());
        }
    }

    #[test]
    fn test_eviction_tolerates_undeletable_archive() {
        let (dir, repo) = repo();
        with_config(&repo, |c| c.max_snapshots = 1);
        let engine = SnapshotEngine::new(&repo);
        let first = engine.create("first").unwrap();

        // remove_file cannot delete a directory, whoever runs the test
        let archive = repo.archive_path(&first.id);
        fs::remove_file(&archive).unwrap();
        fs::create_dir_all(archive.join("stuck")).unwrap();

        fs::write(dir.path().join("a.txt"), "changed").unwrap();
        let second = engine.create("second").unwrap();

        let list = engine.list().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id, second.id);
        assert!(archive.is_dir());
        assert!(repo.archive_path(&second.id).is_file());
    }

    #[test]
    fn test_non_utf8_names_do_not_block_snapshots() {
        let (dir, repo) = repo();
        #[cfg(unix)]
        {
            use std::ffi::OsStr;
            use std::os::unix::ffi::OsStrExt;
            fs::write(dir.path().join(OsStr::from_bytes(b"bad\xff.txt")), "x").unwrap();
        }

        let engine = SnapshotEngine::new(&repo);
        let record = engine.create("mixed names").unwrap();
        assert_eq!(record.files, vec!["a.txt", "src/main.rs"]);
        let outcome = engine.restore(record.id.as_str(), true).unwrap();
        assert!(outcome.trash_error.is_none());
        assert_eq!(fs::read_to_string(dir.path().join("a.txt")).unwrap(), "alpha");
    }

    #[test]
    fn test_unlimited_retention() {
        let (dir, repo) = repo();
        with_config(&repo, |c| c.max_snapshots = 0);
        let engine = SnapshotEngine::new(&repo);
        for i in 0..5 {
            fs::write(dir.path().join("a.txt"), format!("{i}")).unwrap();
            engine.create("v").unwrap();
        }
        assert_eq!(engine.list().unwrap().len(), 5);
        assert!(engine.clean().unwrap().is_empty());
    }

    #[test]
    fn test_restore_into_side_directory() {
        let (dir, repo) = repo();
        let engine = SnapshotEngine::new(&repo);
        let record = engine.create("base").unwrap();
        fs::write(dir.path().join("a.txt"), "changed").unwrap();

        let outcome = engine.restore(HEAD, false).unwrap();
        assert_eq!(outcome.id, record.id);
        assert_eq!(outcome.files_restored, 2);
        assert!(outcome.backup.is_none());
        assert_eq!(
            outcome.target,
            dir.path().join(format!("_restore_{}", record.id))
        );
        assert_eq!(
            fs::read_to_string(outcome.target.join("a.txt")).unwrap(),
            "alpha"
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("a.txt")).unwrap(),
            "changed"
        );

        // The side directory is not captured by later snapshots
        let next = engine.create("after").unwrap();
        assert!(next.files.iter().all(|f| !f.starts_with("_restore_")));
    }

    #[test]
    fn test_forced_restore_backs_up_and_trashes() {
        let (dir, repo) = repo();
        let engine = SnapshotEngine::new(&repo);
        let base = engine.create("base").unwrap();

        fs::write(dir.path().join("a.txt"), "edited").unwrap();
        fs::write(dir.path().join("new.txt"), "new").unwrap();

        let outcome = engine.restore(base.id.as_str(), true).unwrap();
        assert!(outcome.forced);
        assert_eq!(outcome.target, dir.path());

        let backup = outcome.backup.unwrap();
        assert_eq!(backup.message, format!("Backup before restoring {}", base.id));
        assert!(backup.files.contains(&"new.txt".to_string()));

        let trash = outcome.trash.unwrap();
        assert!(trash.path.join("new.txt").is_file());
        assert!(!dir.path().join("new.txt").exists());
        assert_eq!(fs::read_to_string(dir.path().join("a.txt")).unwrap(), "alpha");

        let list = engine.list().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[1].id, backup.id);
    }

    #[test]
    fn test_forced_restore_without_trash_overwrites_in_place() {
        let (dir, repo) = repo();
        with_config(&repo, |c| c.enable_trash = false);
        let engine = SnapshotEngine::new(&repo);
        let base = engine.create("base").unwrap();
        fs::write(dir.path().join("extra.txt"), "stays").unwrap();

        let outcome = engine.restore(base.id.as_str(), true).unwrap();
        assert!(outcome.trash.is_none());
        assert!(outcome.trash_error.is_none());
        assert!(dir.path().join("extra.txt").exists());
    }

    #[test]
    fn test_forced_restore_continues_when_trash_unavailable() {
        let (dir, repo) = repo();
        let engine = SnapshotEngine::new(&repo);
        let base = engine.create("base").unwrap();
        fs::write(dir.path().join("a.txt"), "edited").unwrap();

        // A plain file where the trash directory belongs
        fs::remove_dir_all(repo.trash_dir()).unwrap();
        fs::write(repo.trash_dir(), "not a directory").unwrap();

        let outcome = engine.restore(base.id.as_str(), true).unwrap();
        assert!(outcome.trash.is_none());
        assert!(outcome.trash_error.is_some());
        assert!(outcome.backup.is_some());
        assert_eq!(fs::read_to_string(dir.path().join("a.txt")).unwrap(), "alpha");
    }

    #[test]
    fn test_forced_restore_on_empty_tree() {
        let (dir, repo) = repo();
        let engine = SnapshotEngine::new(&repo);
        let base = engine.create("base").unwrap();

        for rel in &base.files {
            fs::remove_file(join_slash(dir.path(), rel)).unwrap();
        }

        let outcome = engine.restore(base.id.as_str(), true).unwrap();
        assert!(outcome.backup.is_none());
        assert!(outcome.trash.is_none());
        assert_eq!(outcome.files_restored, 2);
        assert!(dir.path().join("src/main.rs").is_file());
    }

    #[test]
    fn test_forced_restore_survives_backup_eviction() {
        let (dir, repo) = repo();
        with_config(&repo, |c| c.max_snapshots = 1);
        let engine = SnapshotEngine::new(&repo);
        let base = engine.create("base").unwrap();
        fs::write(dir.path().join("a.txt"), "later").unwrap();

        let outcome = engine.restore(base.id.as_str(), true).unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("a.txt")).unwrap(), "alpha");

        // Only the backup remains, and the evicted archive is gone afterwards
        let list = engine.list().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id, outcome.backup.unwrap().id);
        assert!(!repo.archive_path(&base.id).exists());
    }

    #[test]
    fn test_restore_unknown_id() {
        let (_dir, repo) = repo();
        let engine = SnapshotEngine::new(&repo);
        engine.create("base").unwrap();

        let err = engine.restore("20000101-000000-000000000000", false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_restore_missing_archive_is_not_found() {
        let (_dir, repo) = repo();
        let engine = SnapshotEngine::new(&repo);
        let record = engine.create("base").unwrap();
        fs::remove_file(repo.archive_path(&record.id)).unwrap();

        let err = engine.restore(record.id.as_str(), false).unwrap_err();
        assert!(matches!(err, SnapshotError::NotFound(_)));
    }

    #[test]
    fn test_orphaned_archive_not_restorable() {
        let (dir, repo) = repo();
        let engine = SnapshotEngine::new(&repo);
        let record = engine.create("base").unwrap();
        let orphan = SnapshotId::from("20000101-000000-aaaaaaaaaaaa");
        fs::copy(repo.archive_path(&record.id), repo.archive_path(&orphan)).unwrap();

        let err = engine.restore(orphan.as_str(), false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(!dir.path().join(format!("_restore_{}", orphan)).exists());
    }

    #[test]
    fn test_restore_prev_with_single_snapshot() {
        let (_dir, repo) = repo();
        let engine = SnapshotEngine::new(&repo);
        let only = engine.create("only").unwrap();

        let outcome = engine.restore(PREV, false).unwrap();
        assert_eq!(outcome.id, only.id);
        assert!(outcome.degraded);
    }

    #[test]
    fn test_delete() {
        let (dir, repo) = repo();
        let engine = SnapshotEngine::new(&repo);
        let first = engine.create("first").unwrap();
        fs::write(dir.path().join("a.txt"), "second").unwrap();
        let second = engine.create("second").unwrap();

        let removed = engine.delete(first.id.as_str()).unwrap();
        assert_eq!(removed.id, first.id);
        assert!(!repo.archive_path(&first.id).exists());
        assert_eq!(engine.list().unwrap(), vec![second]);

        let err = engine.delete(first.id.as_str()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_clean_applies_new_limit() {
        let (dir, repo) = repo();
        let engine = SnapshotEngine::new(&repo);
        let mut created = Vec::new();
        for i in 0..3 {
            fs::write(dir.path().join("a.txt"), format!("{i}")).unwrap();
            created.push(engine.create("v").unwrap());
        }

        with_config(&repo, |c| c.max_snapshots = 1);
        let evicted = engine.clean().unwrap();
        assert_eq!(evicted, vec![created[0].id.clone(), created[1].id.clone()]);
        assert_eq!(engine.list().unwrap().len(), 1);
        assert!(!repo.archive_path(&created[0].id).exists());
        assert!(engine.clean().unwrap().is_empty());
    }

    #[test]
    fn test_show() {
        let (_dir, repo) = repo();
        let engine = SnapshotEngine::new(&repo);
        let record = engine.create("shown").unwrap();
        assert_eq!(engine.show(HEAD).unwrap(), record);
        assert_eq!(engine.show(record.id.as_str()).unwrap(), record);
        assert!(engine.show("missing").is_err());
    }

    #[test]
    fn test_status() {
        let (dir, repo) = repo();
        let engine = SnapshotEngine::new(&repo);

        let before = engine.status().unwrap();
        assert!(before.is_first_snapshot());
        assert_eq!(before.untracked, before.current);
        assert_eq!(before.label, "main");

        engine.create("base").unwrap();
        assert!(engine.status().unwrap().is_clean());

        fs::write(dir.path().join("b.txt"), "b").unwrap();
        fs::remove_file(dir.path().join("src/main.rs")).unwrap();
        let after = engine.status().unwrap();
        assert_eq!(after.untracked, vec!["b.txt"]);
        assert_eq!(after.missing, vec!["src/main.rs"]);
        assert!(!after.is_clean());
    }

    #[test]
    fn test_duplicate_id_keeps_shared_archive() {
        let (_dir, repo) = repo();
        with_config(&repo, |c| c.max_snapshots = 1);
        let engine = SnapshotEngine::new(&repo);

        let mut index = repo.load_index().unwrap();
        let record = engine.create("original").unwrap();
        index.append(record.clone());
        index.append(record.clone());
        repo.save_index(&index).unwrap();

        // The dropped record shares its id with the surviving one
        engine.clean().unwrap();
        assert_eq!(engine.list().unwrap().len(), 1);
        assert!(repo.archive_path(&record.id).exists());
    }
}
