//! Repository handle and on-disk layout.
//!
//! ```text
//! <root>/
//!   .snapvaultignore
//!   .snapvault/
//!     index.json
//!     config.json
//!     snapshots/<id>.tar.gz
//!     trash/<batch>/...
//! ```

use crate::ignore::{IgnoreMatcher, DEFAULT_IGNORE_FILE};
use crate::index::{IndexStore, INDEX_KEY};
use crate::{RepoConfig, SnapshotError, SnapshotId, SnapshotIndex, SnapshotResult};
use snapvault_storage::{JsonStorage, Storage};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Name of the metadata directory under the repository root.
pub const METADATA_DIR: &str = ".snapvault";

/// Name of the ignore file under the repository root.
pub const IGNORE_FILE: &str = ".snapvaultignore";

/// Archive directory under the metadata directory.
pub const SNAPSHOTS_DIR: &str = "snapshots";

/// Trash directory under the metadata directory.
pub const TRASH_DIR: &str = "trash";

/// Storage key of the configuration document.
pub const CONFIG_KEY: &str = "config";

/// Extension of snapshot archives.
pub const ARCHIVE_EXTENSION: &str = ".tar.gz";

/// Explicit handle on one repository. Every engine takes one of these.
#[derive(Debug, Clone)]
pub struct Repository {
    root: PathBuf,
    meta_dir: PathBuf,
    storage: JsonStorage,
}

impl Repository {
    /// A handle on `root` with no existence check.
    pub fn at(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let meta_dir = root.join(METADATA_DIR);
        Self {
            storage: JsonStorage::new(&meta_dir),
            root,
            meta_dir,
        }
    }

    /// Create a repository at `root`.
    ///
    /// Fails with `AlreadyInitialized` if an index is already there. An
    /// existing config or ignore file is kept.
    pub fn init(root: impl Into<PathBuf>) -> SnapshotResult<Self> {
        let repo = Self::at(root);
        if repo.is_initialized()? {
            return Err(SnapshotError::AlreadyInitialized(repo.root.clone()));
        }

        for dir in [&repo.meta_dir, &repo.snapshots_dir(), &repo.trash_dir()] {
            fs::create_dir_all(dir).map_err(|e| SnapshotError::io_at(dir, e))?;
        }

        repo.config()?;

        let ignore_file = repo.ignore_file();
        if !ignore_file.exists() {
            fs::write(&ignore_file, DEFAULT_IGNORE_FILE)
                .map_err(|e| SnapshotError::io_at(&ignore_file, e))?;
        }

        repo.index_store().save(&SnapshotIndex::new())?;
        info!(root = %repo.root.display(), "Initialized repository");
        Ok(repo)
    }

    /// Open an existing repository.
    pub fn open(root: impl Into<PathBuf>) -> SnapshotResult<Self> {
        let repo = Self::at(root);
        if !repo.is_initialized()? {
            return Err(SnapshotError::NotInitialized(repo.root.clone()));
        }
        Ok(repo)
    }

    /// Open the repository at `root`, initializing it on first use.
    pub fn open_or_init(root: impl Into<PathBuf>) -> SnapshotResult<Self> {
        let repo = Self::at(root);
        if repo.is_initialized()? {
            return Ok(repo);
        }
        debug!(root = %repo.root.display(), "No repository yet, initializing");
        Self::init(repo.root)
    }

    /// Nearest ancestor of `start` (inclusive) holding an initialized
    /// repository.
    pub fn discover(start: &Path) -> Option<PathBuf> {
        let marker = Path::new(METADATA_DIR).join(format!("{}.json", INDEX_KEY));
        snapvault_util::path::find_root_with(start, &marker)
    }

    pub fn is_initialized(&self) -> SnapshotResult<bool> {
        Ok(self.storage.exists(&[INDEX_KEY])?)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn meta_dir(&self) -> &Path {
        &self.meta_dir
    }

    pub fn snapshots_dir(&self) -> PathBuf {
        self.meta_dir.join(SNAPSHOTS_DIR)
    }

    pub fn trash_dir(&self) -> PathBuf {
        self.meta_dir.join(TRASH_DIR)
    }

    pub fn ignore_file(&self) -> PathBuf {
        self.root.join(IGNORE_FILE)
    }

    pub fn index_file(&self) -> PathBuf {
        self.meta_dir.join(format!("{}.json", INDEX_KEY))
    }

    pub fn config_file(&self) -> PathBuf {
        self.meta_dir.join(format!("{}.json", CONFIG_KEY))
    }

    /// Where the archive for `id` lives.
    pub fn archive_path(&self, id: &SnapshotId) -> PathBuf {
        self.snapshots_dir()
            .join(format!("{}{}", id.as_str(), ARCHIVE_EXTENSION))
    }

    /// Index persistence for this repository.
    pub fn index_store(&self) -> IndexStore<JsonStorage> {
        IndexStore::new(self.storage.clone())
    }

    /// Load the index, failing if the repository was never initialized.
    pub fn load_index(&self) -> SnapshotResult<SnapshotIndex> {
        self.index_store()
            .load()?
            .ok_or_else(|| SnapshotError::NotInitialized(self.root.clone()))
    }

    pub fn save_index(&self, index: &SnapshotIndex) -> SnapshotResult<()> {
        self.index_store().save(index)
    }

    /// Load the configuration, writing defaults if none exists yet.
    pub fn config(&self) -> SnapshotResult<RepoConfig> {
        let config = match self.storage.read::<RepoConfig>(&[CONFIG_KEY])? {
            Some(config) => config,
            None => {
                let config = RepoConfig::default();
                self.save_config(&config)?;
                debug!(path = %self.config_file().display(), "Wrote default config");
                config
            }
        };
        config.validate()?;
        Ok(config)
    }

    pub fn save_config(&self, config: &RepoConfig) -> SnapshotResult<()> {
        config.validate()?;
        self.storage.write(&[CONFIG_KEY], config)?;
        Ok(())
    }

    /// Ignore patterns in effect: ignore file, auto-ignore, metadata rule.
    pub fn ignore_patterns(&self) -> SnapshotResult<IgnoreMatcher> {
        let config = self.config()?;
        self.ignore_matcher(&config)
    }

    pub fn ignore_matcher(&self, config: &RepoConfig) -> SnapshotResult<IgnoreMatcher> {
        IgnoreMatcher::load(&self.ignore_file(), config)
    }

    /// Overwrite the branch label, returning the previous one.
    pub fn set_label(&self, name: &str) -> SnapshotResult<String> {
        let mut index = self.load_index()?;
        let previous = std::mem::replace(&mut index.current, name.to_string());
        self.save_index(&index)?;
        info!(from = %previous, to = %name, "Label changed");
        Ok(previous)
    }

    pub fn current_label(&self) -> SnapshotResult<String> {
        Ok(self.load_index()?.current)
    }

    /// Inspect the layout without failing on damage.
    pub fn diagnose(&self) -> Diagnostics {
        let mut diag = Diagnostics {
            root: self.root.clone(),
            meta_dir: self.meta_dir.clone(),
            has_meta_dir: self.meta_dir.is_dir(),
            has_index: self.index_file().is_file(),
            has_snapshots_dir: self.snapshots_dir().is_dir(),
            has_config: self.config_file().is_file(),
            has_ignore_file: self.ignore_file().is_file(),
            has_trash_dir: self.trash_dir().is_dir(),
            ..Default::default()
        };

        if let Ok(entries) = fs::read_dir(self.snapshots_dir()) {
            for entry in entries.flatten() {
                let name = entry.file_name().to_string_lossy().into_owned();
                if name.ends_with(ARCHIVE_EXTENSION) {
                    diag.archives.push(name);
                } else {
                    diag.other_files.push(name);
                }
            }
        }
        diag.archives.sort();
        diag.other_files.sort();

        match self.index_store().load() {
            Ok(Some(index)) => {
                for record in index.iter() {
                    let present = self.archive_path(&record.id).is_file();
                    if !present {
                        diag.missing_archives.push(record.id.clone());
                    }
                    diag.records.push(RecordCheck {
                        id: record.id.clone(),
                        message: record.message.clone(),
                        archive_present: present,
                    });
                }
                diag.orphaned_archives = diag
                    .archives
                    .iter()
                    .filter(|name| {
                        let stem = name.strip_suffix(ARCHIVE_EXTENSION).unwrap_or(name);
                        !index.contains(&SnapshotId::from(stem))
                    })
                    .cloned()
                    .collect();
                diag.current_label = Some(index.current);
            }
            Ok(None) => {}
            Err(e) => diag.index_error = Some(e.to_string()),
        }

        if diag.has_config {
            match self.storage.read::<RepoConfig>(&[CONFIG_KEY]) {
                Ok(config) => diag.config = config,
                Err(e) => diag.config_error = Some(e.to_string()),
            }
        }

        diag
    }
}

/// Index entry as seen by [`Repository::diagnose`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordCheck {
    pub id: SnapshotId,
    pub message: String,
    pub archive_present: bool,
}

/// Health report on a repository layout.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    pub root: PathBuf,
    pub meta_dir: PathBuf,
    pub has_meta_dir: bool,
    pub has_index: bool,
    pub has_snapshots_dir: bool,
    pub has_config: bool,
    pub has_ignore_file: bool,
    pub has_trash_dir: bool,
    /// Archive file names under `snapshots/`.
    pub archives: Vec<String>,
    /// Anything else under `snapshots/`, e.g. leftover staging files.
    pub other_files: Vec<String>,
    pub records: Vec<RecordCheck>,
    pub current_label: Option<String>,
    /// Indexed snapshots whose archive is gone.
    pub missing_archives: Vec<SnapshotId>,
    /// Archives no index entry refers to.
    pub orphaned_archives: Vec<String>,
    pub config: Option<RepoConfig>,
    pub index_error: Option<String>,
    pub config_error: Option<String>,
}

impl Diagnostics {
    /// True when the layout is complete and index and archives agree.
    pub fn is_healthy(&self) -> bool {
        self.has_meta_dir
            && self.has_index
            && self.has_snapshots_dir
            && self.index_error.is_none()
            && self.config_error.is_none()
            && self.missing_archives.is_empty()
    }
}
