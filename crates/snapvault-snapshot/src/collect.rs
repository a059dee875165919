//! Working tree traversal.

use crate::ignore::IgnoreMatcher;
use crate::repository::METADATA_DIR;
use crate::SnapshotResult;
use snapvault_util::path::relative_slash;
use snapvault_util::TimingGuard;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Produces the sorted list of snapshottable files under a root.
pub struct FileCollector<'a> {
    root: PathBuf,
    matcher: &'a IgnoreMatcher,
}

impl<'a> FileCollector<'a> {
    /// Create a collector for `root`.
    pub fn new(root: impl Into<PathBuf>, matcher: &'a IgnoreMatcher) -> Self {
        Self {
            root: root.into(),
            matcher,
        }
    }

    /// Walk the tree and return root-relative, slash-separated paths in
    /// lexicographic order.
    ///
    /// Symlinks are neither followed nor collected. Ignored directories are
    /// pruned without being descended, as are entries whose names are not
    /// valid UTF-8.
    pub fn collect(&self) -> SnapshotResult<Vec<String>> {
        let _timing = TimingGuard::collect(self.root.display().to_string());
        let mut files = Vec::new();

        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| self.keep(entry));

        for entry in walker {
            let entry = entry?;
            if entry.file_type().is_dir() {
                continue;
            }
            if entry.path_is_symlink() {
                debug!(path = %entry.path().display(), "Skipping symlink");
                continue;
            }
            if let Some(rel) = relative_slash(entry.path(), &self.root) {
                files.push(rel);
            }
        }

        files.sort();
        debug!(root = %self.root.display(), count = files.len(), "Collected files");
        Ok(files)
    }

    fn keep(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 {
            return true;
        }
        // Slash-form paths are strings; a lossy name would point nowhere
        if entry.file_name().to_str().is_none() {
            warn!(path = %entry.path().display(), "Skipping path that is not valid UTF-8");
            return false;
        }
        let Some(rel) = relative_slash(entry.path(), &self.root) else {
            return true;
        };

        if entry.file_type().is_dir() && rel.rsplit('/').next() == Some(METADATA_DIR) {
            return false;
        }
        if self.matcher.is_ignored(&rel) {
            debug!(path = %rel, "Ignored");
            return false;
        }
        true
    }
}

/// Collect the files under `root` that `matcher` does not exclude.
pub fn collect_files(root: &Path, matcher: &IgnoreMatcher) -> SnapshotResult<Vec<String>> {
    FileCollector::new(root, matcher).collect()
}
