//! Snapshot archives: gzip-compressed tar files.
//!
//! One entry per file, in file-list order, carrying the root-relative path,
//! the source file's mode, size and mtime, and its bytes. Archives are staged
//! next to their destination and renamed into place, so a reader never sees
//! a partially written archive.

use crate::{SnapshotError, SnapshotResult};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use snapvault_util::path::{is_descending, join_slash, to_slash};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tar::{Archive, Builder, Header};
use tracing::debug;

type Decoder = GzDecoder<BufReader<File>>;

/// Result of publishing an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSummary {
    /// Final location of the archive.
    pub path: PathBuf,
    /// Number of entries written.
    pub entry_count: usize,
    /// Compressed size on disk.
    pub size_bytes: u64,
}

/// One file inside an archive, readable as a byte stream.
pub struct ArchiveEntry<'a> {
    path: String,
    inner: tar::Entry<'a, Decoder>,
}

impl ArchiveEntry<'_> {
    /// Root-relative, slash-separated path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Permission bits recorded for the file, if readable.
    pub fn mode(&self) -> Option<u32> {
        self.inner.header().mode().ok()
    }

    /// Size recorded in the entry header.
    pub fn size(&self) -> u64 {
        self.inner.header().size().unwrap_or(0)
    }
}

impl Read for ArchiveEntry<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

/// Encodes file lists into archives and decodes them back.
#[derive(Debug, Clone, Copy)]
pub struct ArchiveCodec {
    compression_level: u32,
}

impl Default for ArchiveCodec {
    fn default() -> Self {
        Self::new(6)
    }
}

impl ArchiveCodec {
    /// Create a codec with a gzip level; values above 9 are clamped.
    pub fn new(compression_level: u32) -> Self {
        Self {
            compression_level: compression_level.min(crate::config::MAX_COMPRESSION_LEVEL),
        }
    }

    /// Archive `files` (relative to `root`) into `destination`.
    ///
    /// Nothing is published unless every file was read: on failure the
    /// staging file is removed and `destination` is left untouched.
    pub fn write(
        &self,
        root: &Path,
        destination: &Path,
        files: &[String],
    ) -> SnapshotResult<ArchiveSummary> {
        if let Some(parent) = destination.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| SnapshotError::io_at(parent, e))?;
            }
        }

        let staging = staging_path(destination);
        match self.write_inner(root, &staging, files) {
            Ok(entry_count) => {
                fs::rename(&staging, destination)
                    .map_err(|e| SnapshotError::io_at(destination, e))?;
                let size_bytes = fs::metadata(destination)
                    .map_err(|e| SnapshotError::io_at(destination, e))?
                    .len();
                debug!(path = %destination.display(), entry_count, size_bytes, "Archive written");
                Ok(ArchiveSummary {
                    path: destination.to_path_buf(),
                    entry_count,
                    size_bytes,
                })
            }
            Err(e) => {
                let _ = fs::remove_file(&staging);
                Err(e)
            }
        }
    }

    fn write_inner(&self, root: &Path, staging: &Path, files: &[String]) -> SnapshotResult<usize> {
        let file = File::create(staging).map_err(|e| SnapshotError::io_at(staging, e))?;
        let encoder = GzEncoder::new(
            BufWriter::new(file),
            Compression::new(self.compression_level),
        );
        let mut builder = Builder::new(encoder);

        for rel in files {
            let source = join_slash(root, rel);
            let mut input = File::open(&source).map_err(|e| SnapshotError::io_at(&source, e))?;
            let metadata = input
                .metadata()
                .map_err(|e| SnapshotError::io_at(&source, e))?;

            let mut header = Header::new_gnu();
            header.set_metadata(&metadata);
            builder
                .append_data(&mut header, rel, &mut input)
                .map_err(|e| SnapshotError::io_at(&source, e))?;
            debug!(path = %rel, size = metadata.len(), "Archived");
        }

        let encoder = builder
            .into_inner()
            .map_err(|e| SnapshotError::io_at(staging, e))?;
        let writer = encoder
            .finish()
            .map_err(|e| SnapshotError::io_at(staging, e))?;
        let file = writer
            .into_inner()
            .map_err(|e| SnapshotError::io_at(staging, e.into_error()))?;
        file.sync_all()
            .map_err(|e| SnapshotError::io_at(staging, e))?;

        Ok(files.len())
    }

    /// Call `visit` for every entry in archive order.
    ///
    /// Returns the number of file entries visited. Decoding failures and
    /// unsafe entry paths are reported as `Corrupt`.
    pub fn visit<F>(&self, archive: &Path, mut visit: F) -> SnapshotResult<usize>
    where
        F: FnMut(&mut ArchiveEntry<'_>) -> SnapshotResult<()>,
    {
        let file = File::open(archive).map_err(|e| SnapshotError::io_at(archive, e))?;
        let mut tar = Archive::new(GzDecoder::new(BufReader::new(file)));
        let entries = tar
            .entries()
            .map_err(|e| SnapshotError::corrupt(archive, e.to_string()))?;

        let mut count = 0;
        for entry in entries {
            let entry = entry.map_err(|e| SnapshotError::corrupt(archive, e.to_string()))?;
            if entry.header().entry_type().is_dir() {
                continue;
            }

            let (path, raw) = {
                let path = entry
                    .path()
                    .map_err(|e| SnapshotError::corrupt(archive, e.to_string()))?;
                let raw = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
                (to_slash(&path), raw)
            };
            if !is_descending(&raw) || path.is_empty() {
                return Err(SnapshotError::corrupt(
                    archive,
                    format!("unsafe entry path: {}", raw),
                ));
            }

            visit(&mut ArchiveEntry { path, inner: entry })?;
            count += 1;
        }
        Ok(count)
    }

    /// Entry paths in archive order.
    pub fn list(&self, archive: &Path) -> SnapshotResult<Vec<String>> {
        let mut paths = Vec::new();
        self.visit(archive, |entry| {
            paths.push(entry.path().to_string());
            Ok(())
        })?;
        Ok(paths)
    }

    /// Recreate every entry under `target_dir`, overwriting existing files.
    ///
    /// Extraction is not transactional: files written before a failure stay.
    pub fn extract(&self, archive: &Path, target_dir: &Path) -> SnapshotResult<usize> {
        self.visit(archive, |entry| {
            let destination = join_slash(target_dir, entry.path());
            if let Some(parent) = destination.parent() {
                fs::create_dir_all(parent).map_err(|e| SnapshotError::io_at(parent, e))?;
            }

            clear_destination(&destination)?;
            let mut output =
                File::create(&destination).map_err(|e| SnapshotError::io_at(&destination, e))?;
            copy_entry(archive, entry, &mut output, &destination)?;

            if let Some(mode) = entry.mode() {
                set_mode(&destination, mode)?;
            }

            debug!(path = %entry.path(), "Extracted");
            Ok(())
        })
    }
}

/// Unlink a file or symlink already at `destination`.
///
/// Restored modes can leave read-only files behind; unlinking needs only
/// write access to the directory, so a later extract still succeeds.
fn clear_destination(destination: &Path) -> SnapshotResult<()> {
    match fs::symlink_metadata(destination) {
        Ok(meta) if !meta.is_dir() => {
            fs::remove_file(destination).map_err(|e| SnapshotError::io_at(destination, e))
        }
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(SnapshotError::io_at(destination, e)),
    }
}

/// Copy an entry's bytes, blaming read failures on the archive and write
/// failures on the destination.
fn copy_entry(
    archive: &Path,
    entry: &mut ArchiveEntry<'_>,
    output: &mut File,
    destination: &Path,
) -> SnapshotResult<()> {
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = entry
            .read(&mut buf)
            .map_err(|e| SnapshotError::corrupt(archive, e.to_string()))?;
        if n == 0 {
            return Ok(());
        }
        output
            .write_all(&buf[..n])
            .map_err(|e| SnapshotError::io_at(destination, e))?;
    }
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> SnapshotResult<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o7777))
        .map_err(|e| SnapshotError::io_at(path, e))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> SnapshotResult<()> {
    Ok(())
}

fn staging_path(destination: &Path) -> PathBuf {
    let mut name = destination.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}
