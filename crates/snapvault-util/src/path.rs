//! Path utilities.
//!
//! Snapshot file lists store paths as root-relative strings with forward
//! slashes regardless of platform. These helpers convert between that form
//! and native paths.

use std::path::{Component, Path, PathBuf};

/// Render a relative path with `/` separators.
pub fn to_slash(path: &Path) -> String {
    let mut out = String::new();
    for component in path.components() {
        if let Component::Normal(part) = component {
            if !out.is_empty() {
                out.push('/');
            }
            out.push_str(&part.to_string_lossy());
        }
    }
    out
}

/// Make a path relative to a base directory, in slash form.
///
/// Returns `None` if the path is not within the base directory, or if it is
/// the base directory itself.
pub fn relative_slash(path: &Path, base: &Path) -> Option<String> {
    let rel = path.strip_prefix(base).ok()?;
    let rendered = to_slash(rel);
    if rendered.is_empty() {
        None
    } else {
        Some(rendered)
    }
}

/// Check that a slash-form path only descends: no root, no `.`, no `..`.
///
/// Used before joining untrusted relative paths (archive entries, batch
/// names) onto a target directory.
pub fn is_descending(path: &str) -> bool {
    !path.is_empty()
        && Path::new(path)
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
}

/// Join a slash-form relative path onto a base directory.
pub fn join_slash(base: &Path, relative: &str) -> PathBuf {
    let mut out = base.to_path_buf();
    for part in relative.split('/').filter(|p| !p.is_empty()) {
        out.push(part);
    }
    out
}

/// Normalize a path by removing `.` and `..` components.
///
/// Unlike `canonicalize`, this doesn't require the path to exist.
pub fn normalize(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();

    for component in path.components() {
        match component {
            Component::ParentDir => {
                result.pop();
            }
            Component::CurDir => {}
            _ => {
                result.push(component);
            }
        }
    }

    result
}

/// Find the nearest ancestor of `start` (inclusive) that contains `marker`.
///
/// `marker` is a relative path such as `.snapvault/index.json`.
pub fn find_root_with(start: &Path, marker: &Path) -> Option<PathBuf> {
    let mut current = normalize(start);

    loop {
        if current.join(marker).exists() {
            return Some(current);
        }

        if !current.pop() {
            return None;
        }
    }
}
