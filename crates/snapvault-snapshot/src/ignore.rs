//! Ignore-pattern matching.
//!
//! Patterns come from the repository's `.snapvaultignore` file, then the
//! configured auto-ignore list, then the metadata rules which are always
//! present: the `.snapvault/` directory and the ignore file itself. A path is ignored if any pattern matches it under any of
//! these rules:
//!
//! - `dir/`: the path starts with `dir/`, or one of its segments is `dir`
//! - contains `*`: glob match against the final segment or the whole path
//! - `*suffix`: the path ends with `suffix`
//! - the final segment equals the pattern
//! - the path ends with the pattern

use crate::repository::{IGNORE_FILE, METADATA_DIR};
use crate::{RepoConfig, SnapshotError, SnapshotResult};
use glob::{MatchOptions, Pattern};
use std::fs;
use std::path::Path;

/// Contents written to a fresh `.snapvaultignore`.
pub const DEFAULT_IGNORE_FILE: &str = "\
# Files ignored by snapvault
# Common directories
node_modules/
build/
dist/
.snapvault/
.vscode/
.idea/
__pycache__/
*.pyc

# Binaries
*.exe
*.dll
*.so
*.dylib
*.bin

# Environment files
.env
.env.*
.secret*

# Logs and temporaries
*.log
*.tmp
*.temp
*.cache

# System files
Thumbs.db
.DS_Store
desktop.ini

# Backup files
*.bak
*.backup
*~
";

const GLOB_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Rules that keep repository metadata out of every snapshot.
fn metadata_rules() -> [String; 2] {
    [format!("{}/", METADATA_DIR), IGNORE_FILE.to_string()]
}

/// A loaded ignore pattern list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoreMatcher {
    patterns: Vec<String>,
}

impl IgnoreMatcher {
    /// Build a matcher from explicit patterns. The metadata rules are appended.
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut patterns: Vec<String> = patterns.into_iter().map(Into::into).collect();
        patterns.extend(metadata_rules());
        Self { patterns }
    }

    /// Load patterns from an ignore file plus the configured auto-ignore list.
    ///
    /// A missing ignore file contributes nothing.
    pub fn load(ignore_file: &Path, config: &RepoConfig) -> SnapshotResult<Self> {
        let mut patterns = match fs::read_to_string(ignore_file) {
            Ok(content) => parse_ignore_file(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(SnapshotError::io_at(ignore_file, e)),
        };
        patterns.extend(config.auto_ignore.iter().cloned());
        Ok(Self::new(patterns))
    }

    /// Every pattern in evaluation order, including the metadata rules.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Check whether a root-relative path is excluded.
    pub fn is_ignored(&self, relative_path: &str) -> bool {
        is_ignored(relative_path, &self.patterns)
    }
}

/// Split an ignore file into patterns, skipping blanks and `#` comments.
pub fn parse_ignore_file(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Check a root-relative path against a pattern list.
pub fn is_ignored<S: AsRef<str>>(relative_path: &str, patterns: &[S]) -> bool {
    let path = relative_path.replace('\\', "/");
    let base = path.rsplit('/').next().unwrap_or(&path);

    patterns.iter().any(|p| {
        let pattern = p.as_ref().trim().replace('\\', "/");
        !pattern.is_empty() && pattern_matches(&pattern, &path, base)
    })
}

fn pattern_matches(pattern: &str, path: &str, base: &str) -> bool {
    if let Some(dir) = pattern.strip_suffix('/') {
        return path.starts_with(pattern) || path.split('/').any(|segment| segment == dir);
    }

    if pattern.contains('*') && glob_matches(pattern, base, path) {
        return true;
    }

    if let Some(suffix) = pattern.strip_prefix('*') {
        if path.ends_with(suffix) {
            return true;
        }
    }

    base == pattern || path.ends_with(pattern)
}

fn glob_matches(pattern: &str, base: &str, path: &str) -> bool {
    match Pattern::new(pattern) {
        Ok(glob) => glob.matches_with(base, GLOB_OPTIONS) || glob.matches_with(path, GLOB_OPTIONS),
        // A malformed pattern never matches
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_list_ignores_only_metadata() {
        let matcher = IgnoreMatcher::new(Vec::<String>::new());
        assert!(matcher.is_ignored(".snapvault"));
        assert!(matcher.is_ignored(".snapvault/index.json"));
        assert!(matcher.is_ignored("nested/.snapvault/index.json"));
        assert!(matcher.is_ignored(".snapvaultignore"));
        assert!(!matcher.is_ignored("src/main.rs"));
        assert!(!matcher.is_ignored("a.txt"));
    }

    #[test]
    fn test_directory_pattern() {
        let patterns = ["node_modules/"];
        assert!(is_ignored("node_modules", &patterns));
        assert!(is_ignored("node_modules/pkg/index.js", &patterns));
        assert!(is_ignored("web/node_modules/pkg/index.js", &patterns));
        assert!(!is_ignored("my_node_modules/file.js", &patterns));
    }

    #[test]
    fn test_wildcard_matches_basename_and_path() {
        let patterns = ["*.log"];
        assert!(is_ignored("debug.log", &patterns));
        assert!(is_ignored("logs/debug.log", &patterns));
        assert!(!is_ignored("debug.log.txt", &patterns));

        let patterns = ["build/*.o"];
        assert!(is_ignored("build/main.o", &patterns));
        assert!(!is_ignored("build/sub/main.o", &patterns));
    }

    #[test]
    fn test_star_does_not_cross_separator() {
        let patterns = ["src*"];
        assert!(is_ignored("src_old", &patterns));
        assert!(!is_ignored("src/lib.rs", &patterns));
    }

    #[test]
    fn test_suffix_form_spans_segments() {
        let patterns = ["*cache/data.bin"];
        assert!(is_ignored("tmp/cache/data.bin", &patterns));
    }

    #[test]
    fn test_exact_basename_and_fallback_suffix() {
        let patterns = ["Thumbs.db"];
        assert!(is_ignored("photos/Thumbs.db", &patterns));
        assert!(!is_ignored("photos/Thumbs.dbx", &patterns));

        let patterns = [".env"];
        assert!(is_ignored(".env", &patterns));
        assert!(is_ignored("config/prod.env", &patterns));
    }

    #[test]
    fn test_blank_patterns_skipped() {
        let patterns = ["", "   "];
        assert!(!is_ignored("a.txt", &patterns));
    }

    #[test]
    fn test_invalid_glob_never_matches() {
        let patterns = ["[*"];
        assert!(!is_ignored("a.txt", &patterns));
    }

    #[test]
    fn test_restore_directories_auto_ignored() {
        let matcher = IgnoreMatcher::new(RepoConfig::default().auto_ignore);
        assert!(matcher.is_ignored("_restore_20250101-000000-aaaaaaaaaaaa"));
        assert!(!matcher.is_ignored("restore_notes.md"));
    }

    #[test]
    fn test_parse_ignore_file() {
        let parsed = parse_ignore_file("# comment\n\n  *.tmp  \nbuild/\n#another\n");
        assert_eq!(parsed, vec!["*.tmp".to_string(), "build/".to_string()]);
    }

    #[test]
    fn test_load_merges_file_config_and_metadata_rules() {
        let dir = tempfile::tempdir().unwrap();
        let ignore_file = dir.path().join(".snapvaultignore");
        fs::write(&ignore_file, "*.tmp\n").unwrap();

        let config = RepoConfig {
            auto_ignore: vec!["target/".to_string()],
            ..Default::default()
        };
        let matcher = IgnoreMatcher::load(&ignore_file, &config).unwrap();
        assert_eq!(
            matcher.patterns(),
            &[
                "*.tmp".to_string(),
                "target/".to_string(),
                ".snapvault/".to_string(),
                ".snapvaultignore".to_string()
            ]
        );
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let matcher = IgnoreMatcher::load(
            &dir.path().join(".snapvaultignore"),
            &RepoConfig {
                auto_ignore: vec![],
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(
            matcher.patterns(),
            &[".snapvault/".to_string(), ".snapvaultignore".to_string()]
        );
    }
}
