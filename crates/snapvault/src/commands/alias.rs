//! Short command aliases.
//!
//! Aliases are rewritten in the raw argument list before clap sees it, and
//! only when the repository's `enable_aliases` setting allows it.

use snapvault_snapshot::{RepoConfig, Repository};
use std::path::{Path, PathBuf};

const ALIASES: &[(&str, &str)] = &[
    ("s", "snapshot"),
    ("l", "list"),
    ("sh", "show"),
    ("r", "restore"),
    ("d", "diff"),
    ("st", "status"),
    ("log", "history"),
    ("c", "clean"),
    ("b", "branch"),
    ("sw", "switch"),
    ("t", "trash"),
];

/// Full command name for an alias.
pub fn lookup_alias(alias: &str) -> Option<&'static str> {
    ALIASES
        .iter()
        .find(|(short, _)| *short == alias)
        .map(|(_, full)| *full)
}

/// Index of the subcommand in `args`, skipping the program name and any
/// global flags in front of it.
pub fn command_position(args: &[String]) -> Option<usize> {
    let mut i = 1;
    while i < args.len() {
        let arg = args[i].as_str();
        match arg {
            "-C" | "--dir" | "--log-file" => i += 2,
            _ if arg.starts_with('-') => i += 1,
            _ => return Some(i),
        }
    }
    None
}

/// Value of `-C`/`--dir` if it appears before the subcommand.
pub fn dir_override(args: &[String]) -> Option<PathBuf> {
    let end = command_position(args).unwrap_or(args.len());
    let mut i = 1;
    while i < end {
        let arg = args[i].as_str();
        if arg == "-C" || arg == "--dir" {
            return args.get(i + 1).map(PathBuf::from);
        }
        if let Some(value) = arg.strip_prefix("--dir=") {
            return Some(PathBuf::from(value));
        }
        if let Some(value) = arg.strip_prefix("-C").filter(|v| !v.is_empty()) {
            return Some(PathBuf::from(value));
        }
        i += 1;
    }
    None
}

/// Replace an alias in command position with its full name.
pub fn expand(mut args: Vec<String>, enabled: bool) -> Vec<String> {
    if !enabled {
        return args;
    }
    if let Some(position) = command_position(&args) {
        if let Some(full) = lookup_alias(&args[position]) {
            args[position] = full.to_string();
        }
    }
    args
}

/// Read `enable_aliases` without creating a config file. A missing or
/// unreadable config falls back to the default.
pub fn aliases_enabled(root: &Path) -> bool {
    let path = Repository::at(root).config_file();
    std::fs::read_to_string(path)
        .ok()
        .and_then(|content| serde_json::from_str::<RepoConfig>(&content).ok())
        .unwrap_or_default()
        .enable_aliases
}
