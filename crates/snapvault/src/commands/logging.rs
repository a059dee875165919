//! Logging initialization.

use snapvault_util::log::{self, LogConfig, LogLevel};
use std::path::PathBuf;

/// Initialize logging: warnings by default, debug output with `--verbose`.
/// `RUST_LOG` overrides both. Output goes to stderr, or is appended to
/// `file` when one is given.
pub fn init_logging(verbose: bool, file: Option<PathBuf>) {
    let level = if verbose {
        LogLevel::Debug
    } else {
        LogLevel::Warn
    };

    let config = LogConfig {
        print: true,
        level,
        include_location: verbose,
        file,
    };

    if let Err(e) = log::init(config) {
        eprintln!("Warning: Could not initialize logging: {e}");
    }
}
