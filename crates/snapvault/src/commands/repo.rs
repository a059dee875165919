//! Repository-level handlers: init, config and debug.

use snapvault_snapshot::Repository;
use std::path::Path;

/// Create a repository at `root`. Fails with `AlreadyInitialized` if one
/// exists, which `main` reports without failing.
pub fn handle_init(root: &Path) -> anyhow::Result<()> {
    let repo = Repository::init(root)?;
    println!("Initialized snapvault repository in {}", repo.meta_dir().display());
    println!("Ignore rules: {}", repo.ignore_file().display());
    Ok(())
}

/// Print the effective configuration.
pub fn handle_config(root: &Path) -> anyhow::Result<()> {
    let repo = Repository::open(root)?;
    let config = repo.config()?;

    println!("Configuration ({})", repo.config_file().display());
    println!();
    println!("{:<20} {}", "version", config.version);
    println!("{:<20} {}", "compression_level", config.compression_level);
    let max = if config.max_snapshots == 0 {
        "unlimited".to_string()
    } else {
        config.max_snapshots.to_string()
    };
    println!("{:<20} {}", "max_snapshots", max);
    println!("{:<20} {} MB (unused)", "chunk_size_mb", config.chunk_size_mb);
    println!("{:<20} {} (unused)", "use_delta", config.use_delta);
    println!("{:<20} {}", "enable_aliases", config.enable_aliases);
    println!("{:<20} {}", "enable_trash", config.enable_trash);
    println!("{:<20} {}", "external_sync", config.external_sync);
    println!();
    println!("auto_ignore:");
    for pattern in &config.auto_ignore {
        println!("  {pattern}");
    }
    Ok(())
}

/// Print a layout and consistency report. Works on damaged repositories.
pub fn handle_debug(root: &Path) -> anyhow::Result<()> {
    let repo = Repository::at(root);
    let diag = repo.diagnose();

    let flag = |present: bool| if present { "ok" } else { "MISSING" };

    println!("Root: {}", diag.root.display());
    println!("Metadata: {}", diag.meta_dir.display());
    println!();
    println!("{:<20} {}", "metadata dir", flag(diag.has_meta_dir));
    println!("{:<20} {}", "index", flag(diag.has_index));
    println!("{:<20} {}", "snapshots dir", flag(diag.has_snapshots_dir));
    println!("{:<20} {}", "config", flag(diag.has_config));
    println!("{:<20} {}", "ignore file", flag(diag.has_ignore_file));
    println!("{:<20} {}", "trash dir", flag(diag.has_trash_dir));

    if let Some(error) = &diag.index_error {
        println!("Index error: {error}");
    }
    if let Some(error) = &diag.config_error {
        println!("Config error: {error}");
    }
    if let Some(label) = &diag.current_label {
        println!("Branch: {label}");
    }

    println!();
    println!("Archives: {}", diag.archives.len());
    for name in &diag.other_files {
        println!("  unexpected file: {name}");
    }

    if !diag.records.is_empty() {
        println!();
        println!("Indexed snapshots: {}", diag.records.len());
        for record in &diag.records {
            let archive = if record.archive_present {
                "archive ok"
            } else {
                "archive MISSING"
            };
            println!("  {} [{}] {}", record.id, archive, record.message);
        }
    }
    for name in &diag.orphaned_archives {
        println!("Orphaned archive: {name}");
    }

    println!();
    if diag.is_healthy() {
        println!("Repository is healthy.");
    } else if !diag.has_meta_dir {
        println!("No repository here. Use 'snapvault init' to create one.");
    } else {
        println!("Repository has problems, see above.");
    }
    Ok(())
}
