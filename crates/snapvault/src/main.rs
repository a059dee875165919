//! snapvault - snapshot-based local version control.
//!
//! Captures the non-ignored files of a directory tree as compressed
//! snapshots under `.snapvault/`, and restores, compares and lists them.

mod commands;

use clap::{Parser, Subcommand};
use commands::*;
use snapvault_snapshot::{ErrorKind, Repository};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Parser)]
#[command(name = "snapvault")]
#[command(author, version, about = "Snapshot-based local version control", long_about = None)]
struct Cli {
    /// Repository root (default: nearest enclosing repository, else the current directory)
    #[arg(short = 'C', long = "dir", global = true)]
    dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Append logs to this file instead of stderr
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a repository
    Init,

    /// Capture the working tree as a new snapshot
    Snapshot {
        /// Snapshot message
        #[arg(short, long)]
        message: String,
    },

    /// List snapshots, oldest first
    List,

    /// Show snapshot details
    Show {
        /// Snapshot ID, HEAD or PREV
        id: String,
    },

    /// Restore a snapshot into `_restore_<id>`, or over the working tree with --force
    Restore {
        /// Snapshot ID, HEAD or PREV
        id: String,

        /// Overwrite the working tree (current files are backed up and moved to trash)
        #[arg(short, long)]
        force: bool,
    },

    /// Compare the file sets of two snapshots
    Diff {
        /// First snapshot (ID, HEAD or PREV)
        a: String,
        /// Second snapshot (ID, HEAD or PREV)
        b: String,
    },

    /// Compare the working tree with the latest snapshot
    Status,

    /// Snapshot history, newest first
    History,

    /// Apply the retention limit now
    Clean,

    /// Delete a snapshot and its archive
    Delete {
        /// Snapshot ID, HEAD or PREV
        id: String,
    },

    /// Show the current branch label, or set a new one
    Branch {
        /// New branch label
        name: Option<String>,
    },

    /// Switch the branch label
    Switch {
        /// Branch label
        name: String,
    },

    /// Show the effective configuration
    Config,

    /// Manage trash batches
    Trash {
        #[command(subcommand)]
        command: Option<TrashCommands>,
    },

    /// Pull from the git remote (requires external_sync)
    Sync,

    /// Commit tracked changes with git (requires external_sync)
    Save {
        /// Commit message
        message: String,
    },

    /// Check out a git revision (requires external_sync)
    Back {
        /// Git revision
        reference: String,
    },

    /// Push to the git remote (requires external_sync)
    Share,

    /// Print repository diagnostics
    Debug,

    /// Print version information
    Version,
}

fn main() -> anyhow::Result<()> {
    let args = std::env::args().collect::<Vec<_>>();
    let args = expand_aliases(args);
    let cli = Cli::parse_from(args);

    init_logging(cli.verbose, cli.log_file.clone());

    let cwd = std::env::current_dir()?;
    let root = resolve_root(cli.dir.as_deref(), &cwd);
    debug!(root = %root.display(), "Resolved repository root");

    match cli.command {
        Commands::Init => {
            // Initialization never walks up to an enclosing repository
            let target = cli.dir.unwrap_or(cwd);
            match handle_init(&target) {
                Err(e) if already_initialized(&e) => {
                    println!("{e}");
                    Ok(())
                }
                other => other,
            }
        }
        Commands::Snapshot { message } => handle_snapshot(&root, &message),
        Commands::List => handle_list(&root),
        Commands::Show { id } => handle_show(&root, &id),
        Commands::Restore { id, force } => handle_restore(&root, &id, force),
        Commands::Diff { a, b } => handle_diff(&root, &a, &b),
        Commands::Status => handle_status(&root),
        Commands::History => handle_history(&root),
        Commands::Clean => handle_clean(&root),
        Commands::Delete { id } => handle_delete(&root, &id),
        Commands::Branch { name } => handle_branch(&root, name.as_deref()),
        Commands::Switch { name } => handle_switch(&root, &name),
        Commands::Config => handle_config(&root),
        Commands::Trash { command } => handle_trash(command.unwrap_or_default(), &root),
        Commands::Sync => handle_sync(SyncCommand::Sync, &root),
        Commands::Save { message } => handle_sync(SyncCommand::Save { message }, &root),
        Commands::Back { reference } => handle_sync(SyncCommand::Back { reference }, &root),
        Commands::Share => handle_sync(SyncCommand::Share, &root),
        Commands::Debug => handle_debug(&root),
        Commands::Version => {
            println!("snapvault {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Pick the repository root: `--dir` when given, else the nearest enclosing
/// repository, else the current directory.
fn resolve_root(dir: Option<&Path>, cwd: &Path) -> PathBuf {
    match dir {
        Some(dir) => dir.to_path_buf(),
        None => Repository::discover(cwd).unwrap_or_else(|| cwd.to_path_buf()),
    }
}

fn already_initialized(err: &anyhow::Error) -> bool {
    err.downcast_ref::<snapvault_snapshot::SnapshotError>()
        .is_some_and(|e| e.kind() == ErrorKind::AlreadyExists)
}

/// Rewrite a leading command alias, if the repository allows aliases.
fn expand_aliases(args: Vec<String>) -> Vec<String> {
    let Some(position) = command_position(&args) else {
        return args;
    };
    if lookup_alias(&args[position]).is_none() {
        return args;
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let root = resolve_root(dir_override(&args).as_deref(), &cwd);
    expand(args, aliases_enabled(&root))
}
