//! Git pass-through commands.
//!
//! `sync`, `save`, `back` and `share` hand off to `git` in the repository
//! root. They only run when `external_sync` is enabled in the configuration.

use anyhow::{bail, Context};
use snapvault_snapshot::Repository;
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// A git operation to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncCommand {
    /// `git pull origin main`
    Sync,
    /// `git commit -am <message>`
    Save { message: String },
    /// `git checkout <reference>`
    Back { reference: String },
    /// `git push origin main`
    Share,
}

impl SyncCommand {
    /// Arguments passed to `git`.
    pub fn git_args(&self) -> Vec<String> {
        let args: Vec<&str> = match self {
            SyncCommand::Sync => vec!["pull", "origin", "main"],
            SyncCommand::Save { message } => vec!["commit", "-am", message.as_str()],
            SyncCommand::Back { reference } => vec!["checkout", reference.as_str()],
            SyncCommand::Share => vec!["push", "origin", "main"],
        };
        args.into_iter().map(String::from).collect()
    }
}

pub fn handle_sync(command: SyncCommand, root: &Path) -> anyhow::Result<()> {
    let repo = Repository::open(root)?;
    let config = repo.config()?;
    if !config.external_sync {
        bail!(
            "Git mode is disabled; set \"external_sync\": true in {}",
            repo.config_file().display()
        );
    }

    let args = command.git_args();
    println!("[git] git {}", args.join(" "));
    debug!(root = %root.display(), ?args, "Running git");

    let status = Command::new("git")
        .args(&args)
        .current_dir(root)
        .status()
        .context("Failed to run git; is it installed and on PATH?")?;

    if !status.success() {
        bail!("git {} failed ({status})", args[0]);
    }
    Ok(())
}
