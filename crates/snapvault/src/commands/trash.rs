//! Trash command handlers.
//!
//! Handles listing, emptying and restoring trash batches.

use clap::Subcommand;
use snapvault_snapshot::{Repository, TrashStore};
use std::io::{self, BufRead, Write};
use std::path::Path;

/// Trash subcommands.
#[derive(Subcommand, Default)]
pub enum TrashCommands {
    /// List trash batches
    #[default]
    List,
    /// Delete every trash batch
    Empty {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Move a batch's files back into the working tree
    Restore {
        /// Batch name, as shown by `trash list`
        batch: String,
    },
}

/// Handle trash commands.
pub fn handle_trash(command: TrashCommands, root: &Path) -> anyhow::Result<()> {
    let repo = Repository::open(root)?;
    let trash = TrashStore::new(&repo);

    match command {
        TrashCommands::List => {
            let batches = trash.list()?;
            if batches.is_empty() {
                println!("Trash is empty.");
                return Ok(());
            }

            println!("Trash:");
            println!();
            println!("{:<40} {:>6}  {:<20}", "BATCH", "FILES", "MODIFIED");
            println!("{}", "-".repeat(70));
            for batch in batches {
                let modified = batch
                    .modified
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_default();
                println!("{:<40} {:>6}  {:<20}", batch.name, batch.file_count, modified);
            }
            println!();
            println!("Use 'snapvault trash restore <batch>' to restore files.");
        }
        TrashCommands::Empty { yes } => {
            if trash.list()?.is_empty() {
                println!("Trash is already empty.");
                return Ok(());
            }
            if !yes && !confirm("Permanently delete every trash batch?")? {
                println!("Cancelled.");
                return Ok(());
            }
            let removed = trash.empty_all()?;
            println!("Emptied trash ({removed} batch(es) deleted)");
        }
        TrashCommands::Restore { batch } => {
            let report = trash.restore_batch(&batch)?;
            for path in &report.restored {
                println!("  restored: {path}");
            }
            for failure in &report.failed {
                println!("  failed: {} ({})", failure.path, failure.error);
            }
            println!(
                "Restored {} file(s) from {}",
                report.restored.len(),
                report.batch
            );
            if !report.batch_removed {
                println!("Batch kept because some files could not be restored.");
            }
        }
    }

    Ok(())
}

/// Ask a yes/no question on stdin. Anything but `y` or `yes` is a no.
fn confirm(question: &str) -> io::Result<bool> {
    print!("{question} [y/N]: ");
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_lowercase().as_str(),
        "y" | "yes"
    ))
}
