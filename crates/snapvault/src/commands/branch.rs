//! Branch label handlers.
//!
//! A branch is a single label stored in the index. Switching it does not
//! touch snapshots or the working tree.

use anyhow::bail;
use snapvault_snapshot::Repository;
use std::path::Path;

/// Show the current label, or set a new one.
pub fn handle_branch(root: &Path, name: Option<&str>) -> anyhow::Result<()> {
    let repo = Repository::open(root)?;

    let Some(name) = name else {
        println!("Branches:");
        println!("* {} (current)", repo.current_label()?);
        println!();
        println!("Use 'snapvault branch <name>' to create a new branch.");
        return Ok(());
    };

    if name.trim().is_empty() {
        bail!("Branch name must not be empty");
    }
    repo.set_label(name)?;
    println!("Branch '{name}' created and selected");
    Ok(())
}

pub fn handle_switch(root: &Path, name: &str) -> anyhow::Result<()> {
    let repo = Repository::open(root)?;
    let previous = repo.set_label(name)?;
    println!("Switched from '{previous}' to '{name}'");
    Ok(())
}
