//! Snapshot command handlers.
//!
//! Handles creating, listing, showing, restoring, comparing and deleting
//! snapshots.

use anyhow::bail;
use chrono::{DateTime, Duration, FixedOffset, Local};
use snapvault_snapshot::{
    DiffEngine, DiffReport, IdResolver, Repository, SnapshotEngine, SnapshotRecord,
};
use std::path::Path;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Status output lists at most this many files when there is no snapshot yet.
const FIRST_SNAPSHOT_PREVIEW: usize = 10;

/// Creation time of a record for display.
fn display_time(record: &SnapshotRecord) -> String {
    record
        .created()
        .map(|t| t.format(TIME_FORMAT).to_string())
        .unwrap_or_else(|| record.created_at.clone())
}

/// Human description of how long ago `then` was.
pub fn relative_time(then: DateTime<FixedOffset>, now: DateTime<Local>) -> String {
    let elapsed = now.signed_duration_since(then);
    if elapsed < Duration::hours(1) {
        "a few minutes ago".to_string()
    } else if elapsed < Duration::hours(24) {
        let hours = elapsed.num_hours();
        format!("{} hour{} ago", hours, plural(hours))
    } else if elapsed < Duration::days(7) {
        let days = elapsed.num_days();
        format!("{} day{} ago", days, plural(days))
    } else {
        then.format("%d %b %Y").to_string()
    }
}

fn plural(n: i64) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

/// Create a snapshot, initializing the repository on first use.
pub fn handle_snapshot(root: &Path, message: &str) -> anyhow::Result<()> {
    if message.trim().is_empty() {
        bail!("Snapshot message must not be empty");
    }

    let repo = Repository::at(root);
    let record = SnapshotEngine::new(&repo).create(message)?;
    println!("Snapshot created: {}", record.id);
    println!("Files: {}", record.file_count);
    println!("Hash: {}", record.content_hash);
    Ok(())
}

pub fn handle_list(root: &Path) -> anyhow::Result<()> {
    let repo = Repository::open(root)?;
    let snapshots = SnapshotEngine::new(&repo).list()?;

    if snapshots.is_empty() {
        println!("No snapshots found.");
        println!("Use 'snapvault snapshot -m <message>' to create the first one.");
        return Ok(());
    }

    println!("Snapshots:");
    println!();
    println!("  {:<30} {:<20} {:>6}  {}", "ID", "CREATED", "FILES", "MESSAGE");
    println!("{}", "-".repeat(80));

    let last = snapshots.len() - 1;
    for (i, record) in snapshots.iter().enumerate() {
        let marker = if i == last { '*' } else { ' ' };
        let message = if record.message.chars().count() > 40 {
            let short: String = record.message.chars().take(37).collect();
            format!("{short}...")
        } else {
            record.message.clone()
        };
        println!(
            "{} {:<30} {:<20} {:>6}  {}",
            marker,
            record.id,
            display_time(record),
            record.file_count,
            message
        );
    }
    Ok(())
}

pub fn handle_show(root: &Path, id: &str) -> anyhow::Result<()> {
    let repo = Repository::open(root)?;
    let record = SnapshotEngine::new(&repo).show(id)?;

    println!("Snapshot: {}", record.id);
    println!("Created: {}", display_time(&record));
    println!("Hash: {}", record.content_hash);
    println!("Files: {}", record.file_count);
    println!("Message: {}", record.message);
    if !record.files.is_empty() {
        println!();
        for file in &record.files {
            println!("  {file}");
        }
    }
    Ok(())
}

pub fn handle_restore(root: &Path, id: &str, force: bool) -> anyhow::Result<()> {
    let repo = Repository::open(root)?;
    let outcome = SnapshotEngine::new(&repo).restore(id, force)?;

    if outcome.degraded {
        println!("Only one snapshot exists, restoring {}", outcome.id);
    }
    if let Some(backup) = &outcome.backup {
        println!("Backup snapshot: {}", backup.id);
    }
    if let Some(trash) = &outcome.trash {
        println!("Moved {} file(s) to trash batch {}", trash.moved, trash.batch);
        for failure in &trash.failed {
            println!("  not moved: {} ({})", failure.path, failure.error);
        }
    }
    if let Some(error) = &outcome.trash_error {
        println!("Warning: could not move current files to trash: {error}");
    }

    println!(
        "Restored {} file(s) from {} to {}",
        outcome.files_restored,
        outcome.id,
        outcome.target.display()
    );
    if !outcome.forced {
        println!("Use 'snapvault restore {} --force' to overwrite the working tree.", id);
    }
    Ok(())
}

pub fn handle_diff(root: &Path, a: &str, b: &str) -> anyhow::Result<()> {
    let repo = Repository::open(root)?;
    let index = repo.load_index()?;

    let resolver = IdResolver::new(&index);
    for symbol in [a, b] {
        let resolution = resolver.resolve(symbol);
        if resolution.degraded {
            println!("Only one snapshot exists, {} resolves to {}", symbol, resolution.id);
        }
    }

    match DiffEngine::new(&index).diff(a, b)? {
        DiffReport::Same { id } => {
            println!("Both references name the same snapshot: {id}");
        }
        DiffReport::Changes(diff) => {
            println!("Comparing {} -> {}", diff.older.id, diff.newer.id);
            println!("  older: {} ({})", diff.older.message, diff.older.created_at);
            println!("  newer: {} ({})", diff.newer.message, diff.newer.created_at);
            println!();

            if diff.is_empty() {
                println!("No files added or removed.");
            }
            if !diff.added.is_empty() {
                println!("Added ({}):", diff.added.len());
                for file in &diff.added {
                    println!("  + {file}");
                }
            }
            if !diff.removed.is_empty() {
                println!("Removed ({}):", diff.removed.len());
                for file in &diff.removed {
                    println!("  - {file}");
                }
            }
            println!("Possibly modified: {}", diff.possibly_modified);
        }
    }
    Ok(())
}

pub fn handle_status(root: &Path) -> anyhow::Result<()> {
    let repo = Repository::open(root)?;
    let status = SnapshotEngine::new(&repo).status()?;

    println!("Repository: {}", repo.root().display());
    println!("Branch: {}", status.label);

    let Some(latest) = &status.latest else {
        println!("No snapshots yet.");
        println!();
        println!("Files ready for first snapshot: {}", status.current.len());
        for file in status.current.iter().take(FIRST_SNAPSHOT_PREVIEW) {
            println!("  {file}");
        }
        if status.current.len() > FIRST_SNAPSHOT_PREVIEW {
            println!(
                "  ... showing {} of {}",
                FIRST_SNAPSHOT_PREVIEW,
                status.current.len()
            );
        }
        return Ok(());
    };

    println!("Latest snapshot: {} ({})", latest.id, display_time(latest));
    println!("Message: {}", latest.message);
    println!();

    if status.is_clean() {
        println!("No new or missing files.");
        return Ok(());
    }
    if !status.untracked.is_empty() {
        println!("New files:");
        for file in &status.untracked {
            println!("  {file}");
        }
    }
    if !status.missing.is_empty() {
        println!("Missing files:");
        for file in &status.missing {
            println!("  {file}");
        }
    }
    Ok(())
}

pub fn handle_history(root: &Path) -> anyhow::Result<()> {
    let repo = Repository::open(root)?;
    let snapshots = SnapshotEngine::new(&repo).list()?;

    if snapshots.is_empty() {
        println!("No snapshot history.");
        return Ok(());
    }

    let now = Local::now();
    for (i, record) in snapshots.iter().rev().enumerate() {
        if i > 0 {
            println!();
        }
        let when = record
            .created()
            .map(|t| relative_time(t, now))
            .unwrap_or_else(|| record.created_at.clone());
        println!("[{}]", record.id);
        println!("  {} | {} file(s)", when, record.file_count);
        println!("  {}", record.message);
    }
    Ok(())
}

pub fn handle_clean(root: &Path) -> anyhow::Result<()> {
    let repo = Repository::open(root)?;
    let limit = repo.config()?.max_snapshots;
    let evicted = SnapshotEngine::new(&repo).clean()?;

    if evicted.is_empty() {
        let count = repo.load_index()?.len();
        if limit == 0 {
            println!("{count} snapshot(s), no retention limit.");
        } else {
            println!("{count} snapshot(s) within limit of {limit}.");
        }
        return Ok(());
    }

    for id in &evicted {
        println!("Removed: {id}");
    }
    println!("Cleaned {} snapshot(s).", evicted.len());
    Ok(())
}

pub fn handle_delete(root: &Path, id: &str) -> anyhow::Result<()> {
    let repo = Repository::open(root)?;
    let record = SnapshotEngine::new(&repo).delete(id)?;
    println!("Snapshot deleted: {}", record.id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ago(now: DateTime<Local>, duration: Duration) -> DateTime<FixedOffset> {
        DateTime::<FixedOffset>::from(now - duration)
    }

    #[test]
    fn test_relative_time_buckets() {
        let now = Local.with_ymd_and_hms(2025, 3, 20, 12, 0, 0).unwrap();

        assert_eq!(
            relative_time(ago(now, Duration::minutes(5)), now),
            "a few minutes ago"
        );
        assert_eq!(relative_time(ago(now, Duration::hours(1)), now), "1 hour ago");
        assert_eq!(relative_time(ago(now, Duration::hours(5)), now), "5 hours ago");
        assert_eq!(relative_time(ago(now, Duration::days(1)), now), "1 day ago");
        assert_eq!(relative_time(ago(now, Duration::days(6)), now), "6 days ago");
        assert_eq!(
            relative_time(ago(now, Duration::days(30)), now),
            "18 Feb 2025"
        );
    }
}
