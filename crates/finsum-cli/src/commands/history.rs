//! History command implementation

use anyhow::{Context, Result};
use finsum_sqlite::SqliteStore;
use std::path::PathBuf;

pub fn execute(db_path: PathBuf, limit: usize) -> Result<()> {
    let store = SqliteStore::open(&db_path).context("Failed to open database")?;
    let entries = store
        .list_history(limit)
        .context("Failed to read run history")?;

    if entries.is_empty() {
        println!("No runs recorded yet");
        return Ok(());
    }

    println!(
        "{:<32} {:>9} {:>9}  {:<25} {}",
        "PROCESS", "RETRIEVED", "PROCESSED", "ENDED", "ENDING CURSOR"
    );
    for entry in entries {
        println!(
            "{:<32} {:>9} {:>9}  {:<25} {}",
            entry.process_name,
            entry.items_retrieved,
            entry.items_processed,
            entry.ended_at.to_rfc3339(),
            entry.ending_cursor
        );
    }

    Ok(())
}
