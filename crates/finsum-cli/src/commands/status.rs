//! Status command implementation

use anyhow::{Context, Result};
use finsum_core::{ChangeCursor, HistoryStore};
use finsum_sqlite::SqliteStore;
use std::path::PathBuf;

pub fn execute(db_path: PathBuf, process_name: String) -> Result<()> {
    let store = SqliteStore::open(&db_path).context("Failed to open database")?;

    println!("\nReconciler Status");
    println!("{}", "=".repeat(60));
    println!("Path: {}", db_path.display());
    println!("Process: {}", process_name);

    match store
        .last_cursor(&process_name)
        .context("Failed to read checkpoint")?
    {
        Some(raw) => match ChangeCursor::decode(&raw) {
            Ok(cursor) => {
                println!("\nCheckpoint:");
                println!("  Scope: {}", cursor.scope_id);
                println!("  Timestamp ticks: {}", cursor.timestamp_ticks);
                println!("  Sequence: {}", cursor.sequence_number);
                if let Ok(ts) = finsum_core::cursor::datetime_from_ticks(cursor.timestamp_ticks) {
                    println!("  Timestamp: {}", ts.to_rfc3339());
                }
            }
            Err(e) => println!("\n⚠️  Stored checkpoint is malformed: {}", e),
        },
        None => println!("\nNo checkpoint yet - next run starts from the fallback window"),
    }

    let aggregates = store
        .aggregate_count()
        .context("Failed to count aggregate rows")?;
    println!("\nAggregate rows: {}", aggregates);

    Ok(())
}
