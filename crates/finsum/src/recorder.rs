//! Run history recording.
//!
//! The history append is the only point at which the checkpoint moves
//! forward. If it fails, the run fails closed and the next invocation
//! reprocesses the same batch, which full-rescan aggregation makes safe.

use chrono::{DateTime, Utc};
use finsum_core::{ChangeCursor, FinsumError, HistoryStore, Result, RunHistoryEntry};

/// Append one run's statistics and ending cursor.
#[allow(clippy::too_many_arguments)]
pub fn record_run<H: HistoryStore>(
    store: &H,
    process_name: &str,
    items_retrieved: u32,
    items_processed: u32,
    started_at: DateTime<Utc>,
    ended_at: DateTime<Utc>,
    ending_cursor: &ChangeCursor,
) -> Result<RunHistoryEntry> {
    let entry = RunHistoryEntry {
        process_name: process_name.to_string(),
        items_retrieved,
        items_processed,
        started_at,
        ended_at,
        ending_cursor: ending_cursor.encode(),
    };

    store
        .append(&entry)
        .map_err(|e| FinsumError::HistoryWrite(e.to_string()))?;

    tracing::info!(
        "run recorded: process={}, retrieved={}, processed={}, cursor={}",
        entry.process_name,
        entry.items_retrieved,
        entry.items_processed,
        entry.ending_cursor
    );

    Ok(entry)
}
