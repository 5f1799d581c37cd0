//! Source record resolution.
//!
//! Fetches the full record for each distinct changed id and applies the
//! category filter. A fetch failure for one id never aborts the batch;
//! the id is logged and skipped, and the count mismatch shows up in the
//! integrity log.

use finsum_core::{RecordStore, SourceRecord};

/// Records accepted for aggregation, plus the attempted/accepted counts
/// for the integrity log.
#[derive(Debug, Clone)]
pub struct ResolvedBatch {
    pub records: Vec<SourceRecord>,
    pub attempted: u32,
    pub accepted: u32,
}

/// Resolve each id against the record store, keeping only records in
/// `category`.
///
/// Per-item failures (missing id, server error) are recoverable: logged
/// with the id and skipped. Category mismatches are silent drops, not
/// errors.
pub fn resolve_records<R: RecordStore>(
    store: &R,
    ids: &[i64],
    category: &str,
) -> ResolvedBatch {
    let mut records = Vec::new();
    let attempted = ids.len() as u32;

    for &id in ids {
        match store.get_by_id(id) {
            Ok(Some(record)) => {
                if record.category == category {
                    records.push(record);
                } else {
                    tracing::debug!(
                        "item {} dropped: category {:?} does not match filter {:?}",
                        id,
                        record.category,
                        category
                    );
                }
            }
            Ok(None) => {
                tracing::warn!("item {} no longer exists in the record store, skipping", id);
            }
            Err(e) => {
                tracing::warn!("fetch failed for item {}, skipping: {}", id, e);
            }
        }
    }

    let accepted = records.len() as u32;
    if accepted == attempted {
        tracing::info!(
            "{} id(s) passed for record lookup, {} record(s) accepted",
            attempted,
            accepted
        );
    } else {
        tracing::warn!(
            "{} id(s) passed for record lookup, {} record(s) accepted",
            attempted,
            accepted
        );
    }

    ResolvedBatch {
        records,
        attempted,
        accepted,
    }
}
