//! Change processor: one notification, one run.
//!
//! Run flow: load the checkpoint cursor (or synthesize a fallback for a
//! first run), fetch the change batch, collapse duplicates, resolve each
//! distinct record, recompute and upsert the affected cells, and append
//! a run-history entry whose cursor sits one epsilon past the batch's
//! terminal change.
//!
//! Fatal errors (malformed cursor, feed exhaustion, history write)
//! propagate to the caller, which redelivers under the at-least-once
//! contract. Per-item and per-cell errors are absorbed and reflected
//! only in the run statistics.

use crate::aggregator::recompute_cell;
use crate::dedup::dedup_batch;
use crate::recorder::record_run;
use crate::resolver::resolve_records;
use crate::upsert::upsert_cell;
use chrono::{Duration, Utc};
use finsum_core::{
    AggregateStore, ChangeCursor, ChangeFeed, ChangeNotification, HistoryStore, Phase,
    ProcessorConfig, RecordStore, Result, FETCH_LIMIT_MAX,
};
use std::sync::Arc;
use std::time::Instant;

/// Statistics for one completed run.
#[derive(Debug, Clone)]
pub struct RunStats {
    pub items_retrieved: u32,
    pub items_processed: u32,
    pub cells_failed: u32,
    pub duration: std::time::Duration,
    /// Cursor committed to history; `None` when the notification was
    /// rejected before a run started.
    pub ending_cursor: Option<String>,
}

impl RunStats {
    fn rejected() -> Self {
        Self {
            items_retrieved: 0,
            items_processed: 0,
            cells_failed: 0,
            duration: std::time::Duration::from_secs(0),
            ending_cursor: None,
        }
    }
}

/// Processor: consumes change notifications and maintains the derived
/// aggregate rows.
///
/// Holds no state between runs; the checkpoint lives in the history
/// store. Provides no mutual exclusion across concurrent runs for the
/// same scope — the caller must serialize invocations per scope, or two
/// runs can both read the same starting cursor and the later history
/// write silently wins.
pub struct ChangeProcessor<F, R, A, H>
where
    F: ChangeFeed,
    R: RecordStore,
    A: AggregateStore,
    H: HistoryStore,
{
    feed: Arc<F>,
    records: Arc<R>,
    aggregates: Arc<A>,
    history: Arc<H>,
    config: ProcessorConfig,
}

impl<F, R, A, H> ChangeProcessor<F, R, A, H>
where
    F: ChangeFeed,
    R: RecordStore,
    A: AggregateStore,
    H: HistoryStore,
{
    pub fn new(
        feed: Arc<F>,
        records: Arc<R>,
        aggregates: Arc<A>,
        history: Arc<H>,
        config: ProcessorConfig,
    ) -> Self {
        Self {
            feed,
            records,
            aggregates,
            history,
            config,
        }
    }

    /// Process one inbound notification.
    pub fn process(&self, notification: &ChangeNotification) -> Result<RunStats> {
        let started_at = Utc::now();
        let timer = Instant::now();

        let Some(phase) = Phase::from_collection(&notification.collection_id) else {
            tracing::error!(
                "notified collection {:?} does not map to a known phase; \
                 this processor has likely been attached to the wrong collection",
                notification.collection_id
            );
            return Ok(RunStats::rejected());
        };

        tracing::info!(
            "processing notification: collection={:?}, scope={}, phase={}",
            notification.collection_id,
            notification.resource_id,
            phase
        );

        // Checkpoint load. A malformed stored cursor is fatal before any
        // fetch happens.
        let start_cursor = match self.history.last_cursor(&self.config.process_name)? {
            Some(stored) => {
                let cursor = ChangeCursor::decode(&stored)?;
                tracing::info!("history cursor retrieved: {}", cursor);
                cursor
            }
            None => {
                let cursor = ChangeCursor::fallback(
                    &notification.resource_id,
                    Duration::seconds(self.config.fallback_lookback_secs as i64),
                    started_at,
                );
                tracing::info!("no history cursor found, initializing to {}", cursor);
                cursor
            }
        };

        let limit = self.config.fetch_limit.min(FETCH_LIMIT_MAX);
        let changes = self
            .feed
            .fetch_changes(&notification.resource_id, &start_cursor, limit)?;
        tracing::info!("feed returned {} change(s)", changes.len());

        let outcome = dedup_batch(&changes);
        let resolved = resolve_records(
            self.records.as_ref(),
            &outcome.distinct_ids,
            &self.config.category_filter,
        );

        let mut items_processed = 0u32;
        let mut cells_failed = 0u32;
        for record in &resolved.records {
            let update = match recompute_cell(
                self.records.as_ref(),
                record,
                phase,
                &self.config.category_filter,
            ) {
                Ok(update) => update,
                Err(e) => {
                    tracing::error!("cell recompute failed for item {}: {}", record.id, e);
                    cells_failed += 1;
                    continue;
                }
            };
            match upsert_cell(self.aggregates.as_ref(), &update) {
                Ok(()) => items_processed += 1,
                Err(e) => {
                    tracing::error!("{}", e);
                    cells_failed += 1;
                }
            }
        }

        // The checkpoint only moves here. Terminal cursor advanced one
        // epsilon so the last consumed change is excluded from the next
        // fetch; an empty batch re-commits the starting cursor untouched.
        let ending_cursor = match &outcome.terminal_cursor {
            Some(terminal) => terminal.advance(self.config.advance_epsilon_ms),
            None => start_cursor.clone(),
        };

        record_run(
            self.history.as_ref(),
            &self.config.process_name,
            outcome.retrieved,
            items_processed,
            started_at,
            Utc::now(),
            &ending_cursor,
        )?;

        Ok(RunStats {
            items_retrieved: outcome.retrieved,
            items_processed,
            cells_failed,
            duration: timer.elapsed(),
            ending_cursor: Some(ending_cursor.encode()),
        })
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }
}
