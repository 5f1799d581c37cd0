//! Finsum: change processor for derived expense aggregates.
//!
//! One invocation per inbound notification: load the checkpoint cursor,
//! fetch the change batch, collapse duplicates, resolve each distinct
//! record, recompute the affected aggregate cells from the live sibling
//! set, upsert them, and append a run-history entry carrying the
//! advanced cursor.
//!
//! The pipeline is idempotent under at-least-once delivery: every cell
//! value is a pure function of the current source rows, so replaying a
//! batch converges to the same aggregates. There is no cross-invocation
//! locking; the caller must serialize runs per scope
//! (single-consumer-per-queue-partition upstream).

pub mod aggregator;
pub mod dedup;
pub mod processor;
pub mod recorder;
pub mod resolver;
pub mod retry;
pub mod upsert;

pub use aggregator::{recompute_cell, CellUpdate};
pub use dedup::{dedup_batch, DedupOutcome};
pub use processor::{ChangeProcessor, RunStats};
pub use resolver::{resolve_records, ResolvedBatch};
pub use retry::RetryingFeed;
