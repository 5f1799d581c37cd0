//! Finsum Core: Types and traits for the expense change reconciler
//!
//! This crate defines the core abstractions for a batch-polling
//! reconciler that consumes an external change feed and maintains
//! derived expense aggregates:
//! - Change cursor: opaque, totally-ordered checkpoint into the feed
//! - Store traits: change feed, source records, aggregates, run history
//! - Typed measures: months, phases, and plan columns addressed by
//!   enum rather than by string field name
//!
//! Key properties:
//! - At-least-once tolerant: aggregates are always recomputed from the
//!   current source rows, never incremented
//! - Checkpoint as sole resume point: the newest run-history entry
//!   carries the cursor the next run starts from

pub mod config;
pub mod cursor;
pub mod error;
pub mod notification;
pub mod traits;
pub mod types;

pub use config::{ProcessorConfig, RetryConfig, FETCH_LIMIT_MAX};
pub use cursor::{ChangeCursor, TICKS_PER_MILLISECOND, TICKS_PER_SECOND};
pub use error::{FinsumError, Result};
pub use notification::ChangeNotification;
pub use traits::{AggregateStore, ChangeFeed, HistoryStore, RecordStore};
pub use types::{
    AggregateKey, AggregateRecord, AggregateScope, ChangeKind, ChangeRecord, LookupRef,
    MeasureSet, Month, Phase, RunHistoryEntry, SourceRecord,
};
