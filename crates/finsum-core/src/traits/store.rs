use crate::error::Result;
use crate::types::{
    AggregateKey, AggregateRecord, AggregateScope, RunHistoryEntry, SourceRecord,
};

/// External record store holding the full source rows.
pub trait RecordStore: Send + Sync {
    /// Fetch one record by id. `Ok(None)` when the id no longer exists.
    fn get_by_id(&self, id: i64) -> Result<Option<SourceRecord>>;

    /// Every record in the grouping scope matching the GL account and
    /// category. This is the sibling set an aggregate cell is recomputed
    /// from.
    fn query_scope(
        &self,
        scope: &AggregateScope,
        gl_account_id: i64,
        category: &str,
    ) -> Result<Vec<SourceRecord>>;
}

/// Store owning the aggregate rows.
pub trait AggregateStore: Send + Sync {
    /// Exact-match lookup on all four key fields.
    fn find_by_key(&self, key: &AggregateKey) -> Result<Option<AggregateRecord>>;

    /// Create the row if absent, otherwise overwrite its measure
    /// columns. Rows are never deleted by this system.
    fn upsert(&self, record: &AggregateRecord) -> Result<()>;
}

/// Append-only run history; doubles as the cursor checkpoint store.
pub trait HistoryStore: Send + Sync {
    /// Ending cursor of the newest entry for `process_name`, if any.
    fn last_cursor(&self, process_name: &str) -> Result<Option<String>>;

    /// Append one run's statistics and ending cursor. The only point at
    /// which the checkpoint moves forward.
    fn append(&self, entry: &RunHistoryEntry) -> Result<()>;
}
