use crate::cursor::ChangeCursor;
use crate::error::Result;
use crate::types::ChangeRecord;

/// Change feed client: given a cursor and a scope, returns an ordered
/// batch of change records.
///
/// Contract:
/// - Records arrive in cursor order, at most `limit` per call.
/// - The newest cursor in a batch advances monotonically per scope: the
///   feed never yields a record with an earlier `(timestamp, sequence)`
///   than one already committed for the same scope.
/// - Transient server-side throttling is the implementation's problem
///   to surface as an error; retry lives in the caller's wrapper.
pub trait ChangeFeed: Send + Sync {
    fn fetch_changes(
        &self,
        scope_id: &str,
        start: &ChangeCursor,
        limit: usize,
    ) -> Result<Vec<ChangeRecord>>;
}
