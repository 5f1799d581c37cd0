use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One appended run-history row. The newest entry for a `process_name`
/// is the source of truth for the next run's starting cursor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunHistoryEntry {
    pub process_name: String,
    pub items_retrieved: u32,
    pub items_processed: u32,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub ending_cursor: String,
}
