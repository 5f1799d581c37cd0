use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FinsumError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("malformed change cursor: {0}")]
    MalformedCursor(String),

    #[error("change feed unavailable: {0}")]
    FeedUnavailable(String),

    #[error("record fetch failed for item {id}: {reason}")]
    RecordFetch { id: i64, reason: String },

    #[error("aggregate persist failed for cell {key}: {reason}")]
    CellPersist { key: String, reason: String },

    #[error("run history write failed: {0}")]
    HistoryWrite(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl FinsumError {
    /// Whether the error aborts the whole run.
    ///
    /// Recoverable errors (`RecordFetch`, `CellPersist`) are absorbed at
    /// item/cell granularity and only show up in run statistics. Everything
    /// else fails the run before the checkpoint moves, which is safe: the
    /// next invocation replays the same batch.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            FinsumError::RecordFetch { .. } | FinsumError::CellPersist { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, FinsumError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_and_persist_failures_are_recoverable() {
        let fetch = FinsumError::RecordFetch {
            id: 42,
            reason: "server error".into(),
        };
        let persist = FinsumError::CellPersist {
            key: "7/3/9/2024".into(),
            reason: "disk full".into(),
        };
        assert!(!fetch.is_fatal());
        assert!(!persist.is_fatal());
    }

    #[test]
    fn cursor_and_feed_failures_are_fatal() {
        assert!(FinsumError::MalformedCursor("x".into()).is_fatal());
        assert!(FinsumError::FeedUnavailable("throttled".into()).is_fatal());
        assert!(FinsumError::HistoryWrite("locked".into()).is_fatal());
    }
}
