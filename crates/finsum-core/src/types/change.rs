use crate::cursor::ChangeCursor;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of change reported by the feed.
///
/// `Add` and `Update` are item-level content changes; `Alert` covers
/// structural and alert-level changes, which are logged and dropped by
/// the deduplicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
    Add,
    Update,
    Alert,
}

impl ChangeKind {
    /// Whether this change affects the content of a single item.
    pub fn is_item_level(&self) -> bool {
        matches!(self, ChangeKind::Add | ChangeKind::Update)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Add => "add",
            ChangeKind::Update => "update",
            ChangeKind::Alert => "alert",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "add" => Some(ChangeKind::Add),
            "update" => Some(ChangeKind::Update),
            "alert" => Some(ChangeKind::Alert),
            _ => None,
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry in the change feed, in arrival order. Ephemeral; consumed
/// within a single run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub affected_id: i64,
    pub kind: ChangeKind,
    pub cursor: ChangeCursor,
}
