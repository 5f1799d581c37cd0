//! Batch deduplication.
//!
//! The feed reports every change event, so one record edited twice in a
//! window arrives twice. Aggregation recomputes cells from the current
//! source rows, so only the first occurrence of an id matters; the
//! terminal cursor still has to reflect the whole batch or replays
//! would refetch the collapsed tail.

use finsum_core::{ChangeCursor, ChangeRecord};
use std::collections::HashSet;

/// Result of collapsing one change batch.
#[derive(Debug, Clone)]
pub struct DedupOutcome {
    /// Distinct affected ids, in first-occurrence order.
    pub distinct_ids: Vec<i64>,

    /// Cursor of the last item-level record in the batch, duplicates
    /// included. `None` when the batch held no item-level change.
    pub terminal_cursor: Option<ChangeCursor>,

    /// Every record the feed returned, item-level or not.
    pub retrieved: u32,
}

/// Collapse a change batch into distinct affected ids plus the batch's
/// terminal cursor.
///
/// Iterates in arrival order. Item-level changes enter `distinct_ids`
/// on first occurrence; duplicates are logged and dropped. Structural
/// and alert-level changes count toward `retrieved` but are never
/// resolved.
pub fn dedup_batch(records: &[ChangeRecord]) -> DedupOutcome {
    let mut seen: HashSet<i64> = HashSet::new();
    let mut distinct_ids = Vec::new();
    let mut terminal_cursor = None;
    let mut retrieved = 0u32;

    for record in records {
        retrieved += 1;
        if record.kind.is_item_level() {
            terminal_cursor = Some(record.cursor.clone());
            if seen.insert(record.affected_id) {
                distinct_ids.push(record.affected_id);
                tracing::debug!(
                    "item change received: kind={}, cursor={}, id={}",
                    record.kind,
                    record.cursor,
                    record.affected_id
                );
            } else {
                tracing::info!(
                    "duplicate {} for item {} collapsed",
                    record.kind,
                    record.affected_id
                );
            }
        } else {
            tracing::warn!(
                "structural change received, will not be processed: kind={}, cursor={}",
                record.kind,
                record.cursor
            );
        }
    }

    DedupOutcome {
        distinct_ids,
        terminal_cursor,
        retrieved,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use finsum_core::ChangeKind;

    fn change(id: i64, kind: ChangeKind, seq: i64) -> ChangeRecord {
        ChangeRecord {
            affected_id: id,
            kind,
            cursor: ChangeCursor {
                format_version: 1,
                scope_kind: 3,
                scope_id: "list-a".into(),
                timestamp_ticks: 636_000_000_000_000_000 + seq,
                sequence_number: seq,
            },
        }
    }

    #[test]
    fn collapses_duplicates_keeps_order() {
        let batch = vec![
            change(1, ChangeKind::Add, 1),
            change(2, ChangeKind::Update, 2),
            change(1, ChangeKind::Update, 3),
            change(3, ChangeKind::Add, 4),
        ];
        let outcome = dedup_batch(&batch);
        assert_eq!(outcome.distinct_ids, vec![1, 2, 3]);
        assert_eq!(outcome.retrieved, 4);
        assert_eq!(outcome.terminal_cursor.unwrap().sequence_number, 4);
    }

    #[test]
    fn terminal_cursor_tracks_duplicates_too() {
        let batch = vec![change(5, ChangeKind::Add, 10), change(5, ChangeKind::Update, 11)];
        let outcome = dedup_batch(&batch);
        assert_eq!(outcome.distinct_ids, vec![5]);
        // The duplicate still moves the terminal cursor: progress covers
        // the whole batch, not just distinct items.
        assert_eq!(outcome.terminal_cursor.unwrap().sequence_number, 11);
    }

    #[test]
    fn alerts_counted_but_not_resolved() {
        let batch = vec![
            change(1, ChangeKind::Add, 1),
            change(99, ChangeKind::Alert, 2),
        ];
        let outcome = dedup_batch(&batch);
        assert_eq!(outcome.distinct_ids, vec![1]);
        assert_eq!(outcome.retrieved, 2);
        // Alert at the tail does not move the terminal cursor.
        assert_eq!(outcome.terminal_cursor.unwrap().sequence_number, 1);
    }

    #[test]
    fn empty_batch() {
        let outcome = dedup_batch(&[]);
        assert!(outcome.distinct_ids.is_empty());
        assert!(outcome.terminal_cursor.is_none());
        assert_eq!(outcome.retrieved, 0);
    }

    #[test]
    fn replaying_a_batch_converges() {
        let batch = vec![
            change(1, ChangeKind::Add, 1),
            change(2, ChangeKind::Add, 2),
        ];
        let mut doubled = batch.clone();
        doubled.extend(batch.clone());
        let outcome = dedup_batch(&doubled);
        assert_eq!(outcome.distinct_ids, vec![1, 2]);
        assert_eq!(
            outcome.terminal_cursor.unwrap().sequence_number,
            dedup_batch(&batch).terminal_cursor.unwrap().sequence_number
        );
    }
}
