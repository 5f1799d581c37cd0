//! Aggregate upsert.
//!
//! Find-or-create by exact key match, then overwrite only the target
//! phase's measure slots. The plan-column rule (Estimates never write
//! forward-plan values) and phase isolation live in
//! `AggregateRecord::apply_phase`.

use crate::aggregator::CellUpdate;
use finsum_core::{AggregateRecord, AggregateStore, FinsumError, Result};

/// Write one recomputed cell into the aggregate store.
///
/// Failures surface as `CellPersist` so the caller can absorb them at
/// cell granularity; a bad cell never blocks its siblings.
pub fn upsert_cell<A: AggregateStore>(store: &A, update: &CellUpdate) -> Result<()> {
    let mut row = match store.find_by_key(&update.key) {
        Ok(Some(existing)) => existing,
        Ok(None) => {
            tracing::info!("creating aggregate row for new key {}", update.key);
            AggregateRecord::new(update.key)
        }
        Err(e) => {
            return Err(FinsumError::CellPersist {
                key: update.key.to_string(),
                reason: format!("lookup failed: {}", e),
            })
        }
    };

    row.apply_phase(update.phase, &update.measures);

    store.upsert(&row).map_err(|e| FinsumError::CellPersist {
        key: update.key.to_string(),
        reason: e.to_string(),
    })
}
