//! Cell recomputation.
//!
//! An aggregate cell is always derived from a live scoped query over the
//! source rows, never by adding a delta to the previous value. The cell
//! is a pure function of the current sibling set, which keeps the
//! pipeline idempotent and order-independent under at-least-once
//! delivery. Incremental accumulation would need exactly-once semantics
//! this system does not have.

use finsum_core::{
    AggregateKey, AggregateScope, MeasureSet, Phase, RecordStore, Result, SourceRecord,
};

/// Freshly recomputed measures for one aggregate cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellUpdate {
    pub key: AggregateKey,
    pub phase: Phase,
    pub measures: MeasureSet,
}

/// Recompute the full cell value for a changed record.
///
/// Re-queries every sibling in the record's grouping scope
/// `(fiscal_year, company, cost_center)` matching the same GL account
/// and category, and sums all fourteen measure columns across the set.
pub fn recompute_cell<R: RecordStore>(
    store: &R,
    record: &SourceRecord,
    phase: Phase,
    category: &str,
) -> Result<CellUpdate> {
    let scope = AggregateScope::of(record);
    let siblings = store.query_scope(&scope, record.gl_account.id, category)?;

    let mut measures = MeasureSet::zero();
    for sibling in &siblings {
        measures.accumulate(&sibling.measures);
    }

    tracing::debug!(
        "recomputed cell {} ({}) from {} sibling row(s)",
        AggregateKey::of(record),
        phase,
        siblings.len()
    );

    Ok(CellUpdate {
        key: AggregateKey::of(record),
        phase,
        measures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use finsum_core::{LookupRef, Month};

    struct ScopeStore {
        rows: Vec<SourceRecord>,
    }

    impl RecordStore for ScopeStore {
        fn get_by_id(&self, id: i64) -> Result<Option<SourceRecord>> {
            Ok(self.rows.iter().find(|r| r.id == id).cloned())
        }

        fn query_scope(
            &self,
            scope: &AggregateScope,
            gl_account_id: i64,
            category: &str,
        ) -> Result<Vec<SourceRecord>> {
            Ok(self
                .rows
                .iter()
                .filter(|r| {
                    AggregateScope::of(r) == *scope
                        && r.gl_account.id == gl_account_id
                        && r.category == category
                })
                .cloned()
                .collect())
        }
    }

    fn row(id: i64, gl: i64, jan: i64, feb: i64) -> SourceRecord {
        let mut measures = MeasureSet::zero();
        measures[Month::Jan] = jan;
        measures[Month::Feb] = feb;
        measures.plan_next = 1;
        SourceRecord {
            id,
            category: "IT".into(),
            company: LookupRef::new(7, "0070"),
            cost_center: LookupRef::new(3, "0003"),
            gl_account: LookupRef::new(gl, "6500"),
            fiscal_year: 2024,
            measures,
        }
    }

    #[test]
    fn sums_full_sibling_set() {
        let store = ScopeStore {
            rows: vec![row(1, 9, 100, 0), row(2, 9, 0, 50), row(3, 8, 999, 999)],
        };
        let update = recompute_cell(&store, &row(1, 9, 100, 0), Phase::Actual, "IT").unwrap();
        assert_eq!(update.measures[Month::Jan], 100);
        assert_eq!(update.measures[Month::Feb], 50);
        assert_eq!(update.measures.plan_next, 2);
        assert_eq!(
            update.key,
            AggregateKey {
                company_id: 7,
                cost_center_id: 3,
                gl_account_id: 9,
                fiscal_year: 2024
            }
        );
    }

    #[test]
    fn recomputation_is_idempotent() {
        let store = ScopeStore {
            rows: vec![row(1, 9, 10, 20), row(2, 9, 30, 40)],
        };
        let changed = row(2, 9, 30, 40);
        let first = recompute_cell(&store, &changed, Phase::Preliminary, "IT").unwrap();
        let second = recompute_cell(&store, &changed, Phase::Preliminary, "IT").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn two_records_in_one_cell_agree() {
        let store = ScopeStore {
            rows: vec![row(1, 9, 10, 0), row(2, 9, 20, 0)],
        };
        let via_first = recompute_cell(&store, &row(1, 9, 10, 0), Phase::Final, "IT").unwrap();
        let via_second = recompute_cell(&store, &row(2, 9, 20, 0), Phase::Final, "IT").unwrap();
        assert_eq!(via_first, via_second);
    }

    #[test]
    fn category_filter_bounds_the_sibling_set() {
        let mut other = row(4, 9, 1000, 0);
        other.category = "Facilities".into();
        let store = ScopeStore {
            rows: vec![row(1, 9, 100, 0), other],
        };
        let update = recompute_cell(&store, &row(1, 9, 100, 0), Phase::Actual, "IT").unwrap();
        assert_eq!(update.measures[Month::Jan], 100);
    }
}
