use crate::types::measures::MeasureSet;
use crate::types::record::SourceRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One of the mutually exclusive versions of a measure coexisting on an
/// aggregate row. Derived from the collection a change notification
/// names.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Phase {
    Preliminary,
    Actual,
    Final,
    Estimate,
}

impl Phase {
    pub const ALL: [Phase; 4] = [
        Phase::Preliminary,
        Phase::Actual,
        Phase::Final,
        Phase::Estimate,
    ];

    /// Lowercase column suffix, e.g. `jan_actual`.
    pub fn column_suffix(&self) -> &'static str {
        match self {
            Phase::Preliminary => "preliminary",
            Phase::Actual => "actual",
            Phase::Final => "final",
            Phase::Estimate => "estimate",
        }
    }

    /// Whether this phase carries the two forward-plan columns.
    /// Estimates never do: no plan projection exists past the terminal
    /// phase.
    pub fn carries_plan(&self) -> bool {
        !matches!(self, Phase::Estimate)
    }

    /// Map a notified collection name to its phase. Comparison is
    /// case-insensitive, matching the upstream store's title matching.
    pub fn from_collection(collection: &str) -> Option<Self> {
        const TITLES: [(&str, Phase); 4] = [
            ("Expense Details Preliminary", Phase::Preliminary),
            ("Expense Details Actuals", Phase::Actual),
            ("Expense Details Final", Phase::Final),
            ("Expense Details Estimates", Phase::Estimate),
        ];
        TITLES
            .iter()
            .find(|(title, _)| title.eq_ignore_ascii_case(collection))
            .map(|(_, phase)| *phase)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_suffix())
    }
}

/// Grouping scope a changed record belongs to: every sibling record in
/// the same fiscal year, company, and cost center.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AggregateScope {
    pub fiscal_year: i32,
    pub company_id: i64,
    pub cost_center_id: i64,
}

impl AggregateScope {
    pub fn of(record: &SourceRecord) -> Self {
        Self {
            fiscal_year: record.fiscal_year,
            company_id: record.company.id,
            cost_center_id: record.cost_center.id,
        }
    }
}

/// Composite key uniquely identifying one aggregate row regardless of
/// phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AggregateKey {
    pub company_id: i64,
    pub cost_center_id: i64,
    pub gl_account_id: i64,
    pub fiscal_year: i32,
}

impl AggregateKey {
    pub fn of(record: &SourceRecord) -> Self {
        Self {
            company_id: record.company.id,
            cost_center_id: record.cost_center.id,
            gl_account_id: record.gl_account.id,
            fiscal_year: record.fiscal_year,
        }
    }
}

impl fmt::Display for AggregateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.company_id, self.cost_center_id, self.gl_account_id, self.fiscal_year
        )
    }
}

/// One aggregate row: phase-qualified measure slots keyed by
/// [`AggregateKey`]. Created lazily on the first relevant change and
/// never deleted by this system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateRecord {
    pub key: AggregateKey,
    cells: BTreeMap<Phase, MeasureSet>,
}

impl AggregateRecord {
    pub fn new(key: AggregateKey) -> Self {
        Self {
            key,
            cells: BTreeMap::new(),
        }
    }

    /// Overwrite one phase's slots with freshly recomputed measures.
    ///
    /// Writes the twelve monthly values always; the two forward-plan
    /// values only when the phase carries them. Slots belonging to other
    /// phases are never touched, and an Estimate write leaves that
    /// phase's existing plan values exactly as they were.
    pub fn apply_phase(&mut self, phase: Phase, measures: &MeasureSet) {
        let cell = self.cells.entry(phase).or_default();
        cell.monthly = measures.monthly;
        if phase.carries_plan() {
            cell.plan_next = measures.plan_next;
            cell.plan_after = measures.plan_after;
        }
    }

    /// Raw slot write, bypassing the plan-column rule. Intended for
    /// store backends rehydrating a persisted row.
    pub fn set_phase(&mut self, phase: Phase, measures: MeasureSet) {
        self.cells.insert(phase, measures);
    }

    /// The measure slots for a phase, zero if never written.
    pub fn phase(&self, phase: Phase) -> MeasureSet {
        self.cells.get(&phase).copied().unwrap_or_default()
    }

    /// Phases that have been written on this row.
    pub fn phases(&self) -> impl Iterator<Item = Phase> + '_ {
        self.cells.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::measures::Month;

    fn key() -> AggregateKey {
        AggregateKey {
            company_id: 7,
            cost_center_id: 3,
            gl_account_id: 9,
            fiscal_year: 2024,
        }
    }

    #[test]
    fn collection_mapping() {
        assert_eq!(
            Phase::from_collection("Expense Details Preliminary"),
            Some(Phase::Preliminary)
        );
        assert_eq!(
            Phase::from_collection("expense details actuals"),
            Some(Phase::Actual)
        );
        assert_eq!(Phase::from_collection("Webhook History"), None);
    }

    #[test]
    fn apply_phase_isolates_other_phases() {
        let mut row = AggregateRecord::new(key());
        let mut estimate = MeasureSet::zero();
        estimate[Month::Jan] = 11;
        row.apply_phase(Phase::Estimate, &estimate);

        let mut actual = MeasureSet::zero();
        actual[Month::Jan] = 99;
        actual.plan_next = 5;
        row.apply_phase(Phase::Actual, &actual);

        assert_eq!(row.phase(Phase::Estimate)[Month::Jan], 11);
        assert_eq!(row.phase(Phase::Actual)[Month::Jan], 99);
        assert_eq!(row.phase(Phase::Actual).plan_next, 5);
    }

    #[test]
    fn estimate_never_writes_plan_columns() {
        let mut row = AggregateRecord::new(key());
        let mut measures = MeasureSet::zero();
        measures[Month::Feb] = 50;
        measures.plan_next = 123;
        measures.plan_after = 456;
        row.apply_phase(Phase::Estimate, &measures);

        let cell = row.phase(Phase::Estimate);
        assert_eq!(cell[Month::Feb], 50);
        assert_eq!(cell.plan_next, 0);
        assert_eq!(cell.plan_after, 0);
    }

    #[test]
    fn key_and_scope_derivation() {
        use crate::types::record::{LookupRef, SourceRecord};
        let record = SourceRecord {
            id: 42,
            category: "IT".into(),
            company: LookupRef::new(7, "0070 - Contoso"),
            cost_center: LookupRef::new(3, "0003 - Platform"),
            gl_account: LookupRef::new(9, "6500 - Software"),
            fiscal_year: 2024,
            measures: MeasureSet::zero(),
        };
        assert_eq!(AggregateKey::of(&record), key());
        assert_eq!(
            AggregateScope::of(&record),
            AggregateScope {
                fiscal_year: 2024,
                company_id: 7,
                cost_center_id: 3
            }
        );
    }
}
