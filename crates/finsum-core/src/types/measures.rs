//! Typed measure columns.
//!
//! The upstream store addresses monthly and plan amounts by string field
//! name ("Jan_Amount", "FY+1_Plan_Amount", ...). Here the column set is
//! an enumerated type so a missing or misspelled column is a compile
//! error rather than a runtime lookup failure.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};

/// One of the twelve monthly measure columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Month {
    Jan,
    Feb,
    Mar,
    Apr,
    May,
    Jun,
    Jul,
    Aug,
    Sep,
    Oct,
    Nov,
    Dec,
}

impl Month {
    pub const ALL: [Month; 12] = [
        Month::Jan,
        Month::Feb,
        Month::Mar,
        Month::Apr,
        Month::May,
        Month::Jun,
        Month::Jul,
        Month::Aug,
        Month::Sep,
        Month::Oct,
        Month::Nov,
        Month::Dec,
    ];

    /// Lowercase column stem, e.g. `jan`.
    pub fn column(&self) -> &'static str {
        match self {
            Month::Jan => "jan",
            Month::Feb => "feb",
            Month::Mar => "mar",
            Month::Apr => "apr",
            Month::May => "may",
            Month::Jun => "jun",
            Month::Jul => "jul",
            Month::Aug => "aug",
            Month::Sep => "sep",
            Month::Oct => "oct",
            Month::Nov => "nov",
            Month::Dec => "dec",
        }
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// The fourteen measure values carried by a source record or an
/// aggregate cell: twelve monthly amounts plus the two forward-plan
/// amounts (next fiscal year and the year after).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MeasureSet {
    pub monthly: [i64; 12],
    pub plan_next: i64,
    pub plan_after: i64,
}

impl MeasureSet {
    pub fn zero() -> Self {
        Self::default()
    }

    /// Accumulate another record's measures into this set.
    pub fn accumulate(&mut self, other: &MeasureSet) {
        for month in Month::ALL {
            self[month] += other[month];
        }
        self.plan_next += other.plan_next;
        self.plan_after += other.plan_after;
    }
}

impl Index<Month> for MeasureSet {
    type Output = i64;

    fn index(&self, month: Month) -> &i64 {
        &self.monthly[month as usize]
    }
}

impl IndexMut<Month> for MeasureSet {
    fn index_mut(&mut self, month: Month) -> &mut i64 {
        &mut self.monthly[month as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_indexing() {
        let mut set = MeasureSet::zero();
        set[Month::Jan] = 100;
        set[Month::Dec] = 7;
        assert_eq!(set.monthly[0], 100);
        assert_eq!(set.monthly[11], 7);
    }

    #[test]
    fn accumulate_sums_every_column() {
        let mut total = MeasureSet::zero();
        let mut a = MeasureSet::zero();
        a[Month::Feb] = 50;
        a.plan_next = 10;
        let mut b = MeasureSet::zero();
        b[Month::Feb] = 25;
        b.plan_after = 4;

        total.accumulate(&a);
        total.accumulate(&b);
        assert_eq!(total[Month::Feb], 75);
        assert_eq!(total.plan_next, 10);
        assert_eq!(total.plan_after, 4);
    }

    #[test]
    fn all_months_have_distinct_columns() {
        let mut columns: Vec<&str> = Month::ALL.iter().map(|m| m.column()).collect();
        columns.sort_unstable();
        columns.dedup();
        assert_eq!(columns.len(), 12);
    }
}
