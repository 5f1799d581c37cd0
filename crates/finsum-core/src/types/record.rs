use crate::types::measures::MeasureSet;
use serde::{Deserialize, Serialize};

/// Reference to a lookup row in another collection, e.g. a company or
/// cost center. The id is what aggregation keys on; the label is the
/// human-readable value ("0070 - Contoso GmbH").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupRef {
    pub id: i64,
    pub label: String,
}

impl LookupRef {
    pub fn new(id: i64, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
        }
    }
}

/// Fully resolved source record from the external record store. Owned by
/// that store; this system only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub id: i64,
    pub category: String,
    pub company: LookupRef,
    pub cost_center: LookupRef,
    pub gl_account: LookupRef,
    pub fiscal_year: i32,
    pub measures: MeasureSet,
}
