//! Seed command implementation
//!
//! Loads source records from a JSON array and logs an Add change event
//! for each one, so a subsequent `run` picks them all up.

use anyhow::{Context, Result};
use finsum_core::{ChangeKind, SourceRecord};
use finsum_sqlite::SqliteStore;
use std::path::PathBuf;

pub fn execute(db_path: PathBuf, file: PathBuf, scope: String) -> Result<()> {
    let store = SqliteStore::open(&db_path).context("Failed to open database")?;

    let body = std::fs::read_to_string(&file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let records: Vec<SourceRecord> =
        serde_json::from_str(&body).context("Failed to parse source records")?;

    for record in &records {
        store
            .put_source_record(record)
            .with_context(|| format!("Failed to insert record {}", record.id))?;
        store
            .record_change(&scope, record.id, ChangeKind::Add)
            .with_context(|| format!("Failed to log change for record {}", record.id))?;
    }

    println!(
        "✓ Seeded {} record(s) into {} under scope {}",
        records.len(),
        db_path.display(),
        scope
    );
    Ok(())
}
