//! Schema definition.
//!
//! The aggregate table carries one row per composite key with
//! phase-qualified measure columns (`jan_actual`, `plan_next_final`,
//! ...). The column list is generated from the `Month` and `Phase`
//! enums so the schema and the typed measure mapping cannot drift
//! apart; Estimate has no plan columns at all.

use finsum_core::{FinsumError, Month, Phase, Result};
use rusqlite::Connection;

/// Phase-qualified measure column names, in a fixed order shared by the
/// reader and the writer.
pub fn measure_columns() -> Vec<String> {
    let mut columns = Vec::new();
    for phase in Phase::ALL {
        for month in Month::ALL {
            columns.push(format!("{}_{}", month.column(), phase.column_suffix()));
        }
        if phase.carries_plan() {
            columns.push(format!("plan_next_{}", phase.column_suffix()));
            columns.push(format!("plan_after_{}", phase.column_suffix()));
        }
    }
    columns
}

/// Create all tables if missing.
pub fn init(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS source_records (
            id INTEGER PRIMARY KEY,
            category TEXT NOT NULL,
            company_id INTEGER NOT NULL,
            company_label TEXT NOT NULL,
            cost_center_id INTEGER NOT NULL,
            cost_center_label TEXT NOT NULL,
            gl_account_id INTEGER NOT NULL,
            gl_account_label TEXT NOT NULL,
            fiscal_year INTEGER NOT NULL,
            jan INTEGER NOT NULL DEFAULT 0,
            feb INTEGER NOT NULL DEFAULT 0,
            mar INTEGER NOT NULL DEFAULT 0,
            apr INTEGER NOT NULL DEFAULT 0,
            may INTEGER NOT NULL DEFAULT 0,
            jun INTEGER NOT NULL DEFAULT 0,
            jul INTEGER NOT NULL DEFAULT 0,
            aug INTEGER NOT NULL DEFAULT 0,
            sep INTEGER NOT NULL DEFAULT 0,
            oct INTEGER NOT NULL DEFAULT 0,
            nov INTEGER NOT NULL DEFAULT 0,
            dec INTEGER NOT NULL DEFAULT 0,
            plan_next INTEGER NOT NULL DEFAULT 0,
            plan_after INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS change_log (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            scope_id TEXT NOT NULL,
            item_id INTEGER NOT NULL,
            kind TEXT NOT NULL,
            ticks INTEGER NOT NULL,
            change_seq INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_change_log_scope
            ON change_log (scope_id, ticks, change_seq);

        CREATE TABLE IF NOT EXISTS run_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            process_name TEXT NOT NULL,
            items_retrieved INTEGER NOT NULL,
            items_processed INTEGER NOT NULL,
            started_at TEXT NOT NULL,
            ended_at TEXT NOT NULL,
            ending_cursor TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_run_history_process
            ON run_history (process_name, id);",
    )
    .map_err(|e| FinsumError::Store(e.to_string()))?;

    let mut aggregate_sql = String::from(
        "CREATE TABLE IF NOT EXISTS aggregate_summary (
            company_id INTEGER NOT NULL,
            cost_center_id INTEGER NOT NULL,
            gl_account_id INTEGER NOT NULL,
            fiscal_year INTEGER NOT NULL",
    );
    for column in measure_columns() {
        aggregate_sql.push_str(&format!(",\n            {} INTEGER NOT NULL DEFAULT 0", column));
    }
    aggregate_sql.push_str(
        ",\n            PRIMARY KEY (company_id, cost_center_id, gl_account_id, fiscal_year)\n        )",
    );
    conn.execute(&aggregate_sql, [])
        .map_err(|e| FinsumError::Store(e.to_string()))?;

    Ok(())
}
