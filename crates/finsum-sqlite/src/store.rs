use chrono::{DateTime, Utc};
use finsum_core::{
    cursor::ticks_from_datetime, AggregateKey, AggregateRecord, AggregateScope, AggregateStore,
    ChangeCursor, ChangeFeed, ChangeKind, ChangeRecord, FinsumError, HistoryStore, LookupRef,
    MeasureSet, Month, Phase, RecordStore, Result, RunHistoryEntry, SourceRecord,
};
use rusqlite::{params, params_from_iter, Connection, OpenFlags, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::schema;

/// SQLite-backed store implementing the change feed, record store,
/// aggregate store, and history store over one connection.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) a database file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
        )
        .map_err(|e| FinsumError::Store(e.to_string()))?;
        Self::configure(&conn)?;
        schema::init(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// In-memory database, for tests and dry runs.
    pub fn open_in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| FinsumError::Store(e.to_string()))?;
        schema::init(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn configure(conn: &Connection) -> Result<()> {
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| FinsumError::Config(e.to_string()))?;
        conn.pragma_update(None, "synchronous", "NORMAL")
            .map_err(|e| FinsumError::Config(e.to_string()))?;
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(|e| FinsumError::Config(e.to_string()))?;
        Ok(())
    }

    /// Insert or replace one source record (seed/fixture path; in
    /// production the record store is owned by the external system).
    pub fn put_source_record(&self, record: &SourceRecord) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO source_records (
                id, category, company_id, company_label, cost_center_id, cost_center_label,
                gl_account_id, gl_account_label, fiscal_year,
                jan, feb, mar, apr, may, jun, jul, aug, sep, oct, nov, dec,
                plan_next, plan_after
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                      ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23)",
            params![
                record.id,
                record.category,
                record.company.id,
                record.company.label,
                record.cost_center.id,
                record.cost_center.label,
                record.gl_account.id,
                record.gl_account.label,
                record.fiscal_year,
                record.measures[Month::Jan],
                record.measures[Month::Feb],
                record.measures[Month::Mar],
                record.measures[Month::Apr],
                record.measures[Month::May],
                record.measures[Month::Jun],
                record.measures[Month::Jul],
                record.measures[Month::Aug],
                record.measures[Month::Sep],
                record.measures[Month::Oct],
                record.measures[Month::Nov],
                record.measures[Month::Dec],
                record.measures.plan_next,
                record.measures.plan_after,
            ],
        )
        .map_err(|e| FinsumError::Store(e.to_string()))?;
        Ok(())
    }

    /// Append a change event for an item at the current time. Returns
    /// the cursor assigned to the event.
    pub fn record_change(
        &self,
        scope_id: &str,
        item_id: i64,
        kind: ChangeKind,
    ) -> Result<ChangeCursor> {
        self.record_change_at(scope_id, item_id, kind, ticks_from_datetime(Utc::now()))
    }

    /// Append a change event with an explicit timestamp. Sequence
    /// numbers increase monotonically per scope.
    pub fn record_change_at(
        &self,
        scope_id: &str,
        item_id: i64,
        kind: ChangeKind,
        ticks: i64,
    ) -> Result<ChangeCursor> {
        let conn = self.conn.lock().unwrap();
        let next_seq: i64 = conn
            .query_row(
                "SELECT COALESCE(MAX(change_seq), 0) + 1 FROM change_log WHERE scope_id = ?1",
                params![scope_id],
                |row| row.get(0),
            )
            .map_err(|e| FinsumError::Store(e.to_string()))?;
        conn.execute(
            "INSERT INTO change_log (scope_id, item_id, kind, ticks, change_seq)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![scope_id, item_id, kind.as_str(), ticks, next_seq],
        )
        .map_err(|e| FinsumError::Store(e.to_string()))?;

        Ok(ChangeCursor {
            format_version: 1,
            scope_kind: finsum_core::cursor::SCOPE_KIND_LIST,
            scope_id: scope_id.to_string(),
            timestamp_ticks: ticks,
            sequence_number: next_seq,
        })
    }

    /// Number of aggregate rows, for status reporting.
    pub fn aggregate_count(&self) -> Result<u64> {
        let conn = self.conn.lock().unwrap();
        conn.query_row("SELECT COUNT(*) FROM aggregate_summary", [], |row| {
            row.get::<_, i64>(0)
        })
        .map(|n| n as u64)
        .map_err(|e| FinsumError::Store(e.to_string()))
    }

    /// Newest run-history entries, newest first.
    pub fn list_history(&self, limit: usize) -> Result<Vec<RunHistoryEntry>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(
                "SELECT process_name, items_retrieved, items_processed,
                        started_at, ended_at, ending_cursor
                 FROM run_history ORDER BY id DESC LIMIT ?1",
            )
            .map_err(|e| FinsumError::Store(e.to_string()))?;
        let rows = stmt
            .query_map(params![limit as i64], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                ))
            })
            .map_err(|e| FinsumError::Store(e.to_string()))?;

        let mut entries = Vec::new();
        for row in rows {
            let (process_name, retrieved, processed, started, ended, cursor) =
                row.map_err(|e| FinsumError::Store(e.to_string()))?;
            entries.push(RunHistoryEntry {
                process_name,
                items_retrieved: retrieved as u32,
                items_processed: processed as u32,
                started_at: parse_timestamp(&started)?,
                ended_at: parse_timestamp(&ended)?,
                ending_cursor: cursor,
            });
        }
        Ok(entries)
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| FinsumError::Serialization(format!("bad timestamp {:?}: {}", value, e)))
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<SourceRecord> {
    let mut measures = MeasureSet::zero();
    for (offset, month) in Month::ALL.iter().enumerate() {
        measures[*month] = row.get(9 + offset)?;
    }
    measures.plan_next = row.get(21)?;
    measures.plan_after = row.get(22)?;

    Ok(SourceRecord {
        id: row.get(0)?,
        category: row.get(1)?,
        company: LookupRef {
            id: row.get(2)?,
            label: row.get(3)?,
        },
        cost_center: LookupRef {
            id: row.get(4)?,
            label: row.get(5)?,
        },
        gl_account: LookupRef {
            id: row.get(6)?,
            label: row.get(7)?,
        },
        fiscal_year: row.get(8)?,
        measures,
    })
}

const SOURCE_COLUMNS: &str = "id, category, company_id, company_label, cost_center_id, \
     cost_center_label, gl_account_id, gl_account_label, fiscal_year, \
     jan, feb, mar, apr, may, jun, jul, aug, sep, oct, nov, dec, plan_next, plan_after";

impl ChangeFeed for SqliteStore {
    fn fetch_changes(
        &self,
        scope_id: &str,
        start: &ChangeCursor,
        limit: usize,
    ) -> Result<Vec<ChangeRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(
                "SELECT item_id, kind, ticks, change_seq FROM change_log
                 WHERE scope_id = ?1 AND ticks >= ?2
                 ORDER BY ticks, change_seq LIMIT ?3",
            )
            .map_err(|e| FinsumError::Store(e.to_string()))?;
        let rows = stmt
            .query_map(
                params![scope_id, start.timestamp_ticks, limit as i64],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, i64>(3)?,
                    ))
                },
            )
            .map_err(|e| FinsumError::Store(e.to_string()))?;

        let mut changes = Vec::new();
        for row in rows {
            let (item_id, kind, ticks, seq) =
                row.map_err(|e| FinsumError::Store(e.to_string()))?;
            let kind = ChangeKind::parse(&kind)
                .ok_or_else(|| FinsumError::Store(format!("unknown change kind {:?}", kind)))?;
            changes.push(ChangeRecord {
                affected_id: item_id,
                kind,
                cursor: ChangeCursor {
                    format_version: 1,
                    scope_kind: finsum_core::cursor::SCOPE_KIND_LIST,
                    scope_id: scope_id.to_string(),
                    timestamp_ticks: ticks,
                    sequence_number: seq,
                },
            });
        }
        Ok(changes)
    }
}

impl RecordStore for SqliteStore {
    fn get_by_id(&self, id: i64) -> Result<Option<SourceRecord>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            &format!("SELECT {} FROM source_records WHERE id = ?1", SOURCE_COLUMNS),
            params![id],
            row_to_record,
        )
        .optional()
        .map_err(|e| FinsumError::RecordFetch {
            id,
            reason: e.to_string(),
        })
    }

    fn query_scope(
        &self,
        scope: &AggregateScope,
        gl_account_id: i64,
        category: &str,
    ) -> Result<Vec<SourceRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM source_records
                 WHERE fiscal_year = ?1 AND company_id = ?2 AND cost_center_id = ?3
                   AND gl_account_id = ?4 AND category = ?5
                 ORDER BY id",
                SOURCE_COLUMNS
            ))
            .map_err(|e| FinsumError::Store(e.to_string()))?;
        let rows = stmt
            .query_map(
                params![
                    scope.fiscal_year,
                    scope.company_id,
                    scope.cost_center_id,
                    gl_account_id,
                    category
                ],
                row_to_record,
            )
            .map_err(|e| FinsumError::Store(e.to_string()))?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| FinsumError::Store(e.to_string()))
    }
}

impl AggregateStore for SqliteStore {
    fn find_by_key(&self, key: &AggregateKey) -> Result<Option<AggregateRecord>> {
        let columns = schema::measure_columns();
        let conn = self.conn.lock().unwrap();
        let sql = format!(
            "SELECT {} FROM aggregate_summary
             WHERE company_id = ?1 AND cost_center_id = ?2
               AND gl_account_id = ?3 AND fiscal_year = ?4",
            columns.join(", ")
        );
        let values: Option<Vec<i64>> = conn
            .query_row(
                &sql,
                params![
                    key.company_id,
                    key.cost_center_id,
                    key.gl_account_id,
                    key.fiscal_year
                ],
                |row| (0..columns.len()).map(|i| row.get(i)).collect(),
            )
            .optional()
            .map_err(|e| FinsumError::Store(e.to_string()))?;

        let Some(values) = values else {
            return Ok(None);
        };

        // Rehydrate in the exact order measure_columns() emits.
        let mut record = AggregateRecord::new(*key);
        let mut iter = values.into_iter();
        for phase in Phase::ALL {
            let mut measures = MeasureSet::zero();
            for month in Month::ALL {
                measures[month] = iter.next().unwrap_or(0);
            }
            if phase.carries_plan() {
                measures.plan_next = iter.next().unwrap_or(0);
                measures.plan_after = iter.next().unwrap_or(0);
            }
            record.set_phase(phase, measures);
        }
        Ok(Some(record))
    }

    fn upsert(&self, record: &AggregateRecord) -> Result<()> {
        let columns = schema::measure_columns();
        let mut values: Vec<i64> = vec![
            record.key.company_id,
            record.key.cost_center_id,
            record.key.gl_account_id,
            record.key.fiscal_year as i64,
        ];
        for phase in Phase::ALL {
            let cell = record.phase(phase);
            for month in Month::ALL {
                values.push(cell[month]);
            }
            if phase.carries_plan() {
                values.push(cell.plan_next);
                values.push(cell.plan_after);
            }
        }

        let placeholders: Vec<String> =
            (1..=values.len()).map(|i| format!("?{}", i)).collect();
        let updates: Vec<String> = columns
            .iter()
            .map(|c| format!("{} = excluded.{}", c, c))
            .collect();
        let sql = format!(
            "INSERT INTO aggregate_summary (company_id, cost_center_id, gl_account_id, fiscal_year, {})
             VALUES ({})
             ON CONFLICT(company_id, cost_center_id, gl_account_id, fiscal_year)
             DO UPDATE SET {}",
            columns.join(", "),
            placeholders.join(", "),
            updates.join(", ")
        );

        let conn = self.conn.lock().unwrap();
        conn.execute(&sql, params_from_iter(values))
            .map_err(|e| FinsumError::Store(e.to_string()))?;
        Ok(())
    }
}

impl HistoryStore for SqliteStore {
    fn last_cursor(&self, process_name: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT ending_cursor FROM run_history
             WHERE process_name = ?1 ORDER BY id DESC LIMIT 1",
            params![process_name],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| FinsumError::Store(e.to_string()))
    }

    fn append(&self, entry: &RunHistoryEntry) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO run_history (process_name, items_retrieved, items_processed,
                                      started_at, ended_at, ending_cursor)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                entry.process_name,
                entry.items_retrieved,
                entry.items_processed,
                entry.started_at.to_rfc3339(),
                entry.ended_at.to_rfc3339(),
                entry.ending_cursor,
            ],
        )
        .map_err(|e| FinsumError::HistoryWrite(e.to_string()))?;
        Ok(())
    }
}
