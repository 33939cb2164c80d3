//! Append-only import audit log.

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Row, params};

use super::{Store, to_count, to_sql_int};
use crate::common::Result;
use crate::model::ImportRun;

fn import_run_from_row(row: &Row<'_>) -> rusqlite::Result<ImportRun> {
    let timestamp: String = row.get(4)?;
    let timestamp = DateTime::parse_from_rfc3339(&timestamp)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?
        .with_timezone(&Utc);
    Ok(ImportRun {
        id: row.get(0)?,
        isa: row.get(1)?,
        source_path: row.get(2)?,
        instruction_count: to_count(row.get(3)?),
        timestamp,
        source_version: row.get(5)?,
        importer_version: row.get(6)?,
        duration_seconds: row.get(7)?,
        success: row.get(8)?,
        error_message: row.get(9)?,
    })
}

impl Store {
    /// Appends one audit row and returns its id.
    pub fn record_import_run(&mut self, run: &ImportRun) -> Result<i64> {
        let _ = self.conn.execute(
            "INSERT INTO import_metadata (
                 isa, source_path, import_date, instruction_count, source_version,
                 importer_version, import_duration_seconds, success, error_message
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                run.isa,
                run.source_path,
                run.timestamp.to_rfc3339(),
                to_sql_int(run.instruction_count),
                run.source_version,
                run.importer_version,
                run.duration_seconds,
                run.success,
                run.error_message,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Audit rows in insertion order, optionally for one importer ISA name.
    pub fn import_runs(&self, isa: Option<&str>) -> Result<Vec<ImportRun>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, isa, source_path, instruction_count, import_date, source_version,
                    importer_version, import_duration_seconds, success, error_message
             FROM import_metadata
             WHERE ?1 IS NULL OR isa = ?1
             ORDER BY id",
        )?;
        let runs = stmt
            .query_map(params![isa], import_run_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(runs)
    }
}
