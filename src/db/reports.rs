//! `reports` table: stored dashboard snapshots.

use anyhow::Result;
use rusqlite::{params, Connection};

use crate::models::Report;

pub fn create_report(conn: &Connection, created_by: i64, kind: &str, payload: &str) -> Result<i64> {
    conn.execute(
        "INSERT INTO reports (created_by, kind, payload) VALUES (?, ?, ?)",
        params![created_by, kind, payload],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Stored reports, newest first.
pub fn get_reports(conn: &Connection) -> Result<Vec<Report>> {
    let mut stmt = conn.prepare(
        "SELECT id, created_by, kind, payload, created_at FROM reports ORDER BY id DESC",
    )?;
    let reports = stmt
        .query_map([], |row| {
            Ok(Report {
                id: row.get(0)?,
                created_by: row.get(1)?,
                kind: row.get(2)?,
                payload: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(reports)
}
