//! `medical_visits` table.

use anyhow::Result;
use rusqlite::{params, Connection, Row};
use time::Date;

use super::{date_column, enum_column, expect_affected, format_date};
use crate::models::{MedicalVisit, VisitStatus};

const MEDICAL_VISIT_COLUMNS: &str = "id, rep_id, visit_date, notes, status";

fn row_to_medical_visit(row: &Row) -> rusqlite::Result<MedicalVisit> {
    Ok(MedicalVisit {
        id: row.get(0)?,
        rep_id: row.get(1)?,
        visit_date: date_column(row, 2)?,
        notes: row.get(3)?,
        status: enum_column(row, 4, VisitStatus::parse, "medical visit status")?,
    })
}

/// Inserts a pending medical visit and returns its ID.
pub fn create_medical_visit(conn: &Connection, rep_id: i64, visit_date: Date, notes: &str) -> Result<i64> {
    conn.execute(
        "INSERT INTO medical_visits (rep_id, visit_date, notes, status) VALUES (?, ?, ?, ?)",
        params![rep_id, format_date(visit_date)?, notes, VisitStatus::Pending.as_str()],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_medical_visits_by_status(
    conn: &Connection,
    status: VisitStatus,
) -> Result<Vec<MedicalVisit>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {MEDICAL_VISIT_COLUMNS} FROM medical_visits WHERE status = ? ORDER BY visit_date DESC, id DESC"
    ))?;
    let visits = stmt
        .query_map(params![status.as_str()], row_to_medical_visit)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(visits)
}

pub fn set_medical_visit_status(conn: &Connection, id: i64, status: VisitStatus) -> Result<()> {
    let affected = conn.execute(
        "UPDATE medical_visits SET status = ? WHERE id = ?",
        params![status.as_str(), id],
    )?;
    expect_affected(affected, "Medical visit", id)
}
