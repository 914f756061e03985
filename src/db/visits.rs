//! `visits` and `visit_orders` tables.

use anyhow::Result;
use rusqlite::{params, Connection, Row};
use rust_decimal::Decimal;
use std::collections::HashMap;

use super::{date_column, decimal_column, enum_column, expect_affected, format_date};
use crate::models::{NewVisit, Visit, VisitOrder, VisitStatus, VisitWithDetails};

const VISIT_COLUMNS: &str = "v.id, v.doctor_id, v.rep_id, v.visit_date, v.hospital, v.notes, v.status";
const ORDER_COLUMNS: &str = "id, visit_id, medicine_id, quantity, unit_price";

fn row_to_visit(row: &Row) -> rusqlite::Result<Visit> {
    Ok(Visit {
        id: row.get(0)?,
        doctor_id: row.get(1)?,
        rep_id: row.get(2)?,
        visit_date: date_column(row, 3)?,
        hospital: row.get(4)?,
        notes: row.get(5)?,
        status: enum_column(row, 6, VisitStatus::parse, "visit status")?,
    })
}

fn row_to_order(row: &Row) -> rusqlite::Result<VisitOrder> {
    Ok(VisitOrder {
        id: row.get(0)?,
        visit_id: row.get(1)?,
        medicine_id: row.get(2)?,
        quantity: row.get(3)?,
        unit_price: decimal_column(row, 4)?,
    })
}

/// Inserts a visit in `pending` status and returns its ID.
pub fn create_visit(conn: &Connection, visit: &NewVisit) -> Result<i64> {
    conn.execute(
        "INSERT INTO visits (doctor_id, rep_id, visit_date, hospital, notes, status) VALUES (?, ?, ?, ?, ?, ?)",
        params![
            visit.doctor_id,
            visit.rep_id,
            format_date(visit.visit_date)?,
            visit.hospital,
            visit.notes,
            VisitStatus::Pending.as_str(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Inserts one order line carrying the price captured when it was staged.
pub fn create_visit_order(
    conn: &Connection,
    visit_id: i64,
    medicine_id: i64,
    quantity: u32,
    unit_price: Decimal,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO visit_orders (visit_id, medicine_id, quantity, unit_price) VALUES (?, ?, ?, ?)",
        params![visit_id, medicine_id, quantity, unit_price.to_string()],
    )?;
    Ok(conn.last_insert_rowid())
}

#[cfg(test)]
pub fn get_visit(conn: &Connection, visit_id: i64) -> Result<Visit> {
    use rusqlite::OptionalExtension;

    conn.query_row(
        &format!("SELECT {VISIT_COLUMNS} FROM visits v WHERE v.id = ?"),
        params![visit_id],
        row_to_visit,
    )
    .optional()?
    .ok_or_else(|| anyhow::anyhow!("Visit {visit_id} not found"))
}

/// All visits, newest first.
pub fn get_all_visits(conn: &Connection) -> Result<Vec<Visit>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {VISIT_COLUMNS} FROM visits v ORDER BY v.visit_date DESC, v.id DESC"
    ))?;
    let visits = stmt
        .query_map([], row_to_visit)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(visits)
}

pub fn get_visits_by_status(conn: &Connection, status: VisitStatus) -> Result<Vec<Visit>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {VISIT_COLUMNS} FROM visits v WHERE v.status = ? ORDER BY v.visit_date DESC, v.id DESC"
    ))?;
    let visits = stmt
        .query_map(params![status.as_str()], row_to_visit)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(visits)
}

/// Every order line in the system.
pub fn get_all_orders(conn: &Connection) -> Result<Vec<VisitOrder>> {
    let mut stmt = conn.prepare(&format!("SELECT {ORDER_COLUMNS} FROM visit_orders ORDER BY id"))?;
    let orders = stmt
        .query_map([], row_to_order)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(orders)
}

#[cfg(test)]
pub fn get_orders_for_visit(conn: &Connection, visit_id: i64) -> Result<Vec<VisitOrder>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ORDER_COLUMNS} FROM visit_orders WHERE visit_id = ? ORDER BY id"
    ))?;
    let orders = stmt
        .query_map(params![visit_id], row_to_order)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(orders)
}

/// A representative's visits joined with doctor name and order lines,
/// newest first.
pub fn get_visits_for_rep(conn: &Connection, rep_id: i64) -> Result<Vec<VisitWithDetails>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {VISIT_COLUMNS}, d.name FROM visits v
         JOIN doctors d ON d.id = v.doctor_id
         WHERE v.rep_id = ?
         ORDER BY v.visit_date DESC, v.id DESC"
    ))?;
    let rows = stmt
        .query_map(params![rep_id], |row| Ok((row_to_visit(row)?, row.get::<_, String>(7)?)))?
        .collect::<Result<Vec<_>, _>>()?;

    let mut order_stmt = conn.prepare(
        "SELECT o.id, o.visit_id, o.medicine_id, o.quantity, o.unit_price FROM visit_orders o
         JOIN visits v ON v.id = o.visit_id
         WHERE v.rep_id = ?
         ORDER BY o.id",
    )?;
    let mut orders_by_visit: HashMap<i64, Vec<VisitOrder>> = HashMap::new();
    for order in order_stmt.query_map(params![rep_id], row_to_order)? {
        let order = order?;
        orders_by_visit.entry(order.visit_id).or_default().push(order);
    }

    Ok(rows
        .into_iter()
        .map(|(visit, doctor_name)| VisitWithDetails {
            orders: orders_by_visit.remove(&visit.id).unwrap_or_default(),
            visit,
            doctor_name,
        })
        .collect())
}

pub fn set_visit_status(conn: &Connection, visit_id: i64, status: VisitStatus) -> Result<()> {
    let affected = conn.execute(
        "UPDATE visits SET status = ? WHERE id = ?",
        params![status.as_str(), visit_id],
    )?;
    expect_affected(affected, "Visit", visit_id)
}
