//! `medicines` table.

use anyhow::{anyhow, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{decimal_column, expect_affected};
use crate::models::{Medicine, MedicineInput};

const MEDICINE_COLUMNS: &str =
    "id, name, category, medicine_type, dosage, pack_size, price, stock, description";

fn row_to_medicine(row: &Row) -> rusqlite::Result<Medicine> {
    Ok(Medicine {
        id: row.get(0)?,
        name: row.get(1)?,
        category: row.get(2)?,
        medicine_type: row.get(3)?,
        dosage: row.get(4)?,
        pack_size: row.get(5)?,
        price: decimal_column(row, 6)?,
        stock: row.get(7)?,
        description: row.get(8)?,
    })
}

/// Inserts a medicine and returns the stored row with its assigned ID.
pub fn create_medicine(conn: &Connection, input: &MedicineInput) -> Result<Medicine> {
    conn.execute(
        "INSERT INTO medicines (name, category, medicine_type, dosage, pack_size, price, stock, description) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            input.name,
            input.category,
            input.medicine_type,
            input.dosage,
            input.pack_size,
            input.price.to_string(),
            input.stock,
            input.description,
        ],
    )?;
    get_medicine(conn, conn.last_insert_rowid())
}

pub fn get_medicine(conn: &Connection, medicine_id: i64) -> Result<Medicine> {
    conn.query_row(
        &format!("SELECT {MEDICINE_COLUMNS} FROM medicines WHERE id = ?"),
        params![medicine_id],
        row_to_medicine,
    )
    .optional()?
    .ok_or_else(|| anyhow!("Medicine {medicine_id} not found"))
}

/// The full catalog ordered by name.
pub fn get_all_medicines(conn: &Connection) -> Result<Vec<Medicine>> {
    let mut stmt =
        conn.prepare(&format!("SELECT {MEDICINE_COLUMNS} FROM medicines ORDER BY name, id"))?;
    let medicines = stmt
        .query_map([], row_to_medicine)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(medicines)
}

/// Updates a medicine and returns the stored row.
pub fn update_medicine(conn: &Connection, medicine_id: i64, input: &MedicineInput) -> Result<Medicine> {
    let affected = conn.execute(
        "UPDATE medicines SET name = ?, category = ?, medicine_type = ?, dosage = ?, pack_size = ?, price = ?, stock = ?, description = ? WHERE id = ?",
        params![
            input.name,
            input.category,
            input.medicine_type,
            input.dosage,
            input.pack_size,
            input.price.to_string(),
            input.stock,
            input.description,
            medicine_id,
        ],
    )?;
    expect_affected(affected, "Medicine", medicine_id)?;
    get_medicine(conn, medicine_id)
}

pub fn delete_medicine(conn: &Connection, medicine_id: i64) -> Result<()> {
    let affected = conn.execute("DELETE FROM medicines WHERE id = ?", params![medicine_id])?;
    expect_affected(affected, "Medicine", medicine_id)
}
