//! `doctors` table.

use anyhow::{anyhow, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::expect_affected;
use crate::models::{Doctor, NewDoctor};

const DOCTOR_COLUMNS: &str = "id, name, specialization, hospital, is_verified";

fn row_to_doctor(row: &Row) -> rusqlite::Result<Doctor> {
    Ok(Doctor {
        id: row.get(0)?,
        name: row.get(1)?,
        specialization: row.get(2)?,
        hospital: row.get(3)?,
        is_verified: row.get(4)?,
    })
}

/// Inserts an unverified doctor and returns the stored row.
pub fn create_doctor(conn: &Connection, doctor: &NewDoctor) -> Result<Doctor> {
    conn.execute(
        "INSERT INTO doctors (name, specialization, hospital, is_verified, created_by) VALUES (?, ?, ?, 0, ?)",
        params![doctor.name, doctor.specialization, doctor.hospital, doctor.created_by],
    )?;
    get_doctor(conn, conn.last_insert_rowid())
}

pub fn get_doctor(conn: &Connection, doctor_id: i64) -> Result<Doctor> {
    conn.query_row(
        &format!("SELECT {DOCTOR_COLUMNS} FROM doctors WHERE id = ?"),
        params![doctor_id],
        row_to_doctor,
    )
    .optional()?
    .ok_or_else(|| anyhow!("Doctor {doctor_id} not found"))
}

/// All doctors ordered by name.
pub fn get_all_doctors(conn: &Connection) -> Result<Vec<Doctor>> {
    let mut stmt = conn.prepare(&format!("SELECT {DOCTOR_COLUMNS} FROM doctors ORDER BY name, id"))?;
    let doctors = stmt
        .query_map([], row_to_doctor)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(doctors)
}

pub fn get_unverified_doctors(conn: &Connection) -> Result<Vec<Doctor>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {DOCTOR_COLUMNS} FROM doctors WHERE is_verified = 0 ORDER BY id"
    ))?;
    let doctors = stmt
        .query_map([], row_to_doctor)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(doctors)
}

pub fn verify_doctor(conn: &Connection, doctor_id: i64) -> Result<()> {
    let affected = conn.execute(
        "UPDATE doctors SET is_verified = 1 WHERE id = ?",
        params![doctor_id],
    )?;
    expect_affected(affected, "Doctor", doctor_id)
}

/// Removes a doctor row. Fails if visits still reference the doctor.
pub fn delete_doctor(conn: &Connection, doctor_id: i64) -> Result<()> {
    let affected = conn.execute("DELETE FROM doctors WHERE id = ?", params![doctor_id])?;
    expect_affected(affected, "Doctor", doctor_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;

    fn new_doctor(name: &str) -> NewDoctor {
        NewDoctor {
            name: name.to_string(),
            specialization: "Cardiology".to_string(),
            hospital: "City Hospital".to_string(),
            created_by: None,
        }
    }

    #[test]
    fn new_doctors_start_unverified() {
        let conn = open_memory_database().unwrap();
        let doctor = create_doctor(&conn, &new_doctor("Dr. Mehta")).unwrap();
        assert!(!doctor.is_verified);
        assert_eq!(get_unverified_doctors(&conn).unwrap(), vec![doctor.clone()]);

        verify_doctor(&conn, doctor.id).unwrap();
        assert!(get_unverified_doctors(&conn).unwrap().is_empty());
        assert!(get_doctor(&conn, doctor.id).unwrap().is_verified);
    }

    #[test]
    fn delete_removes_row() {
        let conn = open_memory_database().unwrap();
        let doctor = create_doctor(&conn, &new_doctor("Dr. Iyer")).unwrap();
        delete_doctor(&conn, doctor.id).unwrap();
        assert!(get_all_doctors(&conn).unwrap().is_empty());
        assert!(delete_doctor(&conn, doctor.id).is_err());
    }
}
