//! Database module for FieldTrack.
//!
//! The SQLite database owns the tables every screen reads and writes:
//! `profiles`, `doctors`, `medicines`, `visits`, `visit_orders`,
//! `medical_visits` and `reports`. Each table has its own submodule of plain
//! functions taking a `&Connection`; nothing here caches rows or joins across
//! screens.

use anyhow::{Context, Result};
use rusqlite::{types::Type, Connection, Row};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use time::{macros::format_description, Date};

use crate::models::{ProfileStatus, Role};

pub mod doctors;
pub mod medical_visits;
pub mod medicines;
pub mod profiles;
pub mod reports;
pub mod seed;
pub mod visits;

/// Email of the administrator created on first start.
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@fieldtrack.local";
const DEFAULT_ADMIN_PASSWORD: &str = "admin";

/// Opens (or creates) the database file and brings the schema up to date.
///
/// # Errors
///
/// Returns an error if the file cannot be opened, the schema cannot be
/// executed, or the default administrator cannot be created.
pub fn open_database(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open database at {}", path.display()))?;
    init_db(&conn)?;
    tracing::info!(path = %path.display(), "database ready");
    Ok(conn)
}

/// Opens an in-memory database with the full schema (used by tests).
#[cfg(test)]
pub fn open_memory_database() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    init_db(&conn)?;
    Ok(conn)
}

/// Executes `schema.sql` and makes sure an administrator exists.
fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;

    let schema = include_str!("schema.sql");
    conn.execute_batch(schema)
        .context("Failed to execute schema")?;

    let admins: i64 = conn.query_row(
        "SELECT COUNT(*) FROM profiles WHERE role = ?",
        [Role::Admin.as_str()],
        |row| row.get(0),
    )?;

    if admins == 0 {
        profiles::create_profile(
            conn,
            "Administrator",
            DEFAULT_ADMIN_EMAIL,
            DEFAULT_ADMIN_PASSWORD,
            Role::Admin,
            ProfileStatus::Active,
        )
        .context("Failed to create default administrator")?;
        tracing::warn!(
            email = DEFAULT_ADMIN_EMAIL,
            "created default administrator with the default password"
        );
    }

    Ok(())
}

/// Formats a date the way it is stored (`YYYY-MM-DD`).
pub fn format_date(date: Date) -> Result<String> {
    Ok(date.format(format_description!("[year]-[month]-[day]"))?)
}

/// Parses a `YYYY-MM-DD` date, ignoring surrounding whitespace.
pub fn parse_date(value: &str) -> std::result::Result<Date, time::error::Parse> {
    Date::parse(value.trim(), format_description!("[year]-[month]-[day]"))
}

pub(crate) fn date_column(row: &Row, idx: usize) -> rusqlite::Result<Date> {
    let raw: String = row.get(idx)?;
    parse_date(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn decimal_column(row: &Row, idx: usize) -> rusqlite::Result<Decimal> {
    let raw: String = row.get(idx)?;
    Decimal::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn enum_column<T>(
    row: &Row,
    idx: usize,
    parse: fn(&str) -> Option<T>,
    what: &str,
) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    parse(&raw).ok_or_else(|| {
        rusqlite::Error::InvalidColumnType(idx, format!("Invalid {what} value: {raw}"), Type::Text)
    })
}

/// Turns "zero rows affected" into a not-found error.
pub(crate) fn expect_affected(affected: usize, entity: &str, id: i64) -> Result<()> {
    if affected == 0 {
        anyhow::bail!("{entity} {id} not found");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Month;

    #[test]
    fn schema_creates_all_tables() {
        let conn = open_memory_database().unwrap();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 7);
    }

    #[test]
    fn schema_is_idempotent_and_admin_created_once() {
        let conn = open_memory_database().unwrap();
        init_db(&conn).unwrap();
        let admins = profiles::get_profiles(&conn)
            .unwrap()
            .into_iter()
            .filter(|p| p.role == Role::Admin)
            .count();
        assert_eq!(admins, 1);
    }

    #[test]
    fn foreign_keys_enabled() {
        let conn = open_memory_database().unwrap();
        let fk: i64 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(fk, 1);
    }

    #[test]
    fn dates_use_iso_layout() {
        let date = Date::from_calendar_date(2024, Month::March, 2).unwrap();
        assert_eq!(format_date(date).unwrap(), "2024-03-02");
        assert_eq!(parse_date(" 2024-03-02 ").unwrap(), date);
        assert!(parse_date("02/03/2024").is_err());
    }
}
