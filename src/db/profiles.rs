//! `profiles` table: administrators and representatives.

use anyhow::{anyhow, Context, Result};
use bcrypt::{hash, verify};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{enum_column, expect_affected};
use crate::models::{Profile, ProfileStatus, Role};

#[cfg(not(test))]
const HASH_COST: u32 = bcrypt::DEFAULT_COST;
#[cfg(test)]
const HASH_COST: u32 = 4;

const PROFILE_COLUMNS: &str = "id, full_name, email, role, status";

fn row_to_profile(row: &Row) -> rusqlite::Result<Profile> {
    Ok(Profile {
        id: row.get(0)?,
        full_name: row.get(1)?,
        email: row.get(2)?,
        role: enum_column(row, 3, Role::parse, "role")?,
        status: enum_column(row, 4, ProfileStatus::parse, "status")?,
    })
}

/// Creates a profile, hashing the password with bcrypt before storing it.
///
/// Returns the new profile's ID.
pub fn create_profile(
    conn: &Connection,
    full_name: &str,
    email: &str,
    password: &str,
    role: Role,
    status: ProfileStatus,
) -> Result<i64> {
    let hashed_password = hash(password, HASH_COST).context("Failed to hash password")?;

    conn.execute(
        "INSERT INTO profiles (full_name, email, password_hash, role, status) VALUES (?, ?, ?, ?, ?)",
        params![full_name, email, hashed_password, role.as_str(), status.as_str()],
    )?;

    Ok(conn.last_insert_rowid())
}

/// Verifies an email/password pair and returns the matching profile.
///
/// # Errors
///
/// Returns an error if no profile has that email or the password does not
/// match the stored hash.
pub fn authenticate(conn: &Connection, email: &str, password: &str) -> Result<Profile> {
    let found: Option<(Profile, String)> = conn
        .query_row(
            &format!("SELECT {PROFILE_COLUMNS}, password_hash FROM profiles WHERE email = ?"),
            params![email],
            |row| Ok((row_to_profile(row)?, row.get(5)?)),
        )
        .optional()?;

    let (profile, stored_hash) = found.ok_or_else(|| anyhow!("Invalid credentials"))?;

    if verify(password, &stored_hash).context("Failed to verify password")? {
        Ok(profile)
    } else {
        Err(anyhow!("Invalid credentials"))
    }
}

pub fn email_exists(conn: &Connection, email: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM profiles WHERE email = ?",
        params![email],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn get_profile(conn: &Connection, profile_id: i64) -> Result<Profile> {
    conn.query_row(
        &format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = ?"),
        params![profile_id],
        row_to_profile,
    )
    .optional()?
    .ok_or_else(|| anyhow!("Profile {profile_id} not found"))
}

/// All profiles in insertion order.
pub fn get_profiles(conn: &Connection) -> Result<Vec<Profile>> {
    let mut stmt = conn.prepare(&format!("SELECT {PROFILE_COLUMNS} FROM profiles ORDER BY id"))?;
    let profiles = stmt
        .query_map([], row_to_profile)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(profiles)
}

/// Representatives awaiting activation.
pub fn get_pending_representatives(conn: &Connection) -> Result<Vec<Profile>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PROFILE_COLUMNS} FROM profiles WHERE role = ? AND status = ? ORDER BY id"
    ))?;
    let profiles = stmt
        .query_map(
            params![Role::Mr.as_str(), ProfileStatus::Pending.as_str()],
            row_to_profile,
        )?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(profiles)
}

pub fn set_profile_status(conn: &Connection, profile_id: i64, status: ProfileStatus) -> Result<()> {
    let affected = conn.execute(
        "UPDATE profiles SET status = ? WHERE id = ?",
        params![status.as_str(), profile_id],
    )?;
    expect_affected(affected, "Profile", profile_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;

    #[test]
    fn authenticate_accepts_correct_password_only() {
        let conn = open_memory_database().unwrap();
        let id = create_profile(
            &conn,
            "Asha Rao",
            "asha@example.com",
            "secret",
            Role::Mr,
            ProfileStatus::Active,
        )
        .unwrap();

        let profile = authenticate(&conn, "asha@example.com", "secret").unwrap();
        assert_eq!(profile.id, id);
        assert_eq!(profile.role, Role::Mr);

        assert!(authenticate(&conn, "asha@example.com", "wrong").is_err());
        assert!(authenticate(&conn, "nobody@example.com", "secret").is_err());
    }

    #[test]
    fn duplicate_email_is_rejected_by_the_table() {
        let conn = open_memory_database().unwrap();
        create_profile(&conn, "A", "dup@example.com", "pw", Role::Mr, ProfileStatus::Pending)
            .unwrap();
        assert!(email_exists(&conn, "dup@example.com").unwrap());
        assert!(create_profile(
            &conn,
            "B",
            "dup@example.com",
            "pw",
            Role::Mr,
            ProfileStatus::Pending
        )
        .is_err());
    }

    #[test]
    fn pending_representatives_excludes_admins_and_active() {
        let conn = open_memory_database().unwrap();
        let pending =
            create_profile(&conn, "P", "p@example.com", "pw", Role::Mr, ProfileStatus::Pending)
                .unwrap();
        create_profile(&conn, "A", "a@example.com", "pw", Role::Mr, ProfileStatus::Active)
            .unwrap();
        create_profile(&conn, "X", "x@example.com", "pw", Role::Admin, ProfileStatus::Pending)
            .unwrap();

        let ids: Vec<i64> = get_pending_representatives(&conn)
            .unwrap()
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![pending]);
    }

    #[test]
    fn set_status_on_missing_profile_fails() {
        let conn = open_memory_database().unwrap();
        assert!(set_profile_status(&conn, 999, ProfileStatus::Active).is_err());
    }
}
