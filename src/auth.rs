use crate::db;
use crate::error::{TrackerError, TrackerResult};
use crate::models::{ProfileStatus, Role};
use anyhow::{Context, Result};
use rusqlite::Connection;

#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// The signed-in user: who they are and what role they act in.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub profile_id: i64,
    pub role: Role,
    pub full_name: String,
}

pub fn login(conn: &Connection, credentials: Credentials) -> Result<Session> {
    let profile = db::profiles::authenticate(conn, credentials.email.trim(), &credentials.password)
        .context("⚠️ Authentication failed")?;
    tracing::info!(profile_id = profile.id, role = profile.role.as_str(), "login");
    Ok(Session {
        profile_id: profile.id,
        role: profile.role,
        full_name: profile.full_name,
    })
}

/// Self sign-up for representatives. The profile starts `pending` and must
/// be approved by an administrator before visits can be submitted.
pub fn register_representative(
    conn: &Connection,
    full_name: &str,
    email: &str,
    password: &str,
    confirm_password: &str,
) -> TrackerResult<i64> {
    let full_name = full_name.trim();
    let email = email.trim();

    if full_name.is_empty() || email.is_empty() {
        return Err(TrackerError::validation("Name and email cannot be empty."));
    }
    if !email.contains('@') {
        return Err(TrackerError::validation("Email address is not valid."));
    }
    if password.len() < 4 {
        return Err(TrackerError::validation(
            "Password must be at least 4 characters.",
        ));
    }
    if password != confirm_password {
        return Err(TrackerError::validation("Passwords do not match."));
    }
    if db::profiles::email_exists(conn, email)? {
        return Err(TrackerError::validation("Email is already registered."));
    }

    let id = db::profiles::create_profile(
        conn,
        full_name,
        email,
        password,
        Role::Mr,
        ProfileStatus::Pending,
    )?;
    tracing::info!(profile_id = id, "representative registered, awaiting approval");
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{open_memory_database, DEFAULT_ADMIN_EMAIL};

    #[test]
    fn default_admin_can_log_in() {
        let conn = open_memory_database().unwrap();
        let session = login(
            &conn,
            Credentials {
                email: DEFAULT_ADMIN_EMAIL.into(),
                password: "admin".into(),
            },
        )
        .unwrap();
        assert_eq!(session.role, Role::Admin);
    }

    #[test]
    fn registration_creates_pending_representative() {
        let conn = open_memory_database().unwrap();
        let id = register_representative(&conn, "Ravi", "ravi@example.com", "pass1", "pass1")
            .unwrap();
        let profile = db::profiles::get_profile(&conn, id).unwrap();
        assert_eq!(profile.role, Role::Mr);
        assert_eq!(profile.status, ProfileStatus::Pending);

        let session = login(
            &conn,
            Credentials {
                email: "ravi@example.com".into(),
                password: "pass1".into(),
            },
        )
        .unwrap();
        assert_eq!(session.profile_id, id);
    }

    #[test]
    fn registration_validates_before_writing() {
        let conn = open_memory_database().unwrap();
        assert!(register_representative(&conn, "Ravi", "ravi@example.com", "pass1", "pass2").is_err());
        assert!(register_representative(&conn, "Ravi", "not-an-email", "pass1", "pass1").is_err());
        assert!(register_representative(&conn, "", "ravi@example.com", "pass1", "pass1").is_err());
        assert!(register_representative(&conn, "Ravi", DEFAULT_ADMIN_EMAIL, "pass1", "pass1").is_err());
        assert_eq!(db::profiles::get_profiles(&conn).unwrap().len(), 1);
    }
}
