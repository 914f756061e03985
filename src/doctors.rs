//! Doctors added from the field. They start unverified and wait in the
//! admin approval queue.

use rusqlite::Connection;

use crate::auth::Session;
use crate::db;
use crate::error::{TrackerError, TrackerResult};
use crate::models::{Doctor, NewDoctor};

#[derive(Debug, Clone, Default)]
pub struct DoctorForm {
    pub name: String,
    pub specialization: String,
    pub hospital: String,
}

impl DoctorForm {
    pub fn validate(&self, created_by: Option<i64>) -> TrackerResult<NewDoctor> {
        let name = self.name.trim();
        let hospital = self.hospital.trim();
        if name.is_empty() || hospital.is_empty() {
            return Err(TrackerError::validation("Doctor name and hospital are required."));
        }
        Ok(NewDoctor {
            name: name.to_string(),
            specialization: self.specialization.trim().to_string(),
            hospital: hospital.to_string(),
            created_by,
        })
    }
}

pub fn register_doctor(
    conn: &Connection,
    session: Option<&Session>,
    form: &DoctorForm,
) -> TrackerResult<Doctor> {
    let session = session.ok_or(TrackerError::Unauthenticated)?;
    let new_doctor = form.validate(Some(session.profile_id))?;
    let doctor = db::doctors::create_doctor(conn, &new_doctor)?;
    tracing::info!(doctor_id = doctor.id, created_by = session.profile_id, "doctor added");
    Ok(doctor)
}
