//! Unified approval queue over visits, representatives, doctors and
//! medical visits.
//!
//! Each kind lives in its own table with its own status vocabulary, so a
//! decision is routed by an exhaustive match on the kind. Rejecting a doctor
//! deletes the row; every other rejection is a status change.

use rusqlite::Connection;
use std::collections::HashMap;
use time::Date;

use super::admin::AdminSources;
use crate::db;
use crate::error::TrackerResult;
use crate::models::{ProfileStatus, VisitStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalKind {
    Visit,
    User,
    Doctor,
    MedicalVisit,
}

impl ApprovalKind {
    pub fn label(&self) -> &'static str {
        match self {
            ApprovalKind::Visit => "Visit",
            ApprovalKind::User => "User",
            ApprovalKind::Doctor => "Doctor",
            ApprovalKind::MedicalVisit => "Medical visit",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

/// One entry of the approval queue with what the admin needs to see.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingApproval {
    Visit {
        id: i64,
        rep_name: String,
        doctor_name: String,
        visit_date: Date,
    },
    User {
        id: i64,
        name: String,
        email: String,
    },
    Doctor {
        id: i64,
        name: String,
    },
    MedicalVisit {
        id: i64,
        label: String,
    },
}

impl PendingApproval {
    pub fn id(&self) -> i64 {
        match self {
            PendingApproval::Visit { id, .. }
            | PendingApproval::User { id, .. }
            | PendingApproval::Doctor { id, .. }
            | PendingApproval::MedicalVisit { id, .. } => *id,
        }
    }

    pub fn kind(&self) -> ApprovalKind {
        match self {
            PendingApproval::Visit { .. } => ApprovalKind::Visit,
            PendingApproval::User { .. } => ApprovalKind::User,
            PendingApproval::Doctor { .. } => ApprovalKind::Doctor,
            PendingApproval::MedicalVisit { .. } => ApprovalKind::MedicalVisit,
        }
    }

    pub fn title(&self) -> String {
        match self {
            PendingApproval::Visit { rep_name, .. } => rep_name.clone(),
            PendingApproval::User { name, .. } => name.clone(),
            PendingApproval::Doctor { name, .. } => name.clone(),
            PendingApproval::MedicalVisit { label, .. } => label.clone(),
        }
    }

    pub fn detail(&self) -> String {
        match self {
            PendingApproval::Visit {
                doctor_name,
                visit_date,
                ..
            } => format!(
                "{doctor_name} on {}",
                db::format_date(*visit_date).unwrap_or_default()
            ),
            PendingApproval::User { email, .. } => email.clone(),
            PendingApproval::Doctor { .. } => "Unverified doctor".to_string(),
            PendingApproval::MedicalVisit { .. } => String::new(),
        }
    }
}

/// Concatenates the four pending sets: visits, representatives, doctors,
/// then medical visits.
pub fn pending_queue(sources: &AdminSources) -> Vec<PendingApproval> {
    let rep_names: HashMap<i64, &str> = sources
        .profiles
        .iter()
        .map(|p| (p.id, p.full_name.as_str()))
        .collect();
    let doctor_names: HashMap<i64, &str> = sources
        .doctors
        .iter()
        .map(|d| (d.id, d.name.as_str()))
        .collect();

    let visits = sources.pending_visits.iter().map(|v| PendingApproval::Visit {
        id: v.id,
        rep_name: rep_names.get(&v.rep_id).unwrap_or(&"Unknown").to_string(),
        doctor_name: doctor_names.get(&v.doctor_id).unwrap_or(&"Unknown").to_string(),
        visit_date: v.visit_date,
    });
    let users = sources
        .pending_representatives
        .iter()
        .map(|p| PendingApproval::User {
            id: p.id,
            name: p.full_name.clone(),
            email: p.email.clone(),
        });
    let doctors = sources
        .unverified_doctors
        .iter()
        .map(|d| PendingApproval::Doctor {
            id: d.id,
            name: d.name.clone(),
        });
    let medical_visits = sources
        .pending_medical_visits
        .iter()
        .map(|m| PendingApproval::MedicalVisit {
            id: m.id,
            label: format!(
                "Medical visit on {}",
                db::format_date(m.visit_date).unwrap_or_default()
            ),
        });

    visits
        .chain(users)
        .chain(doctors)
        .chain(medical_visits)
        .collect()
}

/// Applies an approve/reject decision to the row behind a queue entry.
pub fn decide(
    conn: &Connection,
    kind: ApprovalKind,
    id: i64,
    decision: Decision,
) -> TrackerResult<()> {
    match (kind, decision) {
        (ApprovalKind::Visit, Decision::Approve) => {
            db::visits::set_visit_status(conn, id, VisitStatus::Approved)?
        }
        (ApprovalKind::Visit, Decision::Reject) => {
            db::visits::set_visit_status(conn, id, VisitStatus::Rejected)?
        }
        (ApprovalKind::User, Decision::Approve) => {
            db::profiles::set_profile_status(conn, id, ProfileStatus::Active)?
        }
        (ApprovalKind::User, Decision::Reject) => {
            db::profiles::set_profile_status(conn, id, ProfileStatus::Inactive)?
        }
        (ApprovalKind::Doctor, Decision::Approve) => db::doctors::verify_doctor(conn, id)?,
        (ApprovalKind::Doctor, Decision::Reject) => db::doctors::delete_doctor(conn, id)?,
        (ApprovalKind::MedicalVisit, Decision::Approve) => {
            db::medical_visits::set_medical_visit_status(conn, id, VisitStatus::Approved)?
        }
        (ApprovalKind::MedicalVisit, Decision::Reject) => {
            db::medical_visits::set_medical_visit_status(conn, id, VisitStatus::Rejected)?
        }
    }
    tracing::info!(kind = kind.label(), id, ?decision, "approval decision applied");
    Ok(())
}

pub fn approve(conn: &Connection, kind: ApprovalKind, id: i64) -> TrackerResult<()> {
    decide(conn, kind, id, Decision::Approve)
}

pub fn reject(conn: &Connection, kind: ApprovalKind, id: i64) -> TrackerResult<()> {
    decide(conn, kind, id, Decision::Reject)
}
