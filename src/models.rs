//! Data models for FieldTrack.
//!
//! Field names and status strings mirror the columns of the backing tables,
//! so the `as_str`/`parse` pairs below are the wire vocabulary.

use rust_decimal::Decimal;
use serde::Serialize;
use time::Date;

/// Role of a signed-in profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    /// A medical representative working in the field.
    Mr,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Mr => "mr",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "admin" => Some(Role::Admin),
            "mr" => Some(Role::Mr),
            _ => None,
        }
    }
}

/// Activation status of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileStatus {
    Pending,
    Active,
    Inactive,
}

impl ProfileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileStatus::Pending => "pending",
            ProfileStatus::Active => "active",
            ProfileStatus::Inactive => "inactive",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(ProfileStatus::Pending),
            "active" => Some(ProfileStatus::Active),
            "inactive" => Some(ProfileStatus::Inactive),
            _ => None,
        }
    }
}

/// Lifecycle status shared by visits and medical visits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VisitStatus {
    Pending,
    Approved,
    Rejected,
}

impl VisitStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VisitStatus::Pending => "pending",
            VisitStatus::Approved => "approved",
            VisitStatus::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(VisitStatus::Pending),
            "approved" => Some(VisitStatus::Approved),
            "rejected" => Some(VisitStatus::Rejected),
            _ => None,
        }
    }
}

/// A user of the system, either an administrator or a representative.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub role: Role,
    pub status: ProfileStatus,
}

/// A doctor that representatives visit. Unverified doctors await approval.
#[derive(Debug, Clone, PartialEq)]
pub struct Doctor {
    pub id: i64,
    pub name: String,
    pub specialization: String,
    pub hospital: String,
    pub is_verified: bool,
}

/// Fields for inserting a doctor.
#[derive(Debug, Clone)]
pub struct NewDoctor {
    pub name: String,
    pub specialization: String,
    pub hospital: String,
    pub created_by: Option<i64>,
}

/// A medicine in the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct Medicine {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub medicine_type: String,
    pub dosage: String,
    /// Free text, e.g. "10 tablets".
    pub pack_size: String,
    pub price: Decimal,
    pub stock: u32,
    pub description: Option<String>,
}

/// Validated fields for inserting or updating a medicine.
#[derive(Debug, Clone, PartialEq)]
pub struct MedicineInput {
    pub name: String,
    pub category: String,
    pub medicine_type: String,
    pub dosage: String,
    pub pack_size: String,
    pub price: Decimal,
    pub stock: u32,
    pub description: Option<String>,
}

/// A dated meeting between a representative and a doctor.
#[derive(Debug, Clone, PartialEq)]
pub struct Visit {
    pub id: i64,
    pub doctor_id: i64,
    pub rep_id: i64,
    pub visit_date: Date,
    pub hospital: String,
    pub notes: String,
    pub status: VisitStatus,
}

/// Fields for inserting a visit. The status is always `pending` on insert.
#[derive(Debug, Clone)]
pub struct NewVisit {
    pub doctor_id: i64,
    pub rep_id: i64,
    pub visit_date: Date,
    pub hospital: String,
    pub notes: String,
}

/// An order line attached to a visit.
///
/// `unit_price` is the medicine's price when the order was taken and never
/// follows later price edits.
#[derive(Debug, Clone, PartialEq)]
pub struct VisitOrder {
    pub id: i64,
    pub visit_id: i64,
    pub medicine_id: i64,
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl VisitOrder {
    /// Quantity x unit price, saturating at `Decimal::MAX` for rows that
    /// were written outside the form limits.
    pub fn line_total(&self) -> Decimal {
        Decimal::from(self.quantity).saturating_mul(self.unit_price)
    }
}

/// Saturating sum of money values.
pub fn sum_money(values: impl IntoIterator<Item = Decimal>) -> Decimal {
    values
        .into_iter()
        .fold(Decimal::ZERO, |acc, value| acc.saturating_add(value))
}

/// Sum of quantity x unit price over a set of order lines.
pub fn order_value(orders: &[VisitOrder]) -> Decimal {
    sum_money(orders.iter().map(VisitOrder::line_total))
}

/// A visit joined with its doctor's name and its order lines.
#[derive(Debug, Clone, PartialEq)]
pub struct VisitWithDetails {
    pub visit: Visit,
    pub doctor_name: String,
    pub orders: Vec<VisitOrder>,
}

/// Secondary approval entity, separate from `Visit`.
#[derive(Debug, Clone, PartialEq)]
pub struct MedicalVisit {
    pub id: i64,
    pub rep_id: i64,
    pub visit_date: Date,
    pub notes: String,
    pub status: VisitStatus,
}

/// A stored dashboard snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub id: i64,
    pub created_by: i64,
    pub kind: String,
    pub payload: String,
    pub created_at: String,
}
