//! Visit logging: staging order lines in memory and submitting a visit.
//!
//! Order lines are staged against the catalog snapshot the form fetched and
//! keep the price seen at that moment. Submission writes the visit first and
//! then one order row per staged line; a failure part-way leaves earlier
//! rows in place and reports the error.

use rusqlite::Connection;
use rust_decimal::Decimal;
use time::Date;

use crate::db;
use crate::error::{TrackerError, TrackerResult};
use crate::models::{sum_money, Doctor, Medicine, NewVisit, Profile, ProfileStatus};

/// Largest quantity accepted on a single order line.
pub const MAX_ORDER_QUANTITY: u32 = 100_000;

/// An order line held in memory until the visit is submitted.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedOrder {
    pub medicine_id: i64,
    pub name: String,
    pub pack_size: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub line_total: Decimal,
}

/// Ordered list of staged order lines.
#[derive(Debug, Clone, Default)]
pub struct OrderStage {
    lines: Vec<StagedOrder>,
}

impl OrderStage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages `quantity` units of a medicine from the fetched catalog.
    ///
    /// # Errors
    ///
    /// `Validation` if the quantity is outside 1..=[`MAX_ORDER_QUANTITY`] or
    /// the line would push the running total out of range, `NotFound` if the
    /// medicine is not in `catalog`. The staged list is left untouched on
    /// error.
    pub fn add_order(
        &mut self,
        catalog: &[Medicine],
        medicine_id: i64,
        quantity: i64,
    ) -> TrackerResult<&StagedOrder> {
        if quantity < 1 {
            return Err(TrackerError::validation("Quantity must be at least 1."));
        }
        let quantity = u32::try_from(quantity)
            .ok()
            .filter(|q| *q <= MAX_ORDER_QUANTITY)
            .ok_or_else(|| {
                TrackerError::validation(format!(
                    "Quantity must be at most {MAX_ORDER_QUANTITY}."
                ))
            })?;

        let medicine = catalog
            .iter()
            .find(|m| m.id == medicine_id)
            .ok_or_else(|| TrackerError::NotFound("Medicine".into()))?;

        let line_total = Decimal::from(quantity)
            .checked_mul(medicine.price)
            .filter(|total| self.total().checked_add(*total).is_some())
            .ok_or_else(|| TrackerError::validation("Order value is too large."))?;

        let index = self.lines.len();
        self.lines.push(StagedOrder {
            medicine_id: medicine.id,
            name: medicine.name.clone(),
            pack_size: medicine.pack_size.clone(),
            unit_price: medicine.price,
            quantity,
            line_total,
        });
        Ok(&self.lines[index])
    }

    /// Removes the line at `index`, if any.
    pub fn remove_order(&mut self, index: usize) -> Option<StagedOrder> {
        if index < self.lines.len() {
            Some(self.lines.remove(index))
        } else {
            None
        }
    }

    pub fn lines(&self) -> &[StagedOrder] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Running total over all staged lines.
    pub fn total(&self) -> Decimal {
        sum_money(self.lines.iter().map(|line| line.line_total))
    }
}

/// Visit metadata as typed into the form.
#[derive(Debug, Clone, Default)]
pub struct VisitDraft {
    pub doctor_id: Option<i64>,
    /// `YYYY-MM-DD`.
    pub visit_date: String,
    pub hospital: String,
    pub notes: String,
}

impl VisitDraft {
    pub fn new(today: Date) -> Self {
        Self {
            visit_date: db::format_date(today).unwrap_or_default(),
            ..Self::default()
        }
    }

    /// Selects a doctor and copies their hospital into the hospital field.
    /// The field stays editable; later edits are not overwritten.
    pub fn select_doctor(&mut self, doctor: &Doctor) {
        self.doctor_id = Some(doctor.id);
        self.hospital = doctor.hospital.clone();
    }
}

/// Persists a visit and its staged order lines.
///
/// Nothing is written when the representative is missing or not active, the
/// stage is empty, or the draft is incomplete. The visit is always inserted
/// as `pending`. Returns the new visit's ID.
pub fn submit_visit(
    conn: &Connection,
    rep: Option<&Profile>,
    draft: &VisitDraft,
    stage: &OrderStage,
) -> TrackerResult<i64> {
    let rep = rep.ok_or(TrackerError::Unauthenticated)?;
    if rep.status != ProfileStatus::Active {
        tracing::warn!(rep_id = rep.id, status = rep.status.as_str(), "visit submission blocked");
        return Err(TrackerError::AccountInactive(rep.status.as_str()));
    }
    if stage.is_empty() {
        return Err(TrackerError::validation("Add at least one order before submitting."));
    }
    let doctor_id = draft
        .doctor_id
        .ok_or_else(|| TrackerError::validation("Select a doctor."))?;
    let visit_date = db::parse_date(&draft.visit_date)
        .map_err(|_| TrackerError::validation("Visit date must be in YYYY-MM-DD format."))?;

    let visit_id = db::visits::create_visit(
        conn,
        &NewVisit {
            doctor_id,
            rep_id: rep.id,
            visit_date,
            hospital: draft.hospital.trim().to_string(),
            notes: draft.notes.trim().to_string(),
        },
    )?;

    for line in stage.lines() {
        if let Err(e) = db::visits::create_visit_order(
            conn,
            visit_id,
            line.medicine_id,
            line.quantity,
            line.unit_price,
        ) {
            tracing::warn!(visit_id, error = %e, "order insert failed after visit insert");
            return Err(e.into());
        }
    }

    tracing::info!(visit_id, rep_id = rep.id, orders = stage.len(), "visit submitted");
    Ok(visit_id)
}
