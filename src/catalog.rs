//! Medicine catalog: a full snapshot of the `medicines` table with
//! client-side search and create/update/delete that patch the snapshot with
//! the row the database returns.

use rusqlite::Connection;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::db;
use crate::error::{TrackerError, TrackerResult};
use crate::models::{Medicine, MedicineInput};

/// Largest accepted unit price, in rupees.
pub const MAX_UNIT_PRICE: i64 = 10_000_000;

/// Raw medicine fields as typed into the editor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MedicineForm {
    pub name: String,
    pub category: String,
    pub medicine_type: String,
    pub dosage: String,
    pub pack_size: String,
    pub price: String,
    pub stock: String,
    pub description: String,
}

impl MedicineForm {
    pub fn from_medicine(medicine: &Medicine) -> Self {
        Self {
            name: medicine.name.clone(),
            category: medicine.category.clone(),
            medicine_type: medicine.medicine_type.clone(),
            dosage: medicine.dosage.clone(),
            pack_size: medicine.pack_size.clone(),
            price: medicine.price.to_string(),
            stock: medicine.stock.to_string(),
            description: medicine.description.clone().unwrap_or_default(),
        }
    }

    /// Checks mandatory fields and parses numbers.
    ///
    /// Name, category, dosage and price are required. Price must be a
    /// positive number no larger than [`MAX_UNIT_PRICE`]; stock, when given, a non-negative whole number
    /// (blank means 0). A blank pack size becomes "1".
    pub fn validate(&self) -> TrackerResult<MedicineInput> {
        let name = self.name.trim();
        let category = self.category.trim();
        let dosage = self.dosage.trim();
        let price = self.price.trim();

        if name.is_empty() || category.is_empty() || dosage.is_empty() || price.is_empty() {
            return Err(TrackerError::validation(
                "Name, category, dosage and price are required.",
            ));
        }

        let price = Decimal::from_str(price)
            .ok()
            .filter(|p| p.is_sign_positive() && !p.is_zero())
            .ok_or_else(|| TrackerError::validation("Price must be a positive number."))?;
        if price > Decimal::from(MAX_UNIT_PRICE) {
            return Err(TrackerError::validation(format!(
                "Price must be at most {MAX_UNIT_PRICE}."
            )));
        }

        let stock = match self.stock.trim() {
            "" => 0,
            raw => raw.parse::<u32>().map_err(|_| {
                TrackerError::validation("Stock must be a non-negative whole number.")
            })?,
        };

        let pack_size = match self.pack_size.trim() {
            "" => "1".to_string(),
            raw => raw.to_string(),
        };

        let description = Some(self.description.trim())
            .filter(|d| !d.is_empty())
            .map(str::to_string);

        Ok(MedicineInput {
            name: name.to_string(),
            category: category.to_string(),
            medicine_type: self.medicine_type.trim().to_string(),
            dosage: dosage.to_string(),
            pack_size,
            price,
            stock,
            description,
        })
    }
}

/// Case-insensitive substring match on name, category or type.
/// An empty term matches everything.
pub fn matches_search(medicine: &Medicine, term: &str) -> bool {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return true;
    }
    [&medicine.name, &medicine.category, &medicine.medicine_type]
        .iter()
        .any(|field| field.to_lowercase().contains(&term))
}

/// In-memory copy of the catalog owned by one screen.
#[derive(Debug, Clone, Default)]
pub struct MedicineCatalog {
    medicines: Vec<Medicine>,
}

impl MedicineCatalog {
    /// Fetches the whole `medicines` table.
    pub fn load(conn: &Connection) -> TrackerResult<Self> {
        let medicines = db::medicines::get_all_medicines(conn)?;
        tracing::debug!(count = medicines.len(), "catalog loaded");
        Ok(Self { medicines })
    }

    pub fn medicines(&self) -> &[Medicine] {
        &self.medicines
    }

    pub fn search(&self, term: &str) -> Vec<&Medicine> {
        self.medicines
            .iter()
            .filter(|m| matches_search(m, term))
            .collect()
    }

    /// Validates and inserts a medicine, then appends the stored row.
    pub fn create(&mut self, conn: &Connection, form: &MedicineForm) -> TrackerResult<&Medicine> {
        let input = form.validate()?;
        let created = db::medicines::create_medicine(conn, &input)?;
        tracing::info!(medicine_id = created.id, name = %created.name, "medicine created");
        let index = self.medicines.len();
        self.medicines.push(created);
        Ok(&self.medicines[index])
    }

    /// Validates and updates a medicine, replacing the local entry with the
    /// stored row.
    pub fn update(
        &mut self,
        conn: &Connection,
        medicine_id: i64,
        form: &MedicineForm,
    ) -> TrackerResult<&Medicine> {
        let input = form.validate()?;
        let updated = db::medicines::update_medicine(conn, medicine_id, &input)?;
        tracing::info!(medicine_id, "medicine updated");
        match self.medicines.iter().position(|m| m.id == medicine_id) {
            Some(index) => {
                self.medicines[index] = updated;
                Ok(&self.medicines[index])
            }
            None => {
                let index = self.medicines.len();
                self.medicines.push(updated);
                Ok(&self.medicines[index])
            }
        }
    }

    /// Deletes a medicine and drops it from the snapshot.
    pub fn delete(&mut self, conn: &Connection, medicine_id: i64) -> TrackerResult<()> {
        db::medicines::delete_medicine(conn, medicine_id)?;
        tracing::info!(medicine_id, "medicine deleted");
        self.medicines.retain(|m| m.id != medicine_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{doctors, open_memory_database, profiles, visits};
    use crate::models::{NewDoctor, NewVisit, ProfileStatus, Role};
    use time::{Date, Month};

    fn form(name: &str, price: &str) -> MedicineForm {
        MedicineForm {
            name: name.into(),
            category: "Cardiovascular".into(),
            medicine_type: "Tablet".into(),
            dosage: "10mg".into(),
            price: price.into(),
            ..MedicineForm::default()
        }
    }

    #[test]
    fn validate_applies_defaults() {
        let input = form("Cardiostat", "12.50").validate().unwrap();
        assert_eq!(input.pack_size, "1");
        assert_eq!(input.stock, 0);
        assert_eq!(input.price, Decimal::new(1250, 2));
        assert_eq!(input.description, None);
    }

    #[test]
    fn validate_rejects_bad_numbers_and_missing_fields() {
        for price in ["0", "-3", "abc"] {
            assert!(matches!(
                form("X", price).validate(),
                Err(TrackerError::Validation(_))
            ));
        }

        let mut bad_stock = form("X", "1");
        bad_stock.stock = "-1".into();
        assert!(bad_stock.validate().is_err());
        bad_stock.stock = "2.5".into();
        assert!(bad_stock.validate().is_err());

        let mut missing = form("X", "1");
        missing.dosage = "  ".into();
        assert!(missing.validate().is_err());
    }

    #[test]
    fn price_above_limit_is_rejected() {
        let err = form("X", "79228162514264337593543950335").validate().unwrap_err();
        assert_eq!(err.to_string(), "Price must be at most 10000000.");
        assert!(form("X", "10000000.01").validate().is_err());
        assert_eq!(
            form("X", "10000000").validate().unwrap().price,
            Decimal::from(MAX_UNIT_PRICE)
        );
    }

    #[test]
    fn search_is_case_insensitive_across_name_category_and_type() {
        let conn = open_memory_database().unwrap();
        let mut catalog = MedicineCatalog::default();
        catalog.create(&conn, &form("Cardiostat", "10")).unwrap();
        let mut syrup = form("Coughex", "5");
        syrup.category = "Respiratory".into();
        syrup.medicine_type = "Syrup".into();
        catalog.create(&conn, &syrup).unwrap();

        let names = |term: &str| -> Vec<String> {
            catalog.search(term).iter().map(|m| m.name.clone()).collect()
        };
        assert_eq!(names("CARDIO"), vec!["Cardiostat"]);
        assert_eq!(names("syr"), vec!["Coughex"]);
        assert_eq!(names("respir"), vec!["Coughex"]);
        assert_eq!(names("").len(), 2);
        assert!(names("insulin").is_empty());
    }

    #[test]
    fn create_update_delete_patch_the_snapshot() {
        let conn = open_memory_database().unwrap();
        let mut catalog = MedicineCatalog::load(&conn).unwrap();
        let id = catalog.create(&conn, &form("Paracip", "3.20")).unwrap().id;
        assert_eq!(catalog.medicines().len(), 1);

        let updated = catalog.update(&conn, id, &form("Paracip XL", "4.00")).unwrap();
        assert_eq!(updated.name, "Paracip XL");
        assert_eq!(catalog.medicines().len(), 1);

        catalog.delete(&conn, id).unwrap();
        assert!(catalog.medicines().is_empty());
    }

    #[test]
    fn invalid_update_leaves_snapshot_unchanged() {
        let conn = open_memory_database().unwrap();
        let mut catalog = MedicineCatalog::default();
        let id = catalog.create(&conn, &form("Paracip", "3.20")).unwrap().id;
        let before = catalog.medicines().to_vec();

        assert!(catalog.update(&conn, id, &form("Paracip", "free")).is_err());
        assert_eq!(catalog.medicines(), before.as_slice());
    }

    #[test]
    fn delete_of_ordered_medicine_surfaces_remote_error() {
        let conn = open_memory_database().unwrap();
        let mut catalog = MedicineCatalog::default();
        let medicine = catalog.create(&conn, &form("Cardiostat", "10")).unwrap().clone();

        let rep = profiles::create_profile(
            &conn,
            "Rep",
            "rep@example.com",
            "pw",
            Role::Mr,
            ProfileStatus::Active,
        )
        .unwrap();
        let doctor = doctors::create_doctor(
            &conn,
            &NewDoctor {
                name: "Dr. Roy".into(),
                specialization: String::new(),
                hospital: String::new(),
                created_by: None,
            },
        )
        .unwrap();
        let visit = visits::create_visit(
            &conn,
            &NewVisit {
                doctor_id: doctor.id,
                rep_id: rep,
                visit_date: Date::from_calendar_date(2024, Month::January, 5).unwrap(),
                hospital: String::new(),
                notes: String::new(),
            },
        )
        .unwrap();
        visits::create_visit_order(&conn, visit, medicine.id, 1, medicine.price).unwrap();

        let err = catalog.delete(&conn, medicine.id).unwrap_err();
        assert!(matches!(err, TrackerError::Remote(_)));
        assert_eq!(catalog.medicines().len(), 1);
    }
}
