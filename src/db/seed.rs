//! Demo data for `--seed-demo`.

use anyhow::{Context, Result};
use rusqlite::Connection;
use rust_decimal::Decimal;
use time::{Date, Duration};

use super::{doctors, medical_visits, medicines, profiles, visits};
use crate::models::{MedicineInput, NewDoctor, NewVisit, ProfileStatus, Role, VisitStatus};

/// Password given to every seeded representative.
pub const DEMO_PASSWORD: &str = "password";

/// Fills an empty database with representatives, doctors, medicines and
/// visits spread over the last few months. Does nothing if any
/// representative already exists.
///
/// Returns `true` if data was inserted.
pub fn seed_demo(conn: &Connection, today: Date) -> Result<bool> {
    let reps: i64 = conn.query_row(
        "SELECT COUNT(*) FROM profiles WHERE role = ?",
        [Role::Mr.as_str()],
        |row| row.get(0),
    )?;
    if reps > 0 {
        tracing::info!("demo seed skipped, representatives already exist");
        return Ok(false);
    }

    let priya = profiles::create_profile(
        conn,
        "Priya Nair",
        "priya@fieldtrack.local",
        DEMO_PASSWORD,
        Role::Mr,
        ProfileStatus::Active,
    )?;
    let karan = profiles::create_profile(
        conn,
        "Karan Singh",
        "karan@fieldtrack.local",
        DEMO_PASSWORD,
        Role::Mr,
        ProfileStatus::Active,
    )?;
    profiles::create_profile(
        conn,
        "Meera Joshi",
        "meera@fieldtrack.local",
        DEMO_PASSWORD,
        Role::Mr,
        ProfileStatus::Pending,
    )?;

    let mut doctor_ids = Vec::new();
    for (name, specialization, hospital, verified) in [
        ("Dr. Anil Kapoor", "Cardiology", "Apollo Heart Centre", true),
        ("Dr. Sunita Rao", "Pediatrics", "Rainbow Children's Clinic", true),
        ("Dr. Vikram Das", "General Medicine", "City Care Hospital", false),
    ] {
        let doctor = doctors::create_doctor(
            conn,
            &NewDoctor {
                name: name.to_string(),
                specialization: specialization.to_string(),
                hospital: hospital.to_string(),
                created_by: Some(priya),
            },
        )?;
        if verified {
            doctors::verify_doctor(conn, doctor.id)?;
        }
        doctor_ids.push(doctor.id);
    }

    let mut medicine_prices = Vec::new();
    for (name, category, medicine_type, dosage, pack, cents, stock) in [
        ("Cardiostat", "Cardiovascular", "Tablet", "10mg", "30 tablets", 24_500, 120),
        ("Paracip", "Analgesic", "Tablet", "500mg", "10 tablets", 3_200, 400),
        ("Amoxil Kid", "Antibiotic", "Syrup", "125mg/5ml", "60ml", 8_950, 75),
        ("Glucofine", "Antidiabetic", "Tablet", "500mg", "20 tablets", 11_000, 200),
    ] {
        let medicine = medicines::create_medicine(
            conn,
            &MedicineInput {
                name: name.to_string(),
                category: category.to_string(),
                medicine_type: medicine_type.to_string(),
                dosage: dosage.to_string(),
                pack_size: pack.to_string(),
                price: Decimal::new(cents, 2),
                stock,
                description: None,
            },
        )?;
        medicine_prices.push((medicine.id, medicine.price));
    }

    let plan: [(i64, usize, i64, VisitStatus, &[(usize, u32)]); 7] = [
        (priya, 0, 2, VisitStatus::Pending, &[(0, 4), (1, 10)]),
        (priya, 1, 9, VisitStatus::Approved, &[(2, 6)]),
        (priya, 0, 38, VisitStatus::Approved, &[(0, 2), (3, 5)]),
        (priya, 2, 70, VisitStatus::Rejected, &[(1, 3)]),
        (karan, 1, 5, VisitStatus::Approved, &[(2, 2)]),
        (karan, 0, 45, VisitStatus::Approved, &[(0, 1)]),
        (karan, 1, 100, VisitStatus::Pending, &[(3, 8)]),
    ];

    for (rep_id, doctor_idx, days_ago, status, lines) in plan {
        let visit_id = visits::create_visit(
            conn,
            &NewVisit {
                doctor_id: doctor_ids[doctor_idx],
                rep_id,
                visit_date: today.saturating_sub(Duration::days(days_ago)),
                hospital: String::new(),
                notes: "Demo visit".to_string(),
            },
        )?;
        for &(medicine_idx, quantity) in lines {
            let (medicine_id, price) = medicine_prices[medicine_idx];
            visits::create_visit_order(conn, visit_id, medicine_id, quantity, price)?;
        }
        if status != VisitStatus::Pending {
            visits::set_visit_status(conn, visit_id, status)?;
        }
    }

    medical_visits::create_medical_visit(
        conn,
        karan,
        today.saturating_sub(Duration::days(1)),
        "Camp at district hospital",
    )
    .context("Failed to seed medical visit")?;

    tracing::info!("demo data seeded");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use time::Month;

    #[test]
    fn seeds_once() {
        let conn = open_memory_database().unwrap();
        let today = Date::from_calendar_date(2024, Month::June, 15).unwrap();
        assert!(seed_demo(&conn, today).unwrap());
        assert!(!seed_demo(&conn, today).unwrap());
        assert_eq!(visits::get_all_visits(&conn).unwrap().len(), 7);
        assert_eq!(doctors::get_unverified_doctors(&conn).unwrap().len(), 1);
    }
}
