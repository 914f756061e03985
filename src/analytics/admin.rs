//! Administrator dashboard: global totals, trailing trends, the
//! representative leaderboard and the unified approval queue.
//!
//! The collections are fetched independently and joined here in memory.

use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use time::Date;

use super::approvals::{pending_queue, PendingApproval};
use super::{bucket_trailing_months, TrendPoint};
use crate::db;
use crate::error::TrackerResult;
use crate::models::{
    order_value, sum_money, Doctor, MedicalVisit, Profile, ProfileStatus, Role, Visit, VisitOrder,
    VisitStatus,
};

/// Months covered by the admin trend charts, including the current one.
pub const TREND_MONTHS: usize = 6;

/// Report kind stored in the `reports` table.
pub const REPORT_KIND: &str = "admin_dashboard";

/// Everything the admin dashboard fetches, one query per collection.
#[derive(Debug, Clone, Default)]
pub struct AdminSources {
    pub profiles: Vec<Profile>,
    pub doctors: Vec<Doctor>,
    pub visits: Vec<Visit>,
    pub approved_visits: Vec<Visit>,
    pub orders: Vec<VisitOrder>,
    pub pending_visits: Vec<Visit>,
    pub pending_representatives: Vec<Profile>,
    pub unverified_doctors: Vec<Doctor>,
    pub pending_medical_visits: Vec<MedicalVisit>,
}

impl AdminSources {
    pub fn fetch(conn: &Connection) -> TrackerResult<Self> {
        let sources = Self {
            profiles: db::profiles::get_profiles(conn)?,
            doctors: db::doctors::get_all_doctors(conn)?,
            visits: db::visits::get_all_visits(conn)?,
            approved_visits: db::visits::get_visits_by_status(conn, VisitStatus::Approved)?,
            orders: db::visits::get_all_orders(conn)?,
            pending_visits: db::visits::get_visits_by_status(conn, VisitStatus::Pending)?,
            pending_representatives: db::profiles::get_pending_representatives(conn)?,
            unverified_doctors: db::doctors::get_unverified_doctors(conn)?,
            pending_medical_visits: db::medical_visits::get_medical_visits_by_status(
                conn,
                VisitStatus::Pending,
            )?,
        };
        tracing::debug!(
            profiles = sources.profiles.len(),
            visits = sources.visits.len(),
            orders = sources.orders.len(),
            "admin collections fetched"
        );
        Ok(sources)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AdminTotals {
    pub representatives: usize,
    pub active_representatives: usize,
    pub doctors: usize,
    pub visits: usize,
    /// Across every order line, whatever its visit's status.
    pub order_value: Decimal,
    /// Only order lines of approved visits.
    pub approved_order_value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub rep_id: i64,
    pub name: String,
    /// Approved visits only.
    pub visits: usize,
    pub order_value: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AdminDashboard {
    pub totals: AdminTotals,
    /// Visits per month, valued by their order lines.
    pub visit_trend: Vec<TrendPoint>,
    /// Order lines per month, dated by their parent visit.
    pub order_trend: Vec<TrendPoint>,
    pub leaderboard: Vec<LeaderboardEntry>,
    pub pending_count: usize,
    #[serde(skip)]
    pub pending: Vec<PendingApproval>,
}

fn order_value_by_visit(orders: &[VisitOrder]) -> HashMap<i64, Decimal> {
    let mut values: HashMap<i64, Decimal> = HashMap::new();
    for order in orders {
        let value = values.entry(order.visit_id).or_insert(Decimal::ZERO);
        *value = value.saturating_add(order.line_total());
    }
    values
}

pub fn totals(sources: &AdminSources) -> AdminTotals {
    let values = order_value_by_visit(&sources.orders);
    AdminTotals {
        representatives: sources.profiles.iter().filter(|p| p.role == Role::Mr).count(),
        active_representatives: active_representatives(&sources.profiles),
        doctors: sources.doctors.len(),
        visits: sources.visits.len(),
        order_value: order_value(&sources.orders),
        approved_order_value: sum_money(
            sources
                .approved_visits
                .iter()
                .filter_map(|v| values.get(&v.id).copied()),
        ),
    }
}

/// Ranks every representative by approved visit count, descending. Ties
/// keep the order of `profiles`.
pub fn leaderboard(
    profiles: &[Profile],
    approved_visits: &[Visit],
    orders: &[VisitOrder],
) -> Vec<LeaderboardEntry> {
    let values = order_value_by_visit(orders);
    let mut entries: Vec<LeaderboardEntry> = profiles
        .iter()
        .filter(|p| p.role == Role::Mr)
        .map(|rep| {
            let visits: Vec<&Visit> = approved_visits
                .iter()
                .filter(|v| v.rep_id == rep.id)
                .collect();
            LeaderboardEntry {
                rep_id: rep.id,
                name: rep.full_name.clone(),
                visits: visits.len(),
                order_value: sum_money(visits.iter().filter_map(|v| values.get(&v.id).copied())),
            }
        })
        .collect();
    entries.sort_by(|a, b| b.visits.cmp(&a.visits));
    entries
}

impl AdminDashboard {
    pub fn from_sources(sources: &AdminSources, today: Date) -> Self {
        let values = order_value_by_visit(&sources.orders);
        let visit_dates: HashMap<i64, Date> =
            sources.visits.iter().map(|v| (v.id, v.visit_date)).collect();

        let visit_trend = bucket_trailing_months(
            sources.visits.iter().map(|v| {
                (
                    v.visit_date,
                    values.get(&v.id).copied().unwrap_or(Decimal::ZERO),
                )
            }),
            today,
            TREND_MONTHS,
        );
        let order_trend = bucket_trailing_months(
            sources
                .orders
                .iter()
                .filter_map(|o| visit_dates.get(&o.visit_id).map(|d| (*d, o.line_total()))),
            today,
            TREND_MONTHS,
        );

        let pending = pending_queue(sources);

        Self {
            totals: totals(sources),
            visit_trend,
            order_trend,
            leaderboard: leaderboard(&sources.profiles, &sources.approved_visits, &sources.orders),
            pending_count: pending.len(),
            pending,
        }
    }

    pub fn load(conn: &Connection, today: Date) -> TrackerResult<Self> {
        let sources = AdminSources::fetch(conn)?;
        Ok(Self::from_sources(&sources, today))
    }

    /// Stores this dashboard as a JSON report and returns the report ID.
    pub fn save_report(&self, conn: &Connection, admin_id: i64) -> TrackerResult<i64> {
        let payload = serde_json::to_string(self).map_err(anyhow::Error::from)?;
        let id = db::reports::create_report(conn, admin_id, REPORT_KIND, &payload)?;
        tracing::info!(report_id = id, admin_id, "dashboard report saved");
        Ok(id)
    }
}

/// Representatives that can still submit visits.
pub fn active_representatives(profiles: &[Profile]) -> usize {
    profiles
        .iter()
        .filter(|p| p.role == Role::Mr && p.status == ProfileStatus::Active)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Month;

    fn rep(id: i64, name: &str) -> Profile {
        Profile {
            id,
            full_name: name.to_string(),
            email: format!("{id}@example.com"),
            role: Role::Mr,
            status: ProfileStatus::Active,
        }
    }

    fn visit(id: i64, rep_id: i64, status: VisitStatus, on: Date) -> Visit {
        Visit {
            id,
            doctor_id: 1,
            rep_id,
            visit_date: on,
            hospital: String::new(),
            notes: String::new(),
            status,
        }
    }

    fn order(visit_id: i64, quantity: u32, cents: i64) -> VisitOrder {
        VisitOrder {
            id: visit_id * 10,
            visit_id,
            medicine_id: 1,
            quantity,
            unit_price: Decimal::new(cents, 2),
        }
    }

    fn day(month: Month, d: u8) -> Date {
        Date::from_calendar_date(2024, month, d).unwrap()
    }

    #[test]
    fn leaderboard_is_stable_for_ties() {
        let profiles = vec![rep(1, "First"), rep(2, "Second"), rep(3, "Third")];
        let mut approved = Vec::new();
        let mut id = 0;
        for (rep_id, count) in [(3, 3), (1, 5), (2, 5)] {
            for _ in 0..count {
                id += 1;
                approved.push(visit(id, rep_id, VisitStatus::Approved, day(Month::May, 1)));
            }
        }

        let board = leaderboard(&profiles, &approved, &[]);
        let names: Vec<&str> = board.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["First", "Second", "Third"]);
        assert_eq!(board[2].visits, 3);
    }

    #[test]
    fn leaderboard_sums_only_approved_orders() {
        let profiles = vec![rep(1, "Solo")];
        let approved = vec![visit(1, 1, VisitStatus::Approved, day(Month::May, 1))];
        let orders = vec![order(1, 2, 1000), order(2, 5, 1000)];
        let board = leaderboard(&profiles, &approved, &orders);
        assert_eq!(board[0].order_value, Decimal::new(2000, 2));
    }

    #[test]
    fn totals_include_orders_of_every_status() {
        let mut admin = rep(9, "Admin");
        admin.role = Role::Admin;
        let sources = AdminSources {
            profiles: vec![rep(1, "A"), rep(2, "B"), admin],
            visits: vec![
                visit(1, 1, VisitStatus::Approved, day(Month::May, 1)),
                visit(2, 1, VisitStatus::Rejected, day(Month::May, 2)),
                visit(3, 2, VisitStatus::Pending, day(Month::May, 3)),
            ],
            approved_visits: vec![visit(1, 1, VisitStatus::Approved, day(Month::May, 1))],
            orders: vec![order(1, 1, 1000), order(2, 1, 2000), order(3, 1, 4000)],
            ..AdminSources::default()
        };
        let totals = totals(&sources);
        assert_eq!(totals.representatives, 2);
        assert_eq!(totals.visits, 3);
        assert_eq!(totals.order_value, Decimal::new(7000, 2));
        assert_eq!(totals.approved_order_value, Decimal::new(1000, 2));
    }

    #[test]
    fn trends_use_trailing_window_and_order_lines() {
        let sources = AdminSources {
            visits: vec![
                visit(1, 1, VisitStatus::Approved, day(Month::June, 3)),
                visit(2, 1, VisitStatus::Pending, day(Month::June, 9)),
                visit(3, 1, VisitStatus::Pending, day(Month::January, 9)),
            ],
            orders: vec![order(1, 1, 500), order(2, 2, 500), order(3, 1, 500)],
            ..AdminSources::default()
        };
        let dashboard = AdminDashboard::from_sources(&sources, day(Month::June, 20));

        assert_eq!(dashboard.visit_trend.len(), TREND_MONTHS);
        assert_eq!(dashboard.visit_trend[0].label(), "Jan 2024");
        assert_eq!(dashboard.visit_trend[5].count, 2);
        assert_eq!(dashboard.visit_trend[5].value, Decimal::new(1500, 2));
        assert_eq!(dashboard.order_trend[5].count, 2);
        assert_eq!(dashboard.order_trend[0].count, 1);
    }

    #[test]
    fn active_representatives_skips_pending_and_admins() {
        let mut pending = rep(2, "P");
        pending.status = ProfileStatus::Pending;
        assert_eq!(active_representatives(&[rep(1, "A"), pending]), 1);
    }
}
