//! Representative's personal dashboard.

use rusqlite::Connection;
use rust_decimal::Decimal;
use std::collections::HashSet;
use time::Date;

use super::{bucket_by_month, month_key, TrendPoint};
use crate::db;
use crate::error::TrackerResult;
use crate::models::{order_value, sum_money, VisitStatus, VisitWithDetails};

/// Number of entries in the recent-activity list.
pub const RECENT_VISITS: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct RecentVisit {
    pub visit_id: i64,
    pub doctor_name: String,
    pub visit_date: Date,
    pub status: VisitStatus,
    /// Sum of quantities over the visit's order lines.
    pub order_count: u32,
    pub order_value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MrDashboard {
    pub visits_this_month: usize,
    pub monthly_order_value: Decimal,
    /// Distinct doctor names over all fetched visits, not just this month.
    pub unique_doctors: usize,
    pub total_visits: usize,
    pub recent: Vec<RecentVisit>,
    pub trend: Vec<TrendPoint>,
}

impl MrDashboard {
    /// Aggregates a representative's visits, which must already be ordered
    /// newest first.
    pub fn from_visits(visits: &[VisitWithDetails], today: Date) -> Self {
        let current = month_key(today);

        let this_month: Vec<&VisitWithDetails> = visits
            .iter()
            .filter(|v| month_key(v.visit.visit_date) == current)
            .collect();

        let unique_doctors = visits
            .iter()
            .map(|v| v.doctor_name.as_str())
            .collect::<HashSet<_>>()
            .len();

        let recent = visits
            .iter()
            .take(RECENT_VISITS)
            .map(|v| RecentVisit {
                visit_id: v.visit.id,
                doctor_name: v.doctor_name.clone(),
                visit_date: v.visit.visit_date,
                status: v.visit.status,
                order_count: v
                    .orders
                    .iter()
                    .fold(0u32, |acc, o| acc.saturating_add(o.quantity)),
                order_value: order_value(&v.orders),
            })
            .collect();

        Self {
            visits_this_month: this_month.len(),
            monthly_order_value: sum_money(this_month.iter().map(|v| order_value(&v.orders))),
            unique_doctors,
            total_visits: visits.len(),
            recent,
            trend: bucket_by_month(
                visits
                    .iter()
                    .map(|v| (v.visit.visit_date, order_value(&v.orders))),
            ),
        }
    }

    pub fn load(conn: &Connection, rep_id: i64, today: Date) -> TrackerResult<Self> {
        let visits = db::visits::get_visits_for_rep(conn, rep_id)?;
        tracing::debug!(rep_id, visits = visits.len(), "representative visits fetched");
        Ok(Self::from_visits(&visits, today))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Visit, VisitOrder};
    use time::Month;

    fn date(year: i32, month: Month, day: u8) -> Date {
        Date::from_calendar_date(year, month, day).unwrap()
    }

    fn visit(id: i64, doctor: &str, on: Date, lines: &[(u32, i64)]) -> VisitWithDetails {
        VisitWithDetails {
            visit: Visit {
                id,
                doctor_id: 1,
                rep_id: 1,
                visit_date: on,
                hospital: String::new(),
                notes: String::new(),
                status: VisitStatus::Pending,
            },
            doctor_name: doctor.to_string(),
            orders: lines
                .iter()
                .enumerate()
                .map(|(i, &(quantity, cents))| VisitOrder {
                    id: id * 100 + i as i64,
                    visit_id: id,
                    medicine_id: 1,
                    quantity,
                    unit_price: Decimal::new(cents, 2),
                })
                .collect(),
        }
    }

    #[test]
    fn monthly_stats_respect_month_boundaries() {
        let today = date(2024, Month::March, 20);
        let visits = vec![
            visit(3, "Dr. A", date(2024, Month::March, 31), &[(1, 500)]),
            visit(2, "Dr. B", date(2024, Month::March, 1), &[(2, 1000)]),
            visit(1, "Dr. C", date(2024, Month::February, 29), &[(9, 10_000)]),
        ];
        let stats = MrDashboard::from_visits(&visits, today);
        assert_eq!(stats.visits_this_month, 2);
        assert_eq!(stats.monthly_order_value, Decimal::new(2500, 2));
    }

    #[test]
    fn same_month_in_other_year_is_excluded() {
        let today = date(2024, Month::March, 5);
        let visits = vec![visit(1, "Dr. A", date(2023, Month::March, 5), &[(1, 100)])];
        let stats = MrDashboard::from_visits(&visits, today);
        assert_eq!(stats.visits_this_month, 0);
        assert_eq!(stats.monthly_order_value, Decimal::ZERO);
    }

    #[test]
    fn unique_doctors_counts_all_time_names() {
        let today = date(2024, Month::March, 5);
        let visits = vec![
            visit(3, "Dr. A", date(2024, Month::March, 1), &[]),
            visit(2, "Dr. A", date(2023, Month::June, 1), &[]),
            visit(1, "Dr. B", date(2022, Month::June, 1), &[]),
        ];
        assert_eq!(MrDashboard::from_visits(&visits, today).unique_doctors, 2);
    }

    #[test]
    fn recent_keeps_fetch_order_and_limits_to_five() {
        let today = date(2024, Month::March, 5);
        let visits: Vec<_> = (1..=7)
            .rev()
            .map(|id| visit(id, "Dr. A", date(2024, Month::January, id as u8), &[(2, 150), (1, 100)]))
            .collect();
        let stats = MrDashboard::from_visits(&visits, today);
        let ids: Vec<i64> = stats.recent.iter().map(|r| r.visit_id).collect();
        assert_eq!(ids, vec![7, 6, 5, 4, 3]);
        assert_eq!(stats.recent[0].order_count, 3);
        assert_eq!(stats.recent[0].order_value, Decimal::new(400, 2));
    }

    #[test]
    fn trend_buckets_all_visits_ascending() {
        let today = date(2024, Month::March, 20);
        let visits = vec![
            visit(3, "Dr. A", date(2024, Month::March, 15), &[(1, 333)]),
            visit(2, "Dr. A", date(2024, Month::January, 2), &[]),
            visit(1, "Dr. A", date(2024, Month::March, 2), &[(1, 333)]),
        ];
        let stats = MrDashboard::from_visits(&visits, today);
        assert_eq!(stats.trend.len(), 2);
        assert_eq!(stats.trend[0].month, 1);
        assert_eq!(stats.trend[1].month, 3);
        assert_eq!(stats.trend[1].count, 2);
        assert_eq!(stats.trend[1].value, Decimal::new(666, 2));
    }
}
