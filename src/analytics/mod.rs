//! Dashboard aggregation over fetched rows.
//!
//! Every dashboard is a pure function of the collections it fetched plus the
//! current date; screens re-run the whole aggregation after each mutation.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use time::{Date, OffsetDateTime};

pub mod admin;
pub mod approvals;
pub mod mr;

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Today's date on the local calendar, falling back to UTC when the local
/// offset cannot be determined.
pub fn local_today() -> Date {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .date()
}

/// `(year, month)` with months numbered 1-12.
pub type MonthKey = (i32, u8);

pub fn month_key(date: Date) -> MonthKey {
    (date.year(), u8::from(date.month()))
}

/// The month before `key`.
pub fn previous_month((year, month): MonthKey) -> MonthKey {
    if month <= 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

/// One month of a trend series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub year: i32,
    pub month: u8,
    pub count: usize,
    /// Rounded to two decimal places.
    pub value: Decimal,
}

impl TrendPoint {
    /// Short label such as "Mar 2024".
    pub fn label(&self) -> String {
        let name = usize::from(self.month)
            .checked_sub(1)
            .and_then(|idx| MONTH_ABBREVIATIONS.get(idx))
            .copied()
            .unwrap_or("???");
        format!("{name} {}", self.year)
    }
}

/// Groups dated values by calendar month, ascending by month.
pub fn bucket_by_month(items: impl IntoIterator<Item = (Date, Decimal)>) -> Vec<TrendPoint> {
    let mut buckets: BTreeMap<MonthKey, (usize, Decimal)> = BTreeMap::new();
    for (date, value) in items {
        let entry = buckets.entry(month_key(date)).or_insert((0, Decimal::ZERO));
        entry.0 += 1;
        entry.1 = entry.1.saturating_add(value);
    }
    buckets
        .into_iter()
        .map(|((year, month), (count, value))| TrendPoint {
            year,
            month,
            count,
            value: value.round_dp(2),
        })
        .collect()
}

/// Like [`bucket_by_month`] but restricted to the `months` calendar months
/// ending with the month of `today`; months without data are emitted with
/// zero count and value.
pub fn bucket_trailing_months(
    items: impl IntoIterator<Item = (Date, Decimal)>,
    today: Date,
    months: usize,
) -> Vec<TrendPoint> {
    let mut window = Vec::with_capacity(months);
    let mut key = month_key(today);
    for _ in 0..months {
        window.push(key);
        key = previous_month(key);
    }
    window.reverse();

    let (Some(first), Some(last)) = (window.first().copied(), window.last().copied()) else {
        return Vec::new();
    };

    let present = bucket_by_month(items.into_iter().filter(|(date, _)| {
        let key = month_key(*date);
        key >= first && key <= last
    }));

    window
        .into_iter()
        .map(|(year, month)| {
            present
                .iter()
                .find(|p| p.year == year && p.month == month)
                .cloned()
                .unwrap_or(TrendPoint {
                    year,
                    month,
                    count: 0,
                    value: Decimal::ZERO,
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Month;

    fn date(year: i32, month: Month, day: u8) -> Date {
        Date::from_calendar_date(year, month, day).unwrap()
    }

    #[test]
    fn buckets_sort_by_month_regardless_of_input_order() {
        let points = bucket_by_month([
            (date(2024, Month::March, 15), Decimal::ONE),
            (date(2024, Month::January, 2), Decimal::ONE),
            (date(2024, Month::March, 2), Decimal::ONE),
        ]);
        assert_eq!(points.len(), 2);
        assert_eq!((points[0].year, points[0].month, points[0].count), (2024, 1, 1));
        assert_eq!((points[1].year, points[1].month, points[1].count), (2024, 3, 2));
        assert_eq!(points[1].label(), "Mar 2024");
    }

    #[test]
    fn bucket_values_round_to_cents() {
        let points = bucket_by_month([
            (date(2023, Month::December, 1), Decimal::new(10_005, 3)),
            (date(2023, Month::December, 9), Decimal::new(1, 3)),
        ]);
        assert_eq!(points[0].value, Decimal::new(1001, 2));
    }

    #[test]
    fn year_boundary_sorts_december_before_january() {
        let points = bucket_by_month([
            (date(2024, Month::January, 3), Decimal::ZERO),
            (date(2023, Month::December, 30), Decimal::ZERO),
        ]);
        assert_eq!(points[0].label(), "Dec 2023");
        assert_eq!(points[1].label(), "Jan 2024");
    }

    #[test]
    fn trailing_window_covers_six_months_and_zero_fills() {
        let today = date(2024, Month::February, 10);
        let points = bucket_trailing_months(
            [
                (date(2024, Month::February, 1), Decimal::TEN),
                (date(2023, Month::September, 30), Decimal::ONE),
                (date(2023, Month::August, 31), Decimal::ONE),
                (date(2024, Month::March, 1), Decimal::ONE),
            ],
            today,
            6,
        );
        let labels: Vec<String> = points.iter().map(TrendPoint::label).collect();
        assert_eq!(
            labels,
            vec!["Sep 2023", "Oct 2023", "Nov 2023", "Dec 2023", "Jan 2024", "Feb 2024"]
        );
        let counts: Vec<usize> = points.iter().map(|p| p.count).collect();
        assert_eq!(counts, vec![1, 0, 0, 0, 0, 1]);
        assert_eq!(points[5].value, Decimal::TEN);
    }
}
