use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, Months, NaiveDate};
use rusqlite::Connection;
use serde::Serialize;

use crate::categories::{get_category, list_categories};
use crate::error::Result;
use crate::models::{TaskCategory, DATE_FORMAT};

/// Per-task total used by every aggregate. `batch_count` is not part of it.
const TASK_TOTAL: &str =
    "COALESCE(t.claim_count, 0) + COALESCE(t.sheet_count, 0) + COALESCE(t.email, 0) + COALESCE(t.form, 0)";

// ---------------------------------------------------------------------------
// Totals
// ---------------------------------------------------------------------------

/// Sum of task totals for one category over reports dated `date`.
pub fn period_total(conn: &Connection, category_id: i64, date: NaiveDate) -> Result<i64> {
    range_total(conn, category_id, date, date)
}

/// Sum of task totals for one category over reports dated within
/// `start..=end`.
pub fn range_total(conn: &Connection, category_id: i64, start: NaiveDate, end: NaiveDate) -> Result<i64> {
    let sql = format!(
        "SELECT COALESCE(SUM({TASK_TOTAL}), 0) \
         FROM report_tasks t JOIN daily_reports r ON r.id = t.daily_report_id \
         WHERE t.task_category_id = ?1 AND r.report_date BETWEEN ?2 AND ?3"
    );
    let mut stmt = conn.prepare_cached(&sql)?;
    let total = stmt.query_row(rusqlite::params![category_id, start, end], |row| row.get(0))?;
    Ok(total)
}

/// Percentage change from `previous` to `current`, rounded to two decimals.
///
/// Any growth from a zero baseline counts as 100.
pub fn percent_change(current: i64, previous: i64) -> f64 {
    if previous == 0 {
        return if current > 0 { 100.0 } else { 0.0 };
    }
    let pct = (current - previous) as f64 / previous as f64 * 100.0;
    (pct * 100.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// Windows
// ---------------------------------------------------------------------------

/// Monday through Sunday of the week containing `date`.
pub fn week_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = date - Duration::days(i64::from(date.weekday().num_days_from_monday()));
    (start, start + Duration::days(6))
}

/// First through last day of the month containing `date`.
pub fn month_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = date.with_day(1).unwrap_or(date);
    let end = (start + Months::new(1)).pred_opt().unwrap_or(start);
    (start, end)
}

fn previous_month(date: NaiveDate) -> NaiveDate {
    date.checked_sub_months(Months::new(1)).unwrap_or(date)
}

// ---------------------------------------------------------------------------
// Period comparison
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub category_id: i64,
    pub category: String,
    pub current_total: i64,
    pub previous_day_total: i64,
    pub current_week_total: i64,
    pub previous_week_total: i64,
    pub current_month_total: i64,
    pub previous_month_total: i64,
    pub day_change: f64,
    pub week_change: f64,
    pub month_change: f64,
}

pub fn compare_category(conn: &Connection, category: &TaskCategory, selected: NaiveDate) -> Result<Comparison> {
    let id = category.id;

    let current_total = period_total(conn, id, selected)?;
    let previous_day_total = period_total(conn, id, selected - Duration::days(1))?;

    let (ws, we) = week_bounds(selected);
    let (pws, pwe) = week_bounds(selected - Duration::weeks(1));
    let current_week_total = range_total(conn, id, ws, we)?;
    let previous_week_total = range_total(conn, id, pws, pwe)?;

    let (ms, me) = month_bounds(selected);
    let (pms, pme) = month_bounds(previous_month(selected));
    let current_month_total = range_total(conn, id, ms, me)?;
    let previous_month_total = range_total(conn, id, pms, pme)?;

    Ok(Comparison {
        category_id: id,
        category: category.name.clone(),
        current_total,
        previous_day_total,
        current_week_total,
        previous_week_total,
        current_month_total,
        previous_month_total,
        day_change: percent_change(current_total, previous_day_total),
        week_change: percent_change(current_week_total, previous_week_total),
        month_change: percent_change(current_month_total, previous_month_total),
    })
}

/// One comparison per registry category, in registry order.
pub fn dashboard(conn: &Connection, selected: NaiveDate) -> Result<Vec<Comparison>> {
    list_categories(conn)?
        .iter()
        .map(|c| compare_category(conn, c, selected))
        .collect()
}

// ---------------------------------------------------------------------------
// Chart series
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartRange {
    #[default]
    Week,
    Month,
    ThreeMonths,
    SixMonths,
    Year,
}

impl ChartRange {
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Week => "week",
            Self::Month => "month",
            Self::ThreeMonths => "three_months",
            Self::SixMonths => "six_months",
            Self::Year => "year",
        }
    }

    /// First day inside the window that ends on `today`.
    pub fn window_start(&self, today: NaiveDate) -> NaiveDate {
        let back = match self {
            Self::Week => Some(today - Duration::weeks(1)),
            Self::Month => today.checked_sub_months(Months::new(1)),
            Self::ThreeMonths => today.checked_sub_months(Months::new(3)),
            Self::SixMonths => today.checked_sub_months(Months::new(6)),
            Self::Year => today.checked_sub_months(Months::new(12)),
        };
        back.unwrap_or(today) + Duration::days(1)
    }

    /// Parse a keyword, falling back to a week for anything unrecognised.
    pub fn parse_or_default(keyword: &str) -> Self {
        keyword.parse().unwrap_or_else(|_| {
            tracing::warn!(keyword, "unknown chart range, using week");
            Self::Week
        })
    }
}

impl FromStr for ChartRange {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "three_months" => Ok(Self::ThreeMonths),
            "six_months" => Ok(Self::SixMonths),
            "year" => Ok(Self::Year),
            other => Err(format!("unknown chart range: {other}")),
        }
    }
}

impl fmt::Display for ChartRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub values: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct ChartDataset {
    pub label: &'static str,
    pub data: Vec<i64>,
}

/// The chart read's JSON body.
#[derive(Debug, Serialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<ChartDataset>,
}

impl From<ChartSeries> for ChartData {
    fn from(series: ChartSeries) -> Self {
        Self {
            labels: series.labels,
            datasets: vec![ChartDataset {
                label: "Total Tasks",
                data: series.values,
            }],
        }
    }
}

/// Per-report totals for one category over the window ending on `today`.
///
/// Every report in the window is one point labelled with its date, so two
/// users reporting on the same day give two points with the same label.
/// A report with no tasks in the category contributes 0. Points are ordered
/// by report date, then submission order.
pub fn chart_series(
    conn: &Connection,
    category_id: i64,
    range: ChartRange,
    today: NaiveDate,
) -> Result<ChartSeries> {
    get_category(conn, category_id)?;
    let start = range.window_start(today);

    let sql = format!(
        "SELECT r.report_date, COALESCE(SUM({TASK_TOTAL}), 0) \
         FROM daily_reports r \
         LEFT JOIN report_tasks t ON t.daily_report_id = r.id AND t.task_category_id = ?1 \
         WHERE r.report_date BETWEEN ?2 AND ?3 \
         GROUP BY r.id ORDER BY r.report_date, r.created_at, r.id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows: Vec<(NaiveDate, i64)> = stmt
        .query_map(rusqlite::params![category_id, start, today], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let (labels, values): (Vec<String>, Vec<i64>) = rows
        .into_iter()
        .map(|(d, v)| (d.format(DATE_FORMAT).to_string(), v))
        .unzip();
    Ok(ChartSeries { labels, values })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{add_user, category_id, test_db};
    use crate::error::DaybookError;
    use crate::store::create_report;
    use crate::store::test_support::{date, submission};

    fn report(conn: &Connection, user: i64, day: &str, specs: &[&str]) {
        create_report(conn, user, &submission(day, specs)).unwrap();
    }

    #[test]
    fn test_percent_change_cases() {
        assert_eq!(percent_change(0, 0), 0.0);
        assert_eq!(percent_change(5, 0), 100.0);
        assert_eq!(percent_change(150, 100), 50.0);
        assert_eq!(percent_change(50, 100), -50.0);
        assert_eq!(percent_change(0, 7), -100.0);
        assert_eq!(percent_change(1, 3), -66.67);
        assert_eq!(percent_change(2, 3), -33.33);
    }

    #[test]
    fn test_period_total_sums_counters_without_batch() {
        let (_dir, conn) = test_db();
        let user = add_user(&conn, "Ana");
        let other = add_user(&conn, "Budi");
        report(&conn, user, "2025-03-04", &["category=1,batch=100,claim=2,sheets=3,email=4,form=5", "category=2,claim=50"]);
        report(&conn, other, "2025-03-04", &["category=1,claim=10"]);
        report(&conn, user, "2025-03-05", &["category=1,claim=1000"]);

        assert_eq!(period_total(&conn, 1, date("2025-03-04")).unwrap(), 24);
        assert_eq!(period_total(&conn, 2, date("2025-03-04")).unwrap(), 50);
        assert_eq!(period_total(&conn, 3, date("2025-03-04")).unwrap(), 0);
        assert_eq!(period_total(&conn, 1, date("2025-03-03")).unwrap(), 0);
    }

    #[test]
    fn test_totals_hold_at_largest_counters() {
        use crate::validation::MAX_COUNT;

        let (_dir, conn) = test_db();
        let user = add_user(&conn, "Ana");
        let other = add_user(&conn, "Budi");
        let full = format!("category=1,claim={MAX_COUNT},sheets={MAX_COUNT},email={MAX_COUNT},form={MAX_COUNT}");
        report(&conn, user, "2025-03-04", &[full.as_str(), full.as_str(), "category=1,claim=1"]);
        report(&conn, other, "2025-03-04", &[full.as_str()]);

        let expected = 12 * MAX_COUNT + 1;
        assert_eq!(period_total(&conn, 1, date("2025-03-04")).unwrap(), expected);
        let rows = dashboard(&conn, date("2025-03-04")).unwrap();
        assert_eq!(rows[0].current_month_total, expected);
        let series = chart_series(&conn, 1, ChartRange::Week, date("2025-03-05")).unwrap();
        assert_eq!(series.values.iter().sum::<i64>(), expected);
    }

    #[test]
    fn test_range_total_is_inclusive() {
        let (_dir, conn) = test_db();
        let user = add_user(&conn, "Ana");
        report(&conn, user, "2025-03-01", &["category=1,claim=1"]);
        report(&conn, user, "2025-03-15", &["category=1,claim=10"]);
        report(&conn, user, "2025-03-31", &["category=1,claim=100"]);
        report(&conn, user, "2025-04-01", &["category=1,claim=1000"]);
        assert_eq!(range_total(&conn, 1, date("2025-03-01"), date("2025-03-31")).unwrap(), 111);
        assert_eq!(range_total(&conn, 1, date("2025-03-02"), date("2025-03-30")).unwrap(), 10);
    }

    #[test]
    fn test_week_bounds_monday_to_sunday() {
        // 2025-03-05 is a Wednesday.
        assert_eq!(week_bounds(date("2025-03-05")), (date("2025-03-03"), date("2025-03-09")));
        assert_eq!(week_bounds(date("2025-03-03")), (date("2025-03-03"), date("2025-03-09")));
        assert_eq!(week_bounds(date("2025-03-09")), (date("2025-03-03"), date("2025-03-09")));
        assert_eq!(week_bounds(date("2025-01-01")), (date("2024-12-30"), date("2025-01-05")));
    }

    #[test]
    fn test_month_bounds() {
        assert_eq!(month_bounds(date("2024-02-14")), (date("2024-02-01"), date("2024-02-29")));
        assert_eq!(month_bounds(date("2025-12-31")), (date("2025-12-01"), date("2025-12-31")));
        assert_eq!(previous_month(date("2025-03-31")), date("2025-02-28"));
        assert_eq!(month_bounds(previous_month(date("2025-01-15"))).0, date("2024-12-01"));
    }

    #[test]
    fn test_compare_category() {
        let (_dir, conn) = test_db();
        let user = add_user(&conn, "Ana");
        let other = add_user(&conn, "Budi");
        // Selected: Wednesday 2025-03-12. Previous week 03-03..03-09.
        report(&conn, user, "2025-03-12", &["category=1,claim=15"]);
        report(&conn, user, "2025-03-11", &["category=1,claim=10"]);
        report(&conn, user, "2025-03-04", &["category=1,claim=20"]);
        report(&conn, other, "2025-02-20", &["category=1,claim=40"]);

        let cat = get_category(&conn, 1).unwrap();
        let c = compare_category(&conn, &cat, date("2025-03-12")).unwrap();
        assert_eq!(c.current_total, 15);
        assert_eq!(c.previous_day_total, 10);
        assert_eq!(c.day_change, 50.0);
        assert_eq!(c.current_week_total, 25);
        assert_eq!(c.previous_week_total, 20);
        assert_eq!(c.week_change, 25.0);
        assert_eq!(c.current_month_total, 45);
        assert_eq!(c.previous_month_total, 40);
        assert_eq!(c.month_change, 12.5);
    }

    #[test]
    fn test_dashboard_covers_every_category() {
        let (_dir, conn) = test_db();
        let user = add_user(&conn, "Ana");
        let email = category_id(&conn, "Email Handling");
        let spec = format!("category={email},email=8");
        report(&conn, user, "2025-03-12", &[spec.as_str()]);

        let rows = dashboard(&conn, date("2025-03-12")).unwrap();
        assert_eq!(rows.len(), 6);
        let e = rows.iter().find(|c| c.category_id == email).unwrap();
        assert_eq!(e.current_total, 8);
        assert_eq!(e.day_change, 100.0);
        assert!(rows.iter().filter(|c| c.category_id != email).all(|c| c.current_total == 0 && c.day_change == 0.0));
    }

    #[test]
    fn test_chart_range_parsing() {
        assert_eq!("three_months".parse::<ChartRange>().unwrap(), ChartRange::ThreeMonths);
        assert!("fortnight".parse::<ChartRange>().is_err());
        assert_eq!(ChartRange::parse_or_default("fortnight"), ChartRange::Week);
        assert_eq!(ChartRange::Year.to_string(), "year");
    }

    #[test]
    fn test_window_start() {
        let today = date("2025-03-31");
        assert_eq!(ChartRange::Week.window_start(today), date("2025-03-25"));
        assert_eq!(ChartRange::Month.window_start(today), date("2025-03-01"));
        assert_eq!(ChartRange::ThreeMonths.window_start(today), date("2025-01-01"));
        assert_eq!(ChartRange::Year.window_start(today), date("2024-04-01"));
    }

    #[test]
    fn test_chart_series_skips_days_without_reports() {
        let (_dir, conn) = test_db();
        let user = add_user(&conn, "Ana");
        let today = date("2025-03-14");
        report(&conn, user, "2025-03-08", &["category=1,claim=3,batch=7"]);
        report(&conn, user, "2025-03-12", &["category=1,claim=4,form=1"]);
        // Outside the window.
        report(&conn, user, "2025-03-07", &["category=1,claim=99"]);

        let series = chart_series(&conn, 1, ChartRange::Week, today).unwrap();
        assert_eq!(series.labels, vec!["2025-03-08", "2025-03-12"]);
        assert_eq!(series.values, vec![3, 5]);
    }

    #[test]
    fn test_chart_series_one_point_per_report() {
        let (_dir, conn) = test_db();
        let a = add_user(&conn, "Ana");
        let b = add_user(&conn, "Budi");
        let today = date("2025-03-14");
        report(&conn, a, "2025-03-13", &["category=1,claim=3", "category=1,form=2"]);
        report(&conn, b, "2025-03-13", &["category=1,claim=4"]);
        report(&conn, a, "2025-03-14", &["category=2,claim=4"]);

        let series = chart_series(&conn, 1, ChartRange::Week, today).unwrap();
        assert_eq!(series.labels, vec!["2025-03-13", "2025-03-13", "2025-03-14"]);
        assert_eq!(series.values, vec![5, 4, 0]);
    }

    #[test]
    fn test_chart_series_orders_same_day_reports_by_submission() {
        let (_dir, conn) = test_db();
        let a = add_user(&conn, "Ana");
        let b = add_user(&conn, "Budi");
        let today = date("2025-03-14");
        report(&conn, b, "2025-03-14", &["category=1,claim=9"]);
        report(&conn, a, "2025-03-12", &["category=1,claim=1"]);
        report(&conn, a, "2025-03-14", &["category=1,email=2"]);

        let series = chart_series(&conn, 1, ChartRange::Week, today).unwrap();
        assert_eq!(series.labels, vec!["2025-03-12", "2025-03-14", "2025-03-14"]);
        assert_eq!(series.values, vec![1, 9, 2]);
    }

    #[test]
    fn test_chart_series_unknown_category() {
        let (_dir, conn) = test_db();
        let err = chart_series(&conn, 404, ChartRange::Week, date("2025-03-14")).unwrap_err();
        assert!(matches!(err, DaybookError::NotFound { entity: "category", id: 404 }));
    }

    #[test]
    fn test_chart_data_json_shape() {
        let data = ChartData::from(ChartSeries {
            labels: vec!["2025-03-08".into()],
            values: vec![3],
        });
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["labels"][0], "2025-03-08");
        assert_eq!(json["datasets"][0]["data"][0], 3);
        assert_eq!(json["datasets"][0]["label"], "Total Tasks");
    }
}
