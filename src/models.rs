use chrono::{NaiveDate, NaiveDateTime};

/// Which optional task fields a category's form should show.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub has_batch: bool,
    pub has_claim: bool,
    pub has_time_range: bool,
    pub has_sheets: bool,
    pub has_email: bool,
    pub has_form: bool,
    pub has_dor_date: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskCategory {
    pub id: i64,
    pub name: String,
    pub capabilities: Capabilities,
}

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyReport {
    pub id: i64,
    pub user_id: i64,
    pub report_date: NaiveDate,
    pub is_approved: bool,
    pub approved_at: Option<NaiveDateTime>,
    pub approved_by: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReportTask {
    pub id: i64,
    pub daily_report_id: i64,
    pub task_category_id: i64,
    pub task_date: Option<NaiveDate>,
    pub batch_count: Option<i64>,
    pub claim_count: Option<i64>,
    pub sheet_count: Option<i64>,
    pub email: Option<i64>,
    pub form: Option<i64>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

/// A validated task ready for insertion.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewTask {
    pub category_id: i64,
    pub task_date: Option<NaiveDate>,
    pub batch_count: Option<i64>,
    pub claim_count: Option<i64>,
    pub sheet_count: Option<i64>,
    pub email: Option<i64>,
    pub form: Option<i64>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

/// A validated report submission.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReport {
    pub report_date: NaiveDate,
    pub tasks: Vec<NewTask>,
}

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
