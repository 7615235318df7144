use std::collections::HashSet;

use chrono::NaiveDate;
use rusqlite::Connection;

use crate::categories::list_categories;
use crate::error::Result;
use crate::models::DATE_FORMAT;
use crate::store::{tasks_in_range, CategoryTaskRow};
use crate::validation::ValidationErrors;

pub const HEADER: [&str; 9] = [
    "Date",
    "User",
    "Batch",
    "Claim",
    "Sheet",
    "Email",
    "Form",
    "Start Time",
    "End Time",
];

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Longest sheet name spreadsheet applications accept.
pub const MAX_SHEET_NAME: usize = 31;

const FORBIDDEN: &[char] = &['[', ']', '*', '/', '\\', '?', ':'];

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(i64),
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportRow {
    pub date: NaiveDate,
    pub user: String,
    pub batch: i64,
    pub claim: i64,
    pub sheet: i64,
    pub email: i64,
    pub form: i64,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

impl ExportRow {
    fn from_task(row: CategoryTaskRow) -> Self {
        let t = row.task;
        Self {
            date: row.report_date,
            user: row.user_name,
            batch: t.batch_count.unwrap_or(0),
            claim: t.claim_count.unwrap_or(0),
            sheet: t.sheet_count.unwrap_or(0),
            email: t.email.unwrap_or(0),
            form: t.form.unwrap_or(0),
            start_time: t.start_time,
            end_time: t.end_time,
        }
    }

    /// Cells in [`HEADER`] order.
    pub fn cells(&self) -> [CellValue; 9] {
        let time = |t: &Option<String>| t.clone().map_or(CellValue::Empty, CellValue::Text);
        [
            CellValue::Text(self.date.format(DATE_FORMAT).to_string()),
            CellValue::Text(self.user.clone()),
            CellValue::Number(self.batch),
            CellValue::Number(self.claim),
            CellValue::Number(self.sheet),
            CellValue::Number(self.email),
            CellValue::Number(self.form),
            time(&self.start_time),
            time(&self.end_time),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub category_id: i64,
    pub rows: Vec<ExportRow>,
}

/// Strip characters sheet names may not contain and cut to the length limit.
pub fn sanitize_sheet_name(name: &str) -> String {
    name.chars()
        .filter(|c| !FORBIDDEN.contains(c))
        .take(MAX_SHEET_NAME)
        .collect()
}

/// Sanitized name, made unique (case-insensitively) among `taken`.
fn unique_sheet_name(name: &str, index: usize, taken: &mut HashSet<String>) -> String {
    let mut base = sanitize_sheet_name(name);
    if base.trim().is_empty() {
        base = format!("Sheet{}", index + 1);
    }
    let mut candidate = base.clone();
    let mut n = 2;
    while taken.contains(&candidate.to_lowercase()) {
        let suffix = format!(" ({n})");
        let keep = MAX_SHEET_NAME.saturating_sub(suffix.chars().count());
        candidate = format!("{}{suffix}", base.chars().take(keep).collect::<String>());
        n += 1;
    }
    taken.insert(candidate.to_lowercase());
    candidate
}

/// One sheet per category, in registry order, for reports dated within
/// `start..=end`. Categories without tasks in the window still get a sheet.
pub fn build_sheets(conn: &Connection, start: NaiveDate, end: NaiveDate) -> Result<Vec<Sheet>> {
    if start > end {
        let mut errors = ValidationErrors::default();
        errors.add("end_date", "must not be before start_date");
        return Err(errors.into());
    }

    let mut taken = HashSet::new();
    let mut sheets = Vec::new();
    for (i, category) in list_categories(conn)?.into_iter().enumerate() {
        let rows = tasks_in_range(conn, category.id, start, end)?
            .into_iter()
            .map(ExportRow::from_task)
            .collect();
        sheets.push(Sheet {
            name: unique_sheet_name(&category.name, i, &mut taken),
            category_id: category.id,
            rows,
        });
    }
    Ok(sheets)
}

pub fn export_filename(label: &str, export_date: NaiveDate) -> String {
    format!("{label}_{}.xlsx", export_date.format(DATE_FORMAT))
}

/// A finished export, ready to be written or served.
pub struct ExportFile {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
    pub sheets: usize,
    pub rows: usize,
}

pub fn export_workbook(
    conn: &Connection,
    start: NaiveDate,
    end: NaiveDate,
    label: &str,
    today: NaiveDate,
) -> Result<ExportFile> {
    let sheets = build_sheets(conn, start, end)?;
    for s in &sheets {
        tracing::debug!(category_id = s.category_id, sheet = %s.name, rows = s.rows.len(), "export sheet");
    }
    let rows = sheets.iter().map(|s| s.rows.len()).sum();
    let bytes = crate::xlsx::write_workbook(&sheets)?;
    Ok(ExportFile {
        filename: export_filename(label, today),
        content_type: XLSX_CONTENT_TYPE,
        bytes,
        sheets: sheets.len(),
        rows,
    })
}
