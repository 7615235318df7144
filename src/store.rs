use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Row, Transaction, TransactionBehavior};

use crate::categories::capability_map;
use crate::error::{DaybookError, Result};
use crate::models::{Capabilities, DailyReport, NewReport, NewTask, ReportTask};
use crate::users::get_user;
use crate::validation::{validate_submission, ReportSubmission};

pub const DEFAULT_PAGE_SIZE: u32 = 16;

const REPORT_COLUMNS: &str =
    "r.id, r.user_id, r.report_date, r.is_approved, r.approved_at, r.approved_by";

const TASK_COLUMNS: &str = "t.id, t.daily_report_id, t.task_category_id, t.task_date, \
     t.batch_count, t.claim_count, t.sheet_count, t.email, t.form, t.start_time, t.end_time";

fn report_from_row(row: &Row) -> rusqlite::Result<DailyReport> {
    Ok(DailyReport {
        id: row.get(0)?,
        user_id: row.get(1)?,
        report_date: row.get(2)?,
        is_approved: row.get(3)?,
        approved_at: row.get(4)?,
        approved_by: row.get(5)?,
    })
}

/// Reads the task columns starting at `offset`.
fn task_from_row(row: &Row, offset: usize) -> rusqlite::Result<ReportTask> {
    Ok(ReportTask {
        id: row.get(offset)?,
        daily_report_id: row.get(offset + 1)?,
        task_category_id: row.get(offset + 2)?,
        task_date: row.get(offset + 3)?,
        batch_count: row.get(offset + 4)?,
        claim_count: row.get(offset + 5)?,
        sheet_count: row.get(offset + 6)?,
        email: row.get(offset + 7)?,
        form: row.get(offset + 8)?,
        start_time: row.get(offset + 9)?,
        end_time: row.get(offset + 10)?,
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn duplicate(user_id: i64, date: NaiveDate) -> DaybookError {
    DaybookError::DuplicateReport {
        user_id,
        date: date.to_string(),
    }
}

fn validate(conn: &Connection, submission: &ReportSubmission) -> Result<NewReport> {
    let caps = capability_map(conn)?;
    let known: HashSet<i64> = caps.keys().copied().collect();
    let report = validate_submission(submission, &known)?;
    warn_undeclared(&caps, &report);
    Ok(report)
}

fn warn_undeclared(caps: &HashMap<i64, Capabilities>, report: &NewReport) {
    for (i, task) in report.tasks.iter().enumerate() {
        let Some(c) = caps.get(&task.category_id) else { continue };
        let extra = c.undeclared_fields(task);
        if !extra.is_empty() {
            tracing::warn!(
                task = i,
                category_id = task.category_id,
                fields = ?extra,
                "task carries fields its category does not declare"
            );
        }
    }
}

fn report_exists_for(
    conn: &Connection,
    user_id: i64,
    date: NaiveDate,
    except_id: Option<i64>,
) -> Result<bool> {
    let mut stmt = conn.prepare_cached(
        "SELECT 1 FROM daily_reports WHERE user_id = ?1 AND report_date = ?2 AND id IS NOT ?3",
    )?;
    Ok(stmt.exists(rusqlite::params![user_id, date, except_id])?)
}

/// Insert the report row itself. The UNIQUE(user_id, report_date) constraint
/// is the last word on duplicates.
fn insert_report_row(conn: &Connection, user_id: i64, date: NaiveDate) -> Result<i64> {
    conn.execute(
        "INSERT INTO daily_reports (user_id, report_date) VALUES (?1, ?2)",
        rusqlite::params![user_id, date],
    )
    .map_err(|e| {
        if is_unique_violation(&e) {
            duplicate(user_id, date)
        } else {
            e.into()
        }
    })?;
    Ok(conn.last_insert_rowid())
}

fn move_report_row(conn: &Connection, id: i64, user_id: i64, date: NaiveDate) -> Result<()> {
    conn.execute(
        "UPDATE daily_reports SET report_date = ?1 WHERE id = ?2",
        rusqlite::params![date, id],
    )
    .map_err(|e| {
        if is_unique_violation(&e) {
            duplicate(user_id, date)
        } else {
            e.into()
        }
    })?;
    Ok(())
}

fn insert_tasks(tx: &Transaction, report_id: i64, tasks: &[NewTask]) -> Result<()> {
    let mut stmt = tx.prepare(
        "INSERT INTO report_tasks \
         (daily_report_id, task_category_id, task_date, batch_count, claim_count, sheet_count, \
          email, form, start_time, end_time) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
    )?;
    for t in tasks {
        stmt.execute(rusqlite::params![
            report_id,
            t.category_id,
            t.task_date,
            t.batch_count,
            t.claim_count,
            t.sheet_count,
            t.email,
            t.form,
            t.start_time,
            t.end_time,
        ])?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Create / update / delete
// ---------------------------------------------------------------------------

/// Store a new report with all of its tasks, or nothing at all.
pub fn create_report(conn: &Connection, user_id: i64, submission: &ReportSubmission) -> Result<i64> {
    let report = validate(conn, submission)?;
    get_user(conn, user_id)?;

    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    if report_exists_for(&tx, user_id, report.report_date, None)? {
        return Err(duplicate(user_id, report.report_date));
    }
    let report_id = insert_report_row(&tx, user_id, report.report_date)?;
    insert_tasks(&tx, report_id, &report.tasks)?;
    tx.commit()?;

    tracing::info!(
        report_id,
        user_id,
        date = %report.report_date,
        tasks = report.tasks.len(),
        "created daily report"
    );
    Ok(report_id)
}

/// Move a report to the submitted date and replace its tasks wholesale.
pub fn update_report(conn: &Connection, id: i64, submission: &ReportSubmission) -> Result<()> {
    let report = validate(conn, submission)?;
    let existing = get_daily_report(conn, id)?;

    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    if report_exists_for(&tx, existing.user_id, report.report_date, Some(id))? {
        return Err(duplicate(existing.user_id, report.report_date));
    }
    move_report_row(&tx, id, existing.user_id, report.report_date)?;
    tx.execute("DELETE FROM report_tasks WHERE daily_report_id = ?1", [id])?;
    insert_tasks(&tx, id, &report.tasks)?;
    tx.commit()?;

    tracing::info!(report_id = id, date = %report.report_date, tasks = report.tasks.len(), "updated daily report");
    Ok(())
}

/// Delete a report; its tasks go with it.
pub fn delete_report(conn: &Connection, id: i64) -> Result<()> {
    let deleted = conn.execute("DELETE FROM daily_reports WHERE id = ?1", [id])?;
    if deleted == 0 {
        return Err(DaybookError::not_found("report", id));
    }
    tracing::info!(report_id = id, "deleted daily report");
    Ok(())
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

pub fn get_daily_report(conn: &Connection, id: i64) -> Result<DailyReport> {
    conn.query_row(
        &format!("SELECT {REPORT_COLUMNS} FROM daily_reports r WHERE r.id = ?1"),
        [id],
        report_from_row,
    )
    .optional()?
    .ok_or_else(|| DaybookError::not_found("report", id))
}

pub struct TaskDetail {
    pub task: ReportTask,
    pub category_name: String,
}

pub struct ReportDetail {
    pub report: DailyReport,
    pub user_name: String,
    pub approver_name: Option<String>,
    pub tasks: Vec<TaskDetail>,
}

pub fn get_report(conn: &Connection, id: i64) -> Result<ReportDetail> {
    let (report, user_name, approver_name) = conn
        .query_row(
            &format!(
                "SELECT {REPORT_COLUMNS}, u.name, a.name \
                 FROM daily_reports r \
                 JOIN users u ON u.id = r.user_id \
                 LEFT JOIN users a ON a.id = r.approved_by \
                 WHERE r.id = ?1"
            ),
            [id],
            |row| Ok((report_from_row(row)?, row.get(6)?, row.get(7)?)),
        )
        .optional()?
        .ok_or_else(|| DaybookError::not_found("report", id))?;

    let mut stmt = conn.prepare(&format!(
        "SELECT {TASK_COLUMNS}, c.name \
         FROM report_tasks t JOIN task_categories c ON c.id = t.task_category_id \
         WHERE t.daily_report_id = ?1 ORDER BY t.id"
    ))?;
    let tasks = stmt
        .query_map([id], |row| {
            Ok(TaskDetail {
                task: task_from_row(row, 0)?,
                category_name: row.get(11)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(ReportDetail {
        report,
        user_name,
        approver_name,
        tasks,
    })
}

pub struct ReportSummary {
    pub report: DailyReport,
    pub user_name: String,
    pub task_count: i64,
}

pub struct ReportPage {
    pub items: Vec<ReportSummary>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

impl ReportPage {
    pub fn last_page(&self) -> u32 {
        let per_page = i64::from(self.per_page.max(1));
        ((self.total + per_page - 1) / per_page).max(1) as u32
    }
}

/// One page of reports: unapproved first, newest date first, then in the
/// order they were submitted.
pub fn list_reports(conn: &Connection, page: u32, per_page: u32) -> Result<ReportPage> {
    let page = page.max(1);
    let per_page = per_page.max(1);
    let offset = i64::from(page - 1) * i64::from(per_page);

    let total: i64 = conn.query_row("SELECT count(*) FROM daily_reports", [], |r| r.get(0))?;

    let mut stmt = conn.prepare(&format!(
        "SELECT {REPORT_COLUMNS}, u.name, \
         (SELECT count(*) FROM report_tasks t WHERE t.daily_report_id = r.id) \
         FROM daily_reports r JOIN users u ON u.id = r.user_id \
         ORDER BY r.is_approved ASC, r.report_date DESC, r.created_at ASC, r.id ASC \
         LIMIT ?1 OFFSET ?2"
    ))?;
    let items = stmt
        .query_map(rusqlite::params![per_page, offset], |row| {
            Ok(ReportSummary {
                report: report_from_row(row)?,
                user_name: row.get(6)?,
                task_count: row.get(7)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(ReportPage {
        items,
        page,
        per_page,
        total,
    })
}

/// A task of one category together with its report's date and owner.
pub struct CategoryTaskRow {
    pub report_date: NaiveDate,
    pub user_name: String,
    pub task: ReportTask,
}

/// Tasks of `category_id` whose report falls within `start..=end`, ordered by
/// report date.
pub fn tasks_in_range(
    conn: &Connection,
    category_id: i64,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<CategoryTaskRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TASK_COLUMNS}, r.report_date, u.name \
         FROM report_tasks t \
         JOIN daily_reports r ON r.id = t.daily_report_id \
         JOIN users u ON u.id = r.user_id \
         WHERE t.task_category_id = ?1 AND r.report_date BETWEEN ?2 AND ?3 \
         ORDER BY r.report_date, r.created_at, r.id, t.id"
    ))?;
    let rows = stmt
        .query_map(rusqlite::params![category_id, start, end], |row| {
            Ok(CategoryTaskRow {
                task: task_from_row(row, 0)?,
                report_date: row.get(11)?,
                user_name: row.get(12)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::validation::TaskSubmission;

    pub fn submission(date: &str, specs: &[&str]) -> ReportSubmission {
        ReportSubmission {
            report_date: Some(date.to_string()),
            tasks: specs.iter().map(|s| TaskSubmission::parse_spec(s)).collect(),
        }
    }

    pub fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }
}
