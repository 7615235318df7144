use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::approval::{approve as approve_report, ApprovalState};
use crate::cli::open_db;
use crate::error::Result;
use crate::models::{ReportTask, DATE_FORMAT, TIMESTAMP_FORMAT};
use crate::settings::load_settings;
use crate::store::{create_report, delete_report, get_report, list_reports, update_report};
use crate::users::get_user;
use crate::validation::{ReportSubmission, TaskSubmission};

fn submission(date: &str, tasks: &[String]) -> ReportSubmission {
    ReportSubmission {
        report_date: Some(date.to_string()),
        tasks: tasks.iter().map(|t| TaskSubmission::parse_spec(t)).collect(),
    }
}

fn opt_num(val: Option<i64>) -> String {
    val.map(|v| v.to_string()).unwrap_or_default()
}

fn time_range(task: &ReportTask) -> String {
    match (&task.start_time, &task.end_time) {
        (Some(s), Some(e)) => format!("{s}-{e}"),
        (Some(s), None) => format!("{s}-"),
        (None, Some(e)) => format!("-{e}"),
        (None, None) => String::new(),
    }
}

fn status_cell(state: &ApprovalState) -> Cell {
    match state {
        ApprovalState::Pending => Cell::new(state.label().yellow()),
        ApprovalState::Approved { .. } => Cell::new(state.label().green()),
    }
}

pub fn create(user_id: i64, date: &str, tasks: &[String]) -> Result<()> {
    let conn = open_db()?;
    let id = create_report(&conn, user_id, &submission(date, tasks))?;
    let user = get_user(&conn, user_id)?;
    println!("Created report {id} for {} on {date} ({} task(s))", user.name, tasks.len());
    Ok(())
}

pub fn list(page: u32) -> Result<()> {
    let conn = open_db()?;
    let settings = load_settings();
    let result = list_reports(&conn, page, settings.page_size)?;

    if result.items.is_empty() {
        println!("No reports on page {}.", result.page);
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Date", "User", "Tasks", "Status"]);
    for item in &result.items {
        let r = &item.report;
        table.add_row(vec![
            Cell::new(r.id),
            Cell::new(r.report_date.format(DATE_FORMAT)),
            Cell::new(&item.user_name),
            Cell::new(item.task_count),
            status_cell(&ApprovalState::of(r)),
        ]);
    }
    println!("Daily Reports\n{table}");
    println!(
        "Page {} of {} ({} report(s))",
        result.page,
        result.last_page(),
        result.total
    );
    Ok(())
}

pub fn show(id: i64) -> Result<()> {
    let conn = open_db()?;
    let detail = get_report(&conn, id)?;
    let r = &detail.report;

    println!("Report {}", r.id);
    println!("User:     {}", detail.user_name);
    println!("Date:     {}", r.report_date.format(DATE_FORMAT));
    match ApprovalState::of(r) {
        ApprovalState::Pending => println!("Status:   {}", "pending".yellow()),
        ApprovalState::Approved { at, .. } => {
            let by = detail.approver_name.as_deref().unwrap_or("(unknown)");
            let at = at
                .map(|t| t.format(TIMESTAMP_FORMAT).to_string())
                .unwrap_or_default();
            println!("Status:   {} by {by} at {at}", "approved".green());
        }
    }

    if detail.tasks.is_empty() {
        println!("\nNo tasks.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec![
        "Category", "Date", "Batch", "Claim", "Sheets", "Email", "Form", "Time",
    ]);
    for t in &detail.tasks {
        let task = &t.task;
        table.add_row(vec![
            Cell::new(&t.category_name),
            Cell::new(
                task.task_date
                    .map(|d| d.format(DATE_FORMAT).to_string())
                    .unwrap_or_default(),
            ),
            Cell::new(opt_num(task.batch_count)),
            Cell::new(opt_num(task.claim_count)),
            Cell::new(opt_num(task.sheet_count)),
            Cell::new(opt_num(task.email)),
            Cell::new(opt_num(task.form)),
            Cell::new(time_range(task)),
        ]);
    }
    println!("\n{table}");
    Ok(())
}

pub fn update(id: i64, date: &str, tasks: &[String]) -> Result<()> {
    let conn = open_db()?;
    update_report(&conn, id, &submission(date, tasks))?;
    println!("Updated report {id} ({} task(s))", tasks.len());
    Ok(())
}

pub fn delete(id: i64) -> Result<()> {
    let conn = open_db()?;
    delete_report(&conn, id)?;
    println!("Deleted report {id}");
    Ok(())
}

pub fn approve(id: i64, approver_id: i64) -> Result<()> {
    let conn = open_db()?;
    let now = chrono::Local::now().naive_local();
    let state = approve_report(&conn, id, approver_id, now)?;
    println!("Report {id} is now {}", state.label().green());
    Ok(())
}
