pub mod backup;
pub mod categories;
pub mod chart;
pub mod dashboard;
pub mod export;
pub mod init;
pub mod report;
pub mod status;
pub mod users;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rusqlite::Connection;

use crate::db::get_connection;
use crate::error::{DaybookError, Result};
use crate::models::DATE_FORMAT;
use crate::settings::db_path;
use crate::validation::ValidationErrors;

pub(crate) fn open_db() -> Result<Connection> {
    let path = db_path();
    if !path.exists() {
        return Err(DaybookError::Settings(format!(
            "No database found at {}\nRun `daybook init` to set up.",
            path.display()
        )));
    }
    get_connection(&path)
}

/// Parse a `YYYY-MM-DD` argument, reporting failures against `field`.
pub(crate) fn parse_date_arg(field: &str, raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|_| {
        let mut errors = ValidationErrors::default();
        errors.add(field, "must be a valid date (YYYY-MM-DD)");
        errors.into()
    })
}

pub(crate) fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

#[derive(Parser)]
#[command(name = "daybook", about = "Daily task reports, approvals and period dashboards.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up daybook: choose a data directory and initialize the database.
    Init {
        /// Path for daybook data (default: ~/Documents/daybook)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Manage users.
    Users {
        #[command(subcommand)]
        command: UsersCommands,
    },
    /// List task categories and the fields each one uses.
    Categories,
    /// Submit, review and approve daily reports.
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },
    /// Per-category totals with day/week/month change.
    Dashboard {
        /// Date to compare: YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Print a category's daily totals as chart JSON.
    Chart {
        /// Category ID (shown in `daybook categories`)
        category_id: i64,
        /// Window: week, month, three_months, six_months, year
        #[arg(long, default_value = "week")]
        range: String,
    },
    /// Export reports to an Excel workbook, one sheet per category.
    Export {
        /// Start date: YYYY-MM-DD
        #[arg(long = "from")]
        from_date: String,
        /// End date: YYYY-MM-DD
        #[arg(long = "to")]
        to_date: String,
        /// Output file path (default: <data_dir>/exports/<label>_<today>.xlsx)
        #[arg(long)]
        output: Option<String>,
    },
    /// Back up the database.
    Backup {
        /// Output path (default: <data_dir>/backups/daybook-YYYYMMDD-HHMMSS.db)
        #[arg(long)]
        output: Option<String>,
    },
    /// Show current database and summary statistics.
    Status,
}

#[derive(Subcommand)]
pub enum UsersCommands {
    /// Add a user.
    Add {
        /// Display name, unique
        name: String,
    },
    /// List all users.
    List,
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Submit a daily report.
    Create {
        /// ID of the submitting user
        #[arg(long)]
        user: i64,
        /// Report date: YYYY-MM-DD
        #[arg(long)]
        date: String,
        /// Task spec, repeatable: category=ID,batch=N,claim=N,sheets=N,email=N,form=N,date=YYYY-MM-DD,start=HH:MM,end=HH:MM
        #[arg(long = "task")]
        tasks: Vec<String>,
    },
    /// List reports, pending first.
    List {
        /// Page number, starting at 1
        #[arg(long, default_value = "1")]
        page: u32,
    },
    /// Show one report with its tasks.
    Show {
        /// Report ID
        id: i64,
    },
    /// Replace a report's date and tasks.
    Update {
        /// Report ID
        id: i64,
        /// Report date: YYYY-MM-DD
        #[arg(long)]
        date: String,
        /// Task spec, repeatable (replaces all existing tasks)
        #[arg(long = "task")]
        tasks: Vec<String>,
    },
    /// Delete a report and its tasks.
    Delete {
        /// Report ID
        id: i64,
    },
    /// Approve a report.
    Approve {
        /// Report ID
        id: i64,
        /// ID of the approving user
        #[arg(long)]
        by: i64,
    },
}
