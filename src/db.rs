use std::path::Path;

use rusqlite::Connection;

use crate::error::Result;

pub const DB_FILE: &str = "daybook.db";

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS task_categories (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    has_batch INTEGER NOT NULL DEFAULT 0,
    has_claim INTEGER NOT NULL DEFAULT 0,
    has_time_range INTEGER NOT NULL DEFAULT 0,
    has_sheets INTEGER NOT NULL DEFAULT 0,
    has_email INTEGER NOT NULL DEFAULT 0,
    has_form INTEGER NOT NULL DEFAULT 0,
    has_dor_date INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS daily_reports (
    id INTEGER PRIMARY KEY,
    user_id INTEGER NOT NULL,
    report_date TEXT NOT NULL,
    is_approved INTEGER NOT NULL DEFAULT 0,
    approved_at TEXT,
    approved_by INTEGER,
    created_at TEXT DEFAULT (datetime('now')),
    UNIQUE (user_id, report_date),
    FOREIGN KEY (user_id) REFERENCES users(id),
    FOREIGN KEY (approved_by) REFERENCES users(id)
);

CREATE TABLE IF NOT EXISTS report_tasks (
    id INTEGER PRIMARY KEY,
    daily_report_id INTEGER NOT NULL,
    task_category_id INTEGER NOT NULL,
    task_date TEXT,
    batch_count INTEGER,
    claim_count INTEGER,
    sheet_count INTEGER,
    email INTEGER,
    form INTEGER,
    start_time TEXT,
    end_time TEXT,
    FOREIGN KEY (daily_report_id) REFERENCES daily_reports(id) ON DELETE CASCADE,
    FOREIGN KEY (task_category_id) REFERENCES task_categories(id)
);

CREATE INDEX IF NOT EXISTS idx_daily_reports_date ON daily_reports(report_date);
CREATE INDEX IF NOT EXISTS idx_report_tasks_report ON report_tasks(daily_report_id);
CREATE INDEX IF NOT EXISTS idx_report_tasks_category ON report_tasks(task_category_id);
";

// (name, batch, claim, time_range, sheets, email, form, dor_date)
const DEFAULT_CATEGORIES: &[(&str, bool, bool, bool, bool, bool, bool, bool)] = &[
    ("Batch Entry", true, true, true, false, false, false, false),
    ("Claim Processing", false, true, true, false, false, false, false),
    ("Sheet Review", false, false, true, true, false, false, false),
    ("Email Handling", false, false, true, false, true, false, false),
    ("Form Processing", false, false, true, false, false, true, false),
    ("DOR Verification", true, true, false, false, false, false, true),
];

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;

    let count: i64 = conn.query_row("SELECT count(*) FROM task_categories", [], |row| row.get(0))?;
    if count == 0 {
        let mut stmt = conn.prepare(
            "INSERT INTO task_categories \
             (name, has_batch, has_claim, has_time_range, has_sheets, has_email, has_form, has_dor_date) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )?;
        for cat in DEFAULT_CATEGORIES {
            stmt.execute(rusqlite::params![cat.0, cat.1, cat.2, cat.3, cat.4, cat.5, cat.6, cat.7])?;
        }
        tracing::debug!(count = DEFAULT_CATEGORIES.len(), "seeded task categories");
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        (dir, conn)
    }

    pub fn add_user(conn: &Connection, name: &str) -> i64 {
        conn.execute("INSERT INTO users (name) VALUES (?1)", [name]).unwrap();
        conn.last_insert_rowid()
    }

    pub fn category_id(conn: &Connection, name: &str) -> i64 {
        conn.query_row("SELECT id FROM task_categories WHERE name = ?1", [name], |r| r.get(0))
            .unwrap()
    }
}
