use crate::db::{get_connection, DB_FILE};
use crate::error::Result;
use crate::fmt::{count, format_bytes};
use crate::settings::load_settings;

pub fn run() -> Result<()> {
    let settings = load_settings();
    let data_dir = std::path::PathBuf::from(&settings.data_dir);
    let db_path = data_dir.join(DB_FILE);

    println!("Data dir:   {}", data_dir.display());
    println!("Database:   {}", db_path.display());

    if db_path.exists() {
        let size = std::fs::metadata(&db_path)?.len();
        println!("DB size:    {}", format_bytes(size));

        let conn = get_connection(&db_path)?;
        let users: i64 = conn.query_row("SELECT count(*) FROM users", [], |r| r.get(0))?;
        let pending: i64 = conn.query_row(
            "SELECT count(*) FROM daily_reports WHERE is_approved = 0",
            [],
            |r| r.get(0),
        )?;
        let approved: i64 = conn.query_row(
            "SELECT count(*) FROM daily_reports WHERE is_approved = 1",
            [],
            |r| r.get(0),
        )?;
        let tasks: i64 = conn.query_row("SELECT count(*) FROM report_tasks", [], |r| r.get(0))?;

        println!();
        println!("Users:      {}", count(users));
        println!("Pending:    {}", count(pending));
        println!("Approved:   {}", count(approved));
        println!("Tasks:      {}", count(tasks));
    } else {
        println!();
        println!("Database not found. Run `daybook init` to set up.");
    }

    Ok(())
}
