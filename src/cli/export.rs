use std::path::PathBuf;

use crate::cli::{open_db, parse_date_arg, today};
use crate::error::Result;
use crate::export::export_workbook;
use crate::settings::{get_data_dir, load_settings};

pub fn run(from_date: &str, to_date: &str, output: Option<String>) -> Result<()> {
    let start = parse_date_arg("start_date", from_date)?;
    let end = parse_date_arg("end_date", to_date)?;
    let conn = open_db()?;
    let settings = load_settings();

    let file = export_workbook(&conn, start, end, &settings.export_label, today())?;

    let path = match output {
        Some(p) => PathBuf::from(p),
        None => get_data_dir().join("exports").join(&file.filename),
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, &file.bytes)?;

    tracing::info!(
        path = %path.display(),
        sheets = file.sheets,
        rows = file.rows,
        content_type = file.content_type,
        "wrote export"
    );
    println!(
        "Wrote {} ({} sheet(s), {} row(s))",
        path.display(),
        file.sheets,
        file.rows
    );
    Ok(())
}
