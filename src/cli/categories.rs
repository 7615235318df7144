use comfy_table::{Cell, Table};

use crate::categories::list_categories;
use crate::cli::open_db;
use crate::error::Result;

pub fn list() -> Result<()> {
    let conn = open_db()?;
    let categories = list_categories(&conn)?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Fields"]);
    for cat in categories {
        table.add_row(vec![
            Cell::new(cat.id),
            Cell::new(cat.name),
            Cell::new(cat.capabilities.labels().join(", ")),
        ]);
    }
    println!("Task Categories\n{table}");
    Ok(())
}
