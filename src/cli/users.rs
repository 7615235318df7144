use comfy_table::{Cell, Table};

use crate::cli::open_db;
use crate::error::Result;
use crate::users::{add_user, list_users};

pub fn add(name: &str) -> Result<()> {
    let conn = open_db()?;
    let id = add_user(&conn, name)?;
    println!("Added user {id}: {}", name.trim());
    Ok(())
}

pub fn list() -> Result<()> {
    let conn = open_db()?;
    let users = list_users(&conn)?;

    if users.is_empty() {
        println!("No users yet. Add one with `daybook users add <name>`.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name"]);
    for u in users {
        table.add_row(vec![Cell::new(u.id), Cell::new(u.name)]);
    }
    println!("Users\n{table}");
    Ok(())
}
