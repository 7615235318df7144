use rusqlite::{Connection, OptionalExtension};

use crate::error::{DaybookError, Result};
use crate::models::User;

pub fn add_user(conn: &Connection, name: &str) -> Result<i64> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DaybookError::Other("user name must not be empty".into()));
    }
    conn.execute("INSERT INTO users (name) VALUES (?1)", [name])?;
    let id = conn.last_insert_rowid();
    tracing::info!(user_id = id, name, "added user");
    Ok(id)
}

pub fn list_users(conn: &Connection) -> Result<Vec<User>> {
    let mut stmt = conn.prepare("SELECT id, name FROM users ORDER BY id")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(User {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn get_user(conn: &Connection, id: i64) -> Result<User> {
    conn.query_row("SELECT id, name FROM users WHERE id = ?1", [id], |row| {
        Ok(User {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    })
    .optional()?
    .ok_or_else(|| DaybookError::not_found("user", id))
}
