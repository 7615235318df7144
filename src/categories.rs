use std::collections::HashMap;

use rusqlite::{Connection, OptionalExtension, Row};

use crate::error::{DaybookError, Result};
use crate::models::{Capabilities, NewTask, TaskCategory};

const SELECT_CATEGORY: &str = "SELECT id, name, has_batch, has_claim, has_time_range, has_sheets, \
     has_email, has_form, has_dor_date FROM task_categories";

fn category_from_row(row: &Row) -> rusqlite::Result<TaskCategory> {
    Ok(TaskCategory {
        id: row.get(0)?,
        name: row.get(1)?,
        capabilities: Capabilities {
            has_batch: row.get(2)?,
            has_claim: row.get(3)?,
            has_time_range: row.get(4)?,
            has_sheets: row.get(5)?,
            has_email: row.get(6)?,
            has_form: row.get(7)?,
            has_dor_date: row.get(8)?,
        },
    })
}

/// All categories in registry (id) order.
pub fn list_categories(conn: &Connection) -> Result<Vec<TaskCategory>> {
    let mut stmt = conn.prepare(&format!("{SELECT_CATEGORY} ORDER BY id"))?;
    let rows = stmt
        .query_map([], category_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn get_category(conn: &Connection, id: i64) -> Result<TaskCategory> {
    let mut stmt = conn.prepare(&format!("{SELECT_CATEGORY} WHERE id = ?1"))?;
    stmt.query_row([id], category_from_row)
        .optional()?
        .ok_or_else(|| DaybookError::not_found("category", id))
}

pub fn capability_map(conn: &Connection) -> Result<HashMap<i64, Capabilities>> {
    Ok(list_categories(conn)?
        .into_iter()
        .map(|c| (c.id, c.capabilities))
        .collect())
}

impl Capabilities {
    /// Names of populated task fields this category does not declare.
    pub fn undeclared_fields(&self, task: &NewTask) -> Vec<&'static str> {
        let mut out = Vec::new();
        if task.batch_count.is_some() && !self.has_batch {
            out.push("batch_count");
        }
        if task.claim_count.is_some() && !self.has_claim {
            out.push("claim_count");
        }
        if task.sheet_count.is_some() && !self.has_sheets {
            out.push("sheet_count");
        }
        if task.email.is_some() && !self.has_email {
            out.push("email");
        }
        if task.form.is_some() && !self.has_form {
            out.push("form");
        }
        if (task.start_time.is_some() || task.end_time.is_some()) && !self.has_time_range {
            out.push("time_range");
        }
        if task.task_date.is_some() && !self.has_dor_date {
            out.push("date");
        }
        out
    }

    /// Short labels of the fields a form for this category shows.
    pub fn labels(&self) -> Vec<&'static str> {
        [
            (self.has_dor_date, "date"),
            (self.has_batch, "batch"),
            (self.has_claim, "claim"),
            (self.has_sheets, "sheets"),
            (self.has_email, "email"),
            (self.has_form, "form"),
            (self.has_time_range, "time"),
        ]
        .into_iter()
        .filter_map(|(on, label)| on.then_some(label))
        .collect()
    }
}
