use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use crate::aggregation::{chart_series, dashboard, ChartRange};
use crate::cli::{open_db, parse_date_arg, today};
use crate::error::Result;
use crate::fmt::{count, pct_change};
use crate::models::DATE_FORMAT;

fn change_cell(val: f64) -> Cell {
    let text = pct_change(val);
    let styled = if val > 0.0 {
        text.green()
    } else if val < 0.0 {
        text.red()
    } else {
        text.normal()
    };
    Cell::new(styled).set_alignment(CellAlignment::Right)
}

fn total_cell(val: i64) -> Cell {
    Cell::new(count(val)).set_alignment(CellAlignment::Right)
}

pub fn run(date: Option<String>) -> Result<()> {
    let conn = open_db()?;
    let selected = match date {
        Some(d) => parse_date_arg("date", &d)?,
        None => today(),
    };
    let rows = dashboard(&conn, selected)?;

    let mut table = Table::new();
    table.set_header(vec![
        "Category", "Day", "Prev Day", "Δ Day", "Week", "Prev Week", "Δ Week", "Month",
        "Prev Month", "Δ Month", "Last 7 days",
    ]);
    for c in &rows {
        let series = chart_series(&conn, c.category_id, ChartRange::Week, selected)?;
        let trend = series
            .values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        table.add_row(vec![
            Cell::new(&c.category),
            total_cell(c.current_total),
            total_cell(c.previous_day_total),
            change_cell(c.day_change),
            total_cell(c.current_week_total),
            total_cell(c.previous_week_total),
            change_cell(c.week_change),
            total_cell(c.current_month_total),
            total_cell(c.previous_month_total),
            change_cell(c.month_change),
            Cell::new(trend),
        ]);
    }
    println!("Dashboard for {}\n{table}", selected.format(DATE_FORMAT));
    Ok(())
}
