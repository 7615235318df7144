use crate::aggregation::{chart_series, ChartData, ChartRange};
use crate::cli::{open_db, today};
use crate::error::Result;

pub fn run(category_id: i64, range: &str) -> Result<()> {
    let conn = open_db()?;
    let range = ChartRange::parse_or_default(range);
    let series = chart_series(&conn, category_id, range, today())?;
    tracing::debug!(category_id, %range, points = series.labels.len(), "chart series");
    let body = ChartData::from(series);
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}
