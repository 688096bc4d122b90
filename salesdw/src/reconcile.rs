use crate::errors::Result;
use crate::models::StatisticsSnapshot;
use crate::stats::round2;
use rusqlite::Connection;

/// Recomputes the price statistics from the committed fact table alone.
///
/// Rounding goes through the same helper as the in-memory accumulator, and
/// SQLite's compensated `AVG` sums the same way the accumulator does, so the
/// two views compare equal when they cover the same rows.
pub fn reconcile_statistics(conn: &Connection) -> Result<StatisticsSnapshot> {
    let (min, max, average, record_count) = conn.query_row(
        "SELECT MIN(price), MAX(price), AVG(price), COUNT(id) FROM facts_sales",
        [],
        |row| {
            Ok((
                row.get::<_, Option<f64>>(0)?,
                row.get::<_, Option<f64>>(1)?,
                row.get::<_, Option<f64>>(2)?,
                row.get::<_, i64>(3)?,
            ))
        },
    )?;

    Ok(StatisticsSnapshot {
        min: min.map(round2),
        max: max.map(round2),
        average: average.map(round2),
        record_count: record_count as u64,
    })
}
