use crate::errors::Result;
use rusqlite::{params, Connection};

/// Appends one sale. Facts are never deduplicated or updated, so every call
/// adds exactly one row, visible once the enclosing transaction commits.
pub fn insert_fact(conn: &Connection, user_id: i64, time_id: i64, price: f64) -> Result<i64> {
    conn.execute(
        "INSERT INTO facts_sales (user_id, time_id, price) VALUES (?1, ?2, ?3)",
        params![user_id, time_id, price],
    )?;
    Ok(conn.last_insert_rowid())
}
