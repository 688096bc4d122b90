use crate::config::WarehouseConfig;
use crate::errors::{Result, WarehouseError};
use crate::models::{BatchStatus, LoadBatch, TableCounts};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex, MutexGuard};

/// Owns the SQLite connection shared by every component of a batch.
pub struct Catalog {
    conn: Arc<Mutex<Connection>>,
}

impl Catalog {
    pub fn new(config: &WarehouseConfig) -> Result<Self> {
        if let Some(parent) = config.database_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(&config.database_path)?;
        Self::from_connection(conn)
    }

    pub fn from_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", true)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| WarehouseError::LockPoisoned)
    }

    pub fn initialize_schema(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            "BEGIN;
            CREATE TABLE IF NOT EXISTS dim_user (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_key INTEGER NOT NULL UNIQUE
            );
            CREATE TABLE IF NOT EXISTS dim_time (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                date TEXT NOT NULL UNIQUE,
                year INTEGER NOT NULL,
                semester INTEGER NOT NULL CHECK (semester IN (1, 2)),
                trimester INTEGER NOT NULL CHECK (trimester BETWEEN 1 AND 4),
                month INTEGER NOT NULL CHECK (month BETWEEN 1 AND 12)
            );
            CREATE TABLE IF NOT EXISTS facts_sales (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES dim_user(id),
                time_id INTEGER NOT NULL REFERENCES dim_time(id),
                price REAL NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_facts_sales_user ON facts_sales(user_id);
            CREATE INDEX IF NOT EXISTS idx_facts_sales_time ON facts_sales(time_id);
            CREATE TABLE IF NOT EXISTS load_batches (
                batch_id INTEGER PRIMARY KEY AUTOINCREMENT,
                source TEXT NOT NULL,
                started_at INTEGER NOT NULL,
                finished_at INTEGER,
                status TEXT NOT NULL,
                rows INTEGER NOT NULL DEFAULT 0,
                details TEXT
            );
            COMMIT;",
        )?;
        Ok(())
    }

    pub fn table_counts(&self) -> Result<TableCounts> {
        let conn = self.lock()?;
        let count = |table: &str| -> Result<i64> {
            let sql = format!("SELECT COUNT(*) FROM {table}");
            Ok(conn.query_row(&sql, [], |row| row.get(0))?)
        };
        Ok(TableCounts {
            users: count("dim_user")?,
            time_buckets: count("dim_time")?,
            sales: count("facts_sales")?,
        })
    }

    // The audit rows are written in autocommit mode, outside any batch
    // transaction, so a failed batch still leaves its trace.

    pub fn begin_batch(&self, source: &str) -> Result<i64> {
        let conn = self.lock()?;
        let started_at = chrono::Utc::now().timestamp();
        conn.execute(
            "INSERT INTO load_batches (source, started_at, status) VALUES (?1, ?2, ?3)",
            params![source, started_at, BatchStatus::Running.as_str()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn finish_batch(
        &self,
        batch_id: i64,
        status: BatchStatus,
        rows: usize,
        details: Option<&str>,
    ) -> Result<()> {
        let conn = self.lock()?;
        let finished_at = chrono::Utc::now().timestamp();
        conn.execute(
            "UPDATE load_batches SET status = ?1, rows = ?2, details = ?3, finished_at = ?4 WHERE batch_id = ?5",
            params![status.as_str(), rows as i64, details, finished_at, batch_id],
        )?;
        Ok(())
    }

    pub fn list_batches(&self) -> Result<Vec<LoadBatch>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT batch_id, source, started_at, finished_at, status, rows, details
             FROM load_batches ORDER BY batch_id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, Option<i64>>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, i64>(5)?,
                row.get::<_, Option<String>>(6)?,
            ))
        })?;

        let mut batches = Vec::new();
        for row in rows {
            let (batch_id, source, started_at, finished_at, status, rows, details) = row?;
            let status = BatchStatus::parse(&status).ok_or_else(|| {
                WarehouseError::InvalidArg(format!("unknown batch status '{status}'"))
            })?;
            batches.push(LoadBatch {
                batch_id,
                source,
                started_at,
                finished_at,
                status,
                rows,
                details,
            });
        }
        Ok(batches)
    }
}
