pub mod catalog;
pub mod config;
pub mod dimension;
pub mod errors;
pub mod fact;
pub mod loader;
pub mod models;
pub mod reconcile;
pub mod stats;

use crate::catalog::Catalog;
use crate::config::WarehouseConfig;
use crate::errors::Result;
use crate::loader::BatchLoader;
use crate::models::{BatchStatus, CleanRecord, LoadBatch, LoadReport, StatisticsSnapshot, TableCounts};
use crate::stats::StatisticsAccumulator;
use std::sync::Arc;

/// The main entry point for the `salesdw` library.
///
/// `Warehouse` owns the SQLite-backed star schema for sales:
/// - `dim_user` and `dim_time` dimension tables, one row per natural key.
/// - `facts_sales`, one row per loaded input row, referencing both dimensions.
/// - `load_batches`, an audit log with one entry per `load` call.
///
/// The statistics accumulator is not owned here. Callers construct one and
/// pass it to every `load`, which keeps the running view explicit.
///
/// # Example
///
/// ```rust,no_run
/// use salesdw::{Warehouse, config::WarehouseConfig, models::CleanRecord, stats::StatisticsAccumulator};
///
/// let warehouse = Warehouse::open(WarehouseConfig::new("warehouse.sqlite")).unwrap();
/// let mut stats = StatisticsAccumulator::new();
/// let rows: Vec<CleanRecord> = Vec::new();
/// warehouse.load("sales.csv", &rows, &mut stats).unwrap();
/// assert_eq!(stats.snapshot(), warehouse.reconcile_statistics().unwrap());
/// ```
pub struct Warehouse {
    pub config: WarehouseConfig,
    pub catalog: Arc<Catalog>,
    loader: BatchLoader,
}

impl Warehouse {
    /// Opens (or creates) the database file and makes sure the schema exists.
    pub fn open(config: WarehouseConfig) -> Result<Self> {
        let catalog = Arc::new(Catalog::new(&config)?);
        catalog.initialize_schema()?;
        let loader = BatchLoader::new(config.dimension_commit);
        Ok(Self {
            config,
            catalog,
            loader,
        })
    }

    /// Loads one batch of cleaned rows, in order, and records it in the audit log.
    ///
    /// `source` names the batch in the log, usually the input file.
    pub fn load<'a, I>(
        &self,
        source: &str,
        rows: I,
        stats: &mut StatisticsAccumulator,
    ) -> Result<LoadReport>
    where
        I: IntoIterator<Item = &'a CleanRecord>,
        I::IntoIter: Clone,
    {
        let batch_id = self.catalog.begin_batch(source)?;
        log::info!(
            "Loading batch {} from '{}' ({:?})",
            batch_id,
            source,
            self.loader.mode()
        );

        let result = {
            let mut conn = self.catalog.lock()?;
            self.loader.load(&mut conn, rows, stats)
        };

        match &result {
            Ok(report) => {
                self.catalog
                    .finish_batch(batch_id, BatchStatus::Success, report.rows, None)?;
                log::info!(
                    "Batch {} loaded: {} facts, {} new users, {} new time buckets",
                    batch_id,
                    report.facts_inserted,
                    report.users_created,
                    report.time_buckets_created
                );
            }
            Err(err) => {
                log::error!("Batch {} from '{}' failed: {}", batch_id, source, err);
                let details = err.to_string();
                if let Err(log_err) =
                    self.catalog
                        .finish_batch(batch_id, BatchStatus::Failed, 0, Some(&details))
                {
                    log::warn!("Could not mark batch {} as failed: {}", batch_id, log_err);
                }
            }
        }
        result
    }

    /// Min/max/average/count recomputed from the committed fact table.
    pub fn reconcile_statistics(&self) -> Result<StatisticsSnapshot> {
        let conn = self.catalog.lock()?;
        reconcile::reconcile_statistics(&conn)
    }

    pub fn table_counts(&self) -> Result<TableCounts> {
        self.catalog.table_counts()
    }

    pub fn list_batches(&self) -> Result<Vec<LoadBatch>> {
        self.catalog.list_batches()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_warehouse_initialization() {
        let dir = tempdir().unwrap();
        let config = WarehouseConfig::new(dir.path().join("nested/dw.sqlite"));

        let warehouse = Warehouse::open(config.clone());
        assert!(warehouse.is_ok());
        assert!(config.database_path.exists());
        assert_eq!(
            warehouse.unwrap().table_counts().unwrap(),
            TableCounts::default()
        );
    }

    #[test]
    fn reopening_keeps_loaded_data() {
        let dir = tempdir().unwrap();
        let config = WarehouseConfig::new(dir.path().join("dw.sqlite"));
        let date = chrono::NaiveDate::from_ymd_opt(2021, 5, 5)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let rows = vec![CleanRecord::new(3, 12.5, date)];

        {
            let warehouse = Warehouse::open(config.clone()).unwrap();
            let mut stats = StatisticsAccumulator::new();
            warehouse.load("first.csv", &rows, &mut stats).unwrap();
        }

        let warehouse = Warehouse::open(config).unwrap();
        assert_eq!(warehouse.table_counts().unwrap().sales, 1);
        assert_eq!(warehouse.reconcile_statistics().unwrap().max, Some(12.5));
    }
}
