use crate::clean::{drop_rows_with_missing, transform_timestamp};
use crate::config::IngestConfig;
use crate::error::{IngestError, Result};
use crate::source::{detect_csv_files, partition_validation, read_csv_file};
use salesdw::models::{LoadReport, StatisticsSnapshot};
use salesdw::stats::StatisticsAccumulator;
use salesdw::Warehouse;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Clone)]
pub struct FileReport {
    pub path: PathBuf,
    pub rows_read: usize,
    pub rows_dropped: usize,
    pub load: LoadReport,
    /// Price statistics of this file's cleaned rows alone.
    pub file_statistics: StatisticsSnapshot,
    /// Running statistics after this file.
    pub global_statistics: StatisticsSnapshot,
}

#[derive(Debug, Serialize, Clone)]
pub struct RunReport {
    pub files: Vec<FileReport>,
    pub reconciled_before_validation: StatisticsSnapshot,
    pub validation: Option<FileReport>,
    pub reconciled_final: StatisticsSnapshot,
}

/// Reads, cleans and loads CSV files one at a time into a `Warehouse`.
///
/// The pipeline owns the running statistics for its whole lifetime; each
/// file is loaded completely before the next one starts.
pub struct Pipeline {
    warehouse: Warehouse,
    config: IngestConfig,
    stats: StatisticsAccumulator,
}

impl Pipeline {
    pub fn new(warehouse: Warehouse, config: IngestConfig) -> Self {
        Self {
            warehouse,
            config,
            stats: StatisticsAccumulator::new(),
        }
    }

    pub fn warehouse(&self) -> &Warehouse {
        &self.warehouse
    }

    /// In-memory statistics over every row loaded by this pipeline.
    pub fn get_statistics(&self) -> StatisticsSnapshot {
        self.stats.snapshot()
    }

    /// Statistics recomputed from the committed fact table.
    pub fn reconcile_statistics(&self) -> Result<StatisticsSnapshot> {
        Ok(self.warehouse.reconcile_statistics()?)
    }

    pub fn process_file(&mut self, path: &Path) -> Result<FileReport> {
        log::info!("Working with: {}", path.display());

        let raw = read_csv_file(path)?;
        let rows_read = raw.len();
        log::info!("Shape original - ({rows_read} rows)");

        let complete = drop_rows_with_missing(raw);
        log::info!(
            "Shape after remove row with any missing value - ({} rows)",
            complete.len()
        );

        let clean = transform_timestamp(&complete, &self.config.timestamp_format)?;
        log::info!("Shape after transform timestamp - ({} rows)", clean.len());

        let mut file_stats = StatisticsAccumulator::new();
        for record in &clean {
            file_stats.update(record.price);
        }

        let source = path.to_string_lossy();
        let load = self.warehouse.load(&source, &clean, &mut self.stats)?;

        let report = FileReport {
            path: path.to_path_buf(),
            rows_read,
            rows_dropped: rows_read - clean.len(),
            load,
            file_statistics: file_stats.snapshot(),
            global_statistics: self.stats.snapshot(),
        };
        log::info!(
            "Statistics for column 'price' in {}: {:?}",
            path.display(),
            report.file_statistics
        );
        log::info!("Global statistics for column 'price': {:?}", report.global_statistics);
        Ok(report)
    }

    /// Loads every regular CSV file in `data_dir` (or the configured
    /// directory), then the validation file, reconciling against the
    /// database before and after the validation file.
    pub fn run(&mut self, data_dir: Option<&Path>) -> Result<RunReport> {
        let dir = data_dir
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.config.data_dir.clone());
        if !dir.is_dir() {
            return Err(IngestError::InvalidParam(format!(
                "data directory '{}' does not exist",
                dir.display()
            )));
        }

        let (regular, validation) = partition_validation(detect_csv_files(&dir)?);
        if regular.is_empty() && validation.is_none() {
            log::warn!("No CSV files to load in {}", dir.display());
        }

        let mut files = Vec::with_capacity(regular.len());
        for path in &regular {
            files.push(self.process_file(path)?);
        }

        let reconciled_before_validation = self.reconcile_statistics()?;
        log::info!("Stats from DB: {:?}", reconciled_before_validation);

        let validation = match validation {
            Some(path) => {
                log::info!("Validation file");
                Some(self.process_file(&path)?)
            }
            None => None,
        };

        let reconciled_final = self.reconcile_statistics()?;
        log::info!("Stats from DB: {:?}", reconciled_final);

        Ok(RunReport {
            files,
            reconciled_before_validation,
            validation,
            reconciled_final,
        })
    }
}
