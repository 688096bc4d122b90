use crate::error::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const VALIDATION_MARKER: &str = "validation";

/// One CSV row as read, before cleaning. Blank cells are `None`.
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct RawRecord {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub user_id: Option<i64>,
    /// Line in the source file, for error messages.
    #[serde(skip)]
    pub line: u64,
}

/// Lists the `.csv` files directly inside `dir`, sorted by file name.
pub fn detect_csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_csv = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);
        if path.is_file() && is_csv {
            files.push(path);
        }
    }
    files.sort();

    if files.is_empty() {
        log::debug!("No CSV files found in {}", dir.display());
    }
    Ok(files)
}

/// Splits off the validation file, which is loaded after everything else.
///
/// When several names contain the marker the last one wins and the others are
/// treated as regular input.
pub fn partition_validation(files: Vec<PathBuf>) -> (Vec<PathBuf>, Option<PathBuf>) {
    let position = files.iter().rposition(|path| {
        path.file_name()
            .map(|name| name.to_string_lossy().contains(VALIDATION_MARKER))
            .unwrap_or(false)
    });
    match position {
        Some(idx) => {
            let mut regular = files;
            let validation = regular.remove(idx);
            (regular, Some(validation))
        }
        None => (files, None),
    }
}

pub fn read_csv_file(path: &Path) -> Result<Vec<RawRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)?;
    let headers = reader.headers()?.clone();

    let mut records = Vec::new();
    for result in reader.records() {
        let row = result?;
        let line = row.position().map(|p| p.line()).unwrap_or(0);
        let mut record: RawRecord = row.deserialize(Some(&headers))?;
        record.line = line;
        records.push(record);
    }
    log::debug!("Read {} rows from {}", records.len(), path.display());
    Ok(records)
}
