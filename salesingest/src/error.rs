use salesdw::errors::WarehouseError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("warehouse error: {0}")]
    Warehouse(#[from] WarehouseError),

    #[error("parse error at line {line}: {message}")]
    Parse { line: u64, message: String },

    #[error("invalid parameter: {0}")]
    InvalidParam(String),
}

pub type Result<T> = std::result::Result<T, IngestError>;
