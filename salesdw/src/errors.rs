use thiserror::Error;

#[derive(Error, Debug)]
pub enum WarehouseError {
    #[error("SQLite operation failed: {0}")]
    SQLite(rusqlite::Error),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid argument: {0}")]
    InvalidArg(String),

    #[error("Invalid record at row {row}: {reason}")]
    InvalidRecord { row: usize, reason: String },

    #[error("Connection lock poisoned")]
    LockPoisoned,
}

impl WarehouseError {
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, WarehouseError::ConstraintViolation(_))
    }
}

// Unique and foreign-key failures are split out so a lost first-writer race
// on a natural key is distinguishable from a store outage.
impl From<rusqlite::Error> for WarehouseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(code, _)
                if code.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                WarehouseError::ConstraintViolation(err.to_string())
            }
            _ => WarehouseError::SQLite(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, WarehouseError>;
