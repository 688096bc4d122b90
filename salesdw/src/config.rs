use crate::errors::{Result, WarehouseError};
use serde::Deserialize;
use std::path::PathBuf;
use std::str::FromStr;

pub const DATABASE_PATH_VAR: &str = "SALESDW_DATABASE_PATH";
pub const DIMENSION_COMMIT_VAR: &str = "SALESDW_DIMENSION_COMMIT";
const DEFAULT_DATABASE_PATH: &str = "warehouse.sqlite";

/// When the dimension pre-pass of a batch becomes durable.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DimensionCommit {
    /// Dimensions and facts share one transaction; a failed batch leaves nothing behind.
    #[default]
    WithFacts,
    /// Dimensions are committed before facts are written. A failed batch
    /// leaves its new dimension rows, which a re-run simply reuses.
    BeforeFacts,
}

impl FromStr for DimensionCommit {
    type Err = WarehouseError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "with_facts" => Ok(DimensionCommit::WithFacts),
            "before_facts" => Ok(DimensionCommit::BeforeFacts),
            other => Err(WarehouseError::Config(format!(
                "unknown dimension commit mode '{other}' (expected with_facts or before_facts)"
            ))),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct WarehouseConfig {
    pub database_path: PathBuf,
    #[serde(default)]
    pub dimension_commit: DimensionCommit,
}

impl WarehouseConfig {
    pub fn new(database_path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: database_path.into(),
            dimension_commit: DimensionCommit::default(),
        }
    }

    pub fn with_dimension_commit(mut self, mode: DimensionCommit) -> Self {
        self.dimension_commit = mode;
        self
    }

    /// Builds the config from the process environment, loading a `.env` file first if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        let database_path = std::env::var(DATABASE_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATABASE_PATH));
        let dimension_commit = match std::env::var(DIMENSION_COMMIT_VAR) {
            Ok(raw) => raw.parse()?,
            Err(_) => DimensionCommit::default(),
        };
        Ok(Self {
            database_path,
            dimension_commit,
        })
    }
}
