use serde::Deserialize;
use std::path::PathBuf;

pub const DATA_DIR_VAR: &str = "SALESDW_DATA_DIR";
pub const TIMESTAMP_FORMAT_VAR: &str = "SALESDW_TIMESTAMP_FORMAT";
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%m/%d/%Y";

#[derive(Deserialize, Debug, Clone)]
pub struct IngestConfig {
    pub data_dir: PathBuf,
    #[serde(default = "default_timestamp_format")]
    pub timestamp_format: String,
}

fn default_timestamp_format() -> String {
    DEFAULT_TIMESTAMP_FORMAT.to_string()
}

impl IngestConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            timestamp_format: default_timestamp_format(),
        }
    }

    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self {
            data_dir: std::env::var(DATA_DIR_VAR)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./data")),
            timestamp_format: std::env::var(TIMESTAMP_FORMAT_VAR)
                .unwrap_or_else(|_| default_timestamp_format()),
        }
    }
}
