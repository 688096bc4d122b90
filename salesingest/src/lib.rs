pub mod clean;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod source;

pub use config::IngestConfig;
pub use error::{IngestError, Result};
pub use pipeline::{FileReport, Pipeline, RunReport};
