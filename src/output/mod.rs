//! Output module for run artifacts and reports
//!
//! This module handles:
//! - Exporting extracted records as JSON (and reading them back)
//! - The machine-readable run summary block
//! - Catalog statistics for `--stats`

mod export;
pub mod stats;
mod summary;

pub use export::{read_json_export, write_json_export};
pub use stats::{load_statistics, print_statistics, CatalogStatistics};
pub use summary::{RunSummary, RunSummaryBuilder, OUTPUT_END, OUTPUT_START};

use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
