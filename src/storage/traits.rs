//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::record::ProductRecord;
use crate::storage::{RunOutcome, RunRecord, StoredProduct, UpsertStats};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Invalid timestamp '{value}': {reason}")]
    InvalidTimestamp { value: String, reason: String },

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
pub trait Storage {
    // ===== Products =====

    /// Inserts or updates a batch of records keyed by link
    ///
    /// Each record is applied on its own: a rejected record is counted in
    /// `errors` and the rest of the batch still lands. Only a failure to open
    /// or commit the batch is returned as an error.
    fn upsert_products(&mut self, records: &[ProductRecord]) -> StorageResult<UpsertStats>;

    /// Gets a stored product by its link
    fn get_product_by_link(&self, link: &str) -> StorageResult<Option<StoredProduct>>;

    // ===== Run Management =====

    /// Creates a new harvest run
    ///
    /// # Arguments
    ///
    /// * `config_hash` - Hash of the configuration file
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64>;

    /// Closes a run with its final status and counts
    fn finish_run(&mut self, run_id: i64, outcome: &RunOutcome) -> StorageResult<()>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Most recent runs, newest first
    fn recent_runs(&self, limit: usize) -> StorageResult<Vec<RunRecord>>;

    // ===== Statistics =====

    /// Gets total product count
    fn count_products(&self) -> StorageResult<u64>;

    /// Counts products with a numeric price
    fn count_priced(&self) -> StorageResult<u64>;

    /// Product count per category, sorted by category
    fn count_by_category(&self) -> StorageResult<Vec<(String, u64)>>;
}
