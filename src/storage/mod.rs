//! Storage module for persisting harvested products
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Idempotent product upserts keyed by link
//! - Run tracking
//! - Catalog statistics

mod schema;
mod sqlite;
mod traits;

pub use sqlite::{normalize_timestamp, SqliteStorage};
pub use traits::{Storage, StorageError, StorageResult};

use crate::record::{Price, ProductStatus};
use serde::Serialize;

/// Aggregate outcome of an upsert batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UpsertStats {
    pub inserted: u64,
    pub updated: u64,
    pub errors: u64,
}

/// A product as stored in the database
#[derive(Debug, Clone, PartialEq)]
pub struct StoredProduct {
    pub id: i64,
    pub external_id: Option<String>,
    pub sku: Option<String>,
    pub name: String,
    pub price_text: Option<String>,
    pub price_value: Option<Price>,
    pub image_url: Option<String>,
    pub link: String,
    pub category: Option<String>,
    pub status: ProductStatus,
    pub source_url: Option<String>,
    pub scraped_at: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Represents a harvest run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
    pub total_products: u64,
    pub stats: UpsertStats,
    pub duration_seconds: Option<f64>,
}

/// Final state of a run, written when it finishes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunOutcome {
    pub status: RunStatus,
    pub total_products: u64,
    pub stats: UpsertStats,
    pub duration_seconds: f64,
}

/// Status of a harvest run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    /// Finished without collecting any product
    Empty,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Empty => "empty",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "empty" => Some(Self::Empty),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
