//! Parrilla-Harvest: a paginated catalog walker
//!
//! This crate walks the category listings of a client-rendered e-commerce
//! catalog, normalizes every product it finds and upserts the records into a
//! SQLite store keyed by product link, so repeated runs converge.

pub mod config;
pub mod crawler;
pub mod output;
pub mod record;
pub mod render;
pub mod run;
pub mod storage;

use thiserror::Error;

/// Main error type for Parrilla-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Rendering error: {0}")]
    Render(#[from] render::RenderError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Unknown category slug: {0}")]
    UnknownCategory(String),
}

/// Result type alias for Parrilla-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::{CategorySpec, Config};
pub use record::{parse_price, Price, PriceInfo, ProductRecord, ProductStatus};
pub use storage::{SqliteStorage, UpsertStats};
