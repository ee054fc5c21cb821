//! Configuration module for Parrilla-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use parrilla_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("parrilla.toml")).unwrap();
//! println!("Walking {} categories", config.categories.len());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{CategorySpec, Config, CrawlerConfig, OutputConfig, SessionConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
