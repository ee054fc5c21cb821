//! Statistics generation from the product database
//!
//! This module provides functionality for extracting and displaying
//! catalog statistics from the storage layer.

use crate::storage::{RunRecord, Storage};
use crate::HarvestError;

/// Number of runs shown in the statistics report
const RECENT_RUNS: usize = 5;

/// Catalog statistics summary
#[derive(Debug, Clone)]
pub struct CatalogStatistics {
    /// Total number of stored products
    pub total_products: u64,

    /// Products with a numeric price
    pub priced_products: u64,

    /// Product count per category, sorted by category
    pub by_category: Vec<(String, u64)>,

    /// Latest runs, newest first
    pub recent_runs: Vec<RunRecord>,
}

impl CatalogStatistics {
    /// Products shown as "consult price"
    pub fn consult_products(&self) -> u64 {
        self.total_products.saturating_sub(self.priced_products)
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(CatalogStatistics)` - Successfully loaded statistics
/// * `Err(HarvestError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn Storage) -> Result<CatalogStatistics, HarvestError> {
    Ok(CatalogStatistics {
        total_products: storage.count_products()?,
        priced_products: storage.count_priced()?,
        by_category: storage.count_by_category()?,
        recent_runs: storage.recent_runs(RECENT_RUNS)?,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CatalogStatistics) {
    println!("=== Catalog Statistics ===\n");

    println!("Overview:");
    println!("  Total products: {}", stats.total_products);
    println!("  With price: {}", stats.priced_products);
    println!("  Consult price: {}", stats.consult_products());
    println!();

    if !stats.by_category.is_empty() {
        println!("Products by Category:");
        for (category, count) in &stats.by_category {
            let percentage = if stats.total_products > 0 {
                (*count as f64 / stats.total_products as f64) * 100.0
            } else {
                0.0
            };
            let label = if category.is_empty() {
                "(none)"
            } else {
                category.as_str()
            };
            println!("  {}: {} ({:.1}%)", label, count, percentage);
        }
        println!();
    }

    if !stats.recent_runs.is_empty() {
        println!("Recent Runs:");
        for run in &stats.recent_runs {
            let duration = run
                .duration_seconds
                .map(|d| format!("{:.1}s", d))
                .unwrap_or_else(|| "-".to_string());
            println!(
                "  #{} {} [{}] {} products ({} new, {} updated, {} errors) in {}",
                run.id,
                run.started_at,
                run.status.to_db_string(),
                run.total_products,
                run.stats.inserted,
                run.stats.updated,
                run.stats.errors,
                duration
            );
        }
    }
}
