//! Run summary
//!
//! The summary is accumulated while a run progresses and finalized once. It is
//! emitted on stdout as a single JSON object between sentinel lines so an
//! orchestrating caller can pick it out of the process output.

use crate::crawler::category_counts;
use crate::output::OutputResult;
use crate::record::ProductRecord;
use crate::storage::UpsertStats;
use chrono::Utc;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::time::Instant;

/// Line preceding the summary object
pub const OUTPUT_START: &str = "__N8N_OUTPUT_START__";

/// Line following the summary object
pub const OUTPUT_END: &str = "__N8N_OUTPUT_END__";

/// Final, immutable description of a run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub products: Vec<ProductRecord>,
    pub total: usize,
    pub categories_count: BTreeMap<String, usize>,
    pub db_stats: UpsertStats,
    pub duration_seconds: f64,
    pub timestamp: String,
}

/// Accumulates the pieces of a [`RunSummary`]
#[derive(Debug)]
pub struct RunSummaryBuilder {
    started: Instant,
    products: Vec<ProductRecord>,
    db_stats: UpsertStats,
}

impl RunSummaryBuilder {
    /// Starts the run clock
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
            products: Vec::new(),
            db_stats: UpsertStats::default(),
        }
    }

    pub fn products(&mut self, products: Vec<ProductRecord>) -> &mut Self {
        self.products = products;
        self
    }

    pub fn db_stats(&mut self, stats: UpsertStats) -> &mut Self {
        self.db_stats = stats;
        self
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    /// Stops the clock and produces the summary
    pub fn finish(self) -> RunSummary {
        let duration_seconds = self.elapsed_seconds();
        let categories_count = category_counts(&self.products);

        RunSummary {
            total: self.products.len(),
            products: self.products,
            categories_count,
            db_stats: self.db_stats,
            duration_seconds,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl RunSummary {
    /// Writes the sentinel-bounded summary block
    pub fn emit<W: Write>(&self, writer: &mut W) -> OutputResult<()> {
        writeln!(writer, "{}", OUTPUT_START)?;
        serde_json::to_writer(&mut *writer, self)?;
        writeln!(writer)?;
        writeln!(writer, "{}", OUTPUT_END)?;
        writer.flush()?;
        Ok(())
    }

    /// Logs the human-readable final report
    pub fn log_report(&self, category_total: usize) {
        tracing::info!("=== Final report ===");
        tracing::info!("Total products: {}", self.total);
        tracing::info!("Categories processed: {}", category_total);
        tracing::info!("Duration: {:.2} seconds", self.duration_seconds);
        tracing::info!(
            "Database: {} inserted, {} updated, {} errors",
            self.db_stats.inserted,
            self.db_stats.updated,
            self.db_stats.errors
        );
        tracing::info!("Products by category:");
        for (category, count) in &self.categories_count {
            tracing::info!("  {}: {}", category, count);
        }
    }
}
