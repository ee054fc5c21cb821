//! Run lifecycle
//!
//! Ties one harvest to a row in the `runs` table: the row is opened before
//! crawling and closed with a final status on every exit path.

use crate::config::Config;
use crate::crawler::harvest;
use crate::output::{write_json_export, RunSummary, RunSummaryBuilder};
use crate::render::Renderer;
use crate::storage::{RunOutcome, RunStatus, Storage, UpsertStats};
use std::path::Path;
use std::sync::Arc;

/// Crawls, exports and persists one run, recording it in `storage`
///
/// # Returns
///
/// * `Ok(Some(summary))` - Products were collected and saved
/// * `Ok(None)` - The final attempt found nothing; the run is marked `empty`
/// * `Err(HarvestError)` - Crawling or saving failed; the run is marked `failed`
pub async fn run_harvest<R, S>(
    config: Arc<Config>,
    renderer: R,
    storage: &mut S,
    config_hash: &str,
) -> crate::Result<Option<RunSummary>>
where
    R: Renderer,
    S: Storage + ?Sized,
{
    let mut summary = RunSummaryBuilder::start();
    let run_id = storage.create_run(config_hash)?;
    tracing::debug!("Opened run {}", run_id);

    let products = match harvest(Arc::clone(&config), renderer).await {
        Ok(products) => products,
        Err(e) => {
            tracing::error!("Fatal error: {}", e);
            finish_run(storage, run_id, &summary, RunStatus::Failed, 0, UpsertStats::default());
            return Err(e);
        }
    };

    if products.is_empty() {
        tracing::warn!("No products were found");
        finish_run(storage, run_id, &summary, RunStatus::Empty, 0, UpsertStats::default());
        return Ok(None);
    }

    let total = products.len() as u64;

    if let Err(e) = write_json_export(Path::new(&config.output.export_path), &products) {
        tracing::error!("Failed to write JSON export: {}", e);
    }

    tracing::info!("Saving {} products to the database", products.len());
    let stats = match storage.upsert_products(&products) {
        Ok(stats) => stats,
        Err(e) => {
            tracing::error!("Failed to save products: {}", e);
            finish_run(storage, run_id, &summary, RunStatus::Failed, total, UpsertStats::default());
            return Err(e.into());
        }
    };

    finish_run(storage, run_id, &summary, RunStatus::Completed, total, stats);

    summary.products(products).db_stats(stats);
    Ok(Some(summary.finish()))
}

/// Closes the run row; a failure here is logged, not returned
fn finish_run<S: Storage + ?Sized>(
    storage: &mut S,
    run_id: i64,
    summary: &RunSummaryBuilder,
    status: RunStatus,
    total_products: u64,
    stats: UpsertStats,
) {
    let outcome = RunOutcome {
        status,
        total_products,
        stats,
        duration_seconds: summary.elapsed_seconds(),
    };
    if let Err(e) = storage.finish_run(run_id, &outcome) {
        tracing::warn!("Failed to record run {}: {}", run_id, e);
    }
}
