//! Crawler module for walking the catalog
//!
//! This module contains the core crawling logic, including:
//! - Listing card extraction and pagination detection
//! - The per-category page walker
//! - One crawl attempt over all categories
//! - Retrying attempts with backoff

mod catalog;
mod extractor;
mod pagination;
mod retry;
mod walker;

pub use catalog::{category_counts, CatalogCrawler};
pub use extractor::{extract_products, extract_raw_products, Extraction, ItemError};
pub use pagination::{count_pages, current_page, detect_page_count};
pub use retry::{RetryOrchestrator, Sleeper, TokioSleeper};
pub use walker::{page_url, CategoryWalk, CategoryWalker, WalkState};

use crate::config::Config;
use crate::record::ProductRecord;
use crate::render::Renderer;
use std::sync::Arc;

/// Runs a complete retrying crawl over the configured categories
///
/// Every attempt opens a fresh session from `renderer`; nothing carries over
/// between attempts.
///
/// # Returns
///
/// * `Ok(records)` - Records of the first productive attempt, or empty when
///   the final attempt found nothing
/// * `Err(HarvestError)` - The final attempt failed
pub async fn harvest<R: Renderer>(
    config: Arc<Config>,
    renderer: R,
) -> crate::Result<Vec<ProductRecord>> {
    let retry = RetryOrchestrator::new(
        config.crawler.max_attempts,
        config.crawler.backoff_unit(),
    );
    let crawler = CatalogCrawler::new(Arc::clone(&config), renderer);
    let categories = &config.categories;

    retry
        .run(|_| crawler.crawl(categories))
        .await
}
