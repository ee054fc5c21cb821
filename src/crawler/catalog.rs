//! Catalog crawler
//!
//! One crawl attempt over every configured category. Owns a single rendering session for the attempt: warm-up visit first, then
//! each category in order. The session is closed on every exit path.

use crate::config::{CategorySpec, Config};
use crate::crawler::walker::CategoryWalker;
use crate::record::ProductRecord;
use crate::render::{RenderSession, Renderer};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use url::Url;

/// Walks a list of categories with one session per call
pub struct CatalogCrawler<R: Renderer> {
    config: Arc<Config>,
    renderer: R,
}

impl<R: Renderer> CatalogCrawler<R> {
    pub fn new(config: Arc<Config>, renderer: R) -> Self {
        Self { config, renderer }
    }

    /// Crawls `categories` in order and concatenates their records
    ///
    /// Category-level failures only shrink the result. A warm-up navigation
    /// error is fatal for the attempt and is returned after the session is
    /// torn down.
    pub async fn crawl(&self, categories: &[CategorySpec]) -> crate::Result<Vec<ProductRecord>> {
        let mut session = self.renderer.open().await?;

        let outcome = self.crawl_in_session(&mut session, categories).await;

        if let Err(e) = &outcome {
            tracing::error!("Crawl failed: {}", e);
            if self.config.crawler.debug {
                self.dump_page(&session).await;
            }
        }

        if let Err(e) = session.close().await {
            tracing::warn!("Failed to close rendering session: {}", e);
        }

        outcome
    }

    async fn crawl_in_session(
        &self,
        session: &mut R::Session,
        categories: &[CategorySpec],
    ) -> crate::Result<Vec<ProductRecord>> {
        let crawler = &self.config.crawler;

        self.warm_up(session).await?;

        let walker = CategoryWalker::new(crawler);
        let mut records = Vec::new();

        for (index, category) in categories.iter().enumerate() {
            if index > 0 {
                session.wait(crawler.category_delay()).await;
            }

            let walk = walker.walk(session, category).await;
            if walk.aborted {
                tracing::warn!("Category '{}' abandoned on its first page", category.name);
            }
            tracing::info!(
                "Category '{}': {} page(s) visited, {} failed, {} detected",
                category.name,
                walk.pages_visited,
                walk.pages_failed,
                walk.pages_detected
            );
            if walk.item_errors > 0 {
                tracing::warn!(
                    "{} listing item(s) unreadable in '{}'",
                    walk.item_errors,
                    category.name
                );
            }

            records.extend(walk.records);
            tracing::info!("Total so far: {} products", records.len());
        }

        if crawler.debug {
            for (category, count) in category_counts(&records) {
                tracing::debug!("  {}: {}", category, count);
            }
        }

        Ok(records)
    }

    /// Visits the home page so the session picks up cookies before listings
    ///
    /// Only a navigation error stops the attempt. A non-2xx home page is
    /// logged and the categories are still walked.
    async fn warm_up(&self, session: &mut R::Session) -> crate::Result<()> {
        let crawler = &self.config.crawler;
        let home = Url::parse(&crawler.home_url)?;

        tracing::info!("Warming up session at {}", home);
        let nav = session.navigate(&home, crawler.navigation_timeout()).await?;
        if !nav.is_success() {
            tracing::warn!("Home page {} answered HTTP {}, continuing", home, nav.status);
        }

        session.wait(crawler.warmup_wait()).await;
        Ok(())
    }

    async fn dump_page(&self, session: &R::Session) {
        let path = Path::new(&self.config.output.debug_html_path);
        match session.content().await {
            Ok(html) => match std::fs::write(path, html) {
                Ok(()) => tracing::info!("Saved current page to {}", path.display()),
                Err(e) => tracing::warn!("Failed to write {}: {}", path.display(), e),
            },
            Err(e) => tracing::warn!("No page to save: {}", e),
        }
    }
}

/// Record count per category name, sorted by name
pub fn category_counts(records: &[ProductRecord]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for record in records {
        *counts.entry(record.category.clone()).or_insert(0) += 1;
    }
    counts
}
