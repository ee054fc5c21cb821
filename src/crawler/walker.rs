//! Category walker
//!
//! Walks every listing page of one category as a small state machine:
//!
//! ```text
//! Init -> Loading(1) -> Settling -> Detecting -> Extracting(1)
//!      -> Loading(n+1) -> Settling -> Extracting(n+1) -> ... -> Done
//! ```
//!
//! Failures on page 1 before detection abandon the category. Later page
//! failures skip to the next page index. The first empty page after page 1
//! ends the walk.

use crate::config::{CategorySpec, CrawlerConfig};
use crate::crawler::extractor::extract_products;
use crate::crawler::pagination::detect_page_count;
use crate::record::ProductRecord;
use crate::render::{RenderError, RenderSession};
use url::Url;

/// Position of the walker within a category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkState {
    Init,
    Loading { page: u32 },
    Settling { page: u32 },
    Detecting,
    Extracting { page: u32 },
    Done,
}

impl WalkState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }
}

/// Result of walking one category
#[derive(Debug, Clone, Default)]
pub struct CategoryWalk {
    pub records: Vec<ProductRecord>,

    /// Page count reported by the pagination detector (before clamping)
    pub pages_detected: u32,

    /// Pages whose document was read
    pub pages_visited: u32,

    /// Pages skipped after a navigation or evaluation failure
    pub pages_failed: u32,

    /// Listing cards that could not be read
    pub item_errors: usize,

    /// Whether the category was abandoned before its first page was read
    pub aborted: bool,
}

/// Walks the listing pages of a category
pub struct CategoryWalker<'a> {
    config: &'a CrawlerConfig,
}

impl<'a> CategoryWalker<'a> {
    pub fn new(config: &'a CrawlerConfig) -> Self {
        Self { config }
    }

    /// Walks `category` using `session`
    ///
    /// Never fails: whatever was collected before a category-level failure is
    /// returned.
    pub async fn walk<S>(&self, session: &mut S, category: &CategorySpec) -> CategoryWalk
    where
        S: RenderSession + ?Sized,
    {
        tracing::info!("Starting category: {}", category.name);

        let mut walk = CategoryWalk::default();

        let base_url = match Url::parse(&category.url) {
            Ok(url) => url,
            Err(e) => {
                tracing::error!("Invalid listing URL '{}': {}", category.url, e);
                walk.aborted = true;
                return walk;
            }
        };

        let mut total_pages = 1;
        let mut state = WalkState::Init;

        while !state.is_terminal() {
            state = match state {
                WalkState::Init => WalkState::Loading { page: 1 },

                WalkState::Loading { page } => {
                    let url = page_url(&base_url, page, &self.config.page_param);
                    if page > 1 {
                        session.wait(self.config.page_delay()).await;
                        tracing::info!("Loading page {}/{}: {}", page, total_pages, url);
                    } else {
                        tracing::info!("Loading {}", url);
                    }

                    match session
                        .navigate(&url, self.config.navigation_timeout())
                        .await
                    {
                        Ok(nav) if page == 1 && !nav.is_success() => {
                            tracing::warn!(
                                "Category '{}' returned HTTP {}, skipping",
                                category.name,
                                nav.status
                            );
                            walk.aborted = true;
                            WalkState::Done
                        }
                        Ok(_) => WalkState::Settling { page },
                        Err(e) => self.fail(&mut walk, category, page, total_pages, &e),
                    }
                }

                WalkState::Settling { page } => match self.settle(session).await {
                    Ok(()) if page == 1 => WalkState::Detecting,
                    Ok(()) => WalkState::Extracting { page },
                    Err(e) => self.fail(&mut walk, category, page, total_pages, &e),
                },

                WalkState::Detecting => {
                    let detected = detect_page_count(&*session, &self.config.page_param).await;
                    total_pages = detected.min(self.config.max_pages);
                    walk.pages_detected = detected;

                    if detected > total_pages {
                        tracing::warn!(
                            "Detected {} pages, limited to {}",
                            detected,
                            total_pages
                        );
                    } else {
                        tracing::info!("Detected {} page(s)", detected);
                    }

                    WalkState::Extracting { page: 1 }
                }

                WalkState::Extracting { page } => match session.document().await {
                    Ok(snapshot) => {
                        walk.pages_visited += 1;

                        let source_url = page_url(&base_url, page, &self.config.page_param);
                        let extraction = extract_products(&snapshot, &category.name);
                        walk.item_errors += extraction.errors.len();

                        if extraction.records.is_empty() {
                            tracing::warn!("No products found on page {}", page);
                            if page > 1 {
                                WalkState::Done
                            } else {
                                next_page(page, total_pages)
                            }
                        } else {
                            tracing::info!(
                                "Extracted {} products from page {}",
                                extraction.records.len(),
                                page
                            );
                            walk.records
                                .extend(extraction.records.into_iter().map(|mut record| {
                                    record.source_url = source_url.to_string();
                                    record
                                }));
                            next_page(page, total_pages)
                        }
                    }
                    Err(e) => self.fail(&mut walk, category, page, total_pages, &e),
                },

                WalkState::Done => WalkState::Done,
            };
        }

        tracing::info!(
            "Category '{}' finished: {} products",
            category.name,
            walk.records.len()
        );

        walk
    }

    /// Fixed settle wait followed by scroll-and-wait steps
    async fn settle<S>(&self, session: &mut S) -> Result<(), RenderError>
    where
        S: RenderSession + ?Sized,
    {
        session.wait(self.config.settle()).await;
        for _ in 0..self.config.scroll_steps {
            session.scroll_viewport().await?;
            session.wait(self.config.scroll_wait()).await;
        }
        Ok(())
    }

    /// Handles a failure while on `page`
    ///
    /// Before the page count is known the whole category is abandoned;
    /// afterwards the page is skipped.
    fn fail(
        &self,
        walk: &mut CategoryWalk,
        category: &CategorySpec,
        page: u32,
        total_pages: u32,
        error: &RenderError,
    ) -> WalkState {
        if page == 1 && walk.pages_detected == 0 {
            tracing::error!("Failed to open category '{}': {}", category.name, error);
            walk.aborted = true;
            return WalkState::Done;
        }

        tracing::error!("Failed to process page {}: {}", page, error);
        walk.pages_failed += 1;
        next_page(page, total_pages)
    }
}

fn next_page(page: u32, total_pages: u32) -> WalkState {
    if page < total_pages {
        WalkState::Loading { page: page + 1 }
    } else {
        WalkState::Done
    }
}

/// URL of listing page `page`; page 1 is the base URL itself
pub fn page_url(base_url: &Url, page: u32, page_param: &str) -> Url {
    if page <= 1 {
        return base_url.clone();
    }

    let kept: Vec<(String, String)> = base_url
        .query_pairs()
        .filter(|(key, _)| key != page_param)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    let mut url = base_url.clone();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair(page_param, &page.to_string());
    url
}
