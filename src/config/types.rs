use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Parrilla-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub session: SessionConfig,
    pub output: OutputConfig,
    #[serde(rename = "category", default)]
    pub categories: Vec<CategorySpec>,
}

impl Config {
    /// Restricts the category list to the given slugs, keeping config order
    ///
    /// An empty selection keeps every category. Unknown slugs are rejected so a
    /// typo never silently turns into an empty run.
    pub fn select_categories(&mut self, slugs: &[String]) -> crate::ConfigResult<()> {
        if slugs.is_empty() {
            return Ok(());
        }

        for slug in slugs {
            if !self.categories.iter().any(|c| &c.slug == slug) {
                return Err(crate::ConfigError::UnknownCategory(slug.clone()));
            }
        }

        self.categories.retain(|c| slugs.contains(&c.slug));
        Ok(())
    }
}

/// Crawl behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Entry point visited once per session before any category
    #[serde(rename = "home-url")]
    pub home_url: String,

    /// Query parameter carrying the listing page number
    #[serde(rename = "page-param", default = "default_page_param")]
    pub page_param: String,

    /// Ceiling on pages walked per category
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: u32,

    /// Number of crawl attempts before giving up
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Timeout for a single navigation (milliseconds)
    #[serde(rename = "navigation-timeout-ms", default = "default_navigation_timeout")]
    pub navigation_timeout_ms: u64,

    /// Wait after every navigation (milliseconds)
    #[serde(rename = "settle-ms", default = "default_settle")]
    pub settle_ms: u64,

    /// Number of scroll-and-wait steps after settling
    #[serde(rename = "scroll-steps", default = "default_scroll_steps")]
    pub scroll_steps: u32,

    /// Wait after each scroll step (milliseconds)
    #[serde(rename = "scroll-wait-ms", default = "default_scroll_wait")]
    pub scroll_wait_ms: u64,

    /// Delay between successive listing pages (milliseconds)
    #[serde(rename = "page-delay-ms", default = "default_page_delay")]
    pub page_delay_ms: u64,

    /// Delay between categories (milliseconds)
    #[serde(rename = "category-delay-ms", default = "default_category_delay")]
    pub category_delay_ms: u64,

    /// Wait after the warm-up navigation (milliseconds)
    #[serde(rename = "warmup-wait-ms", default = "default_warmup_wait")]
    pub warmup_wait_ms: u64,

    /// Backoff unit: attempt `n` waits `unit * 2^n` (milliseconds)
    #[serde(rename = "backoff-unit-ms", default = "default_backoff_unit")]
    pub backoff_unit_ms: u64,

    /// Verbose diagnostics and HTML dumps on crawl failure
    #[serde(default)]
    pub debug: bool,
}

impl CrawlerConfig {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn scroll_wait(&self) -> Duration {
        Duration::from_millis(self.scroll_wait_ms)
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    pub fn category_delay(&self) -> Duration {
        Duration::from_millis(self.category_delay_ms)
    }

    pub fn warmup_wait(&self) -> Duration {
        Duration::from_millis(self.warmup_wait_ms)
    }

    pub fn backoff_unit(&self) -> Duration {
        Duration::from_millis(self.backoff_unit_ms)
    }
}

/// Identity presented by the rendering session
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    #[serde(rename = "accept-language", default = "default_accept_language")]
    pub accept_language: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            accept_language: default_accept_language(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Path to the JSON export of the extracted records
    #[serde(rename = "export-path")]
    pub export_path: String,

    /// Where the rendered page is dumped when a crawl fails in debug mode
    #[serde(rename = "debug-html-path", default = "default_debug_html_path")]
    pub debug_html_path: String,
}

/// A catalog category to walk
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CategorySpec {
    /// Display name, attached to every record found in the category
    pub name: String,

    /// Base listing URL (page 1)
    pub url: String,

    /// Short stable identifier
    pub slug: String,
}

fn default_page_param() -> String {
    "pagina".to_string()
}

fn default_max_pages() -> u32 {
    20
}

fn default_max_attempts() -> u32 {
    3
}

fn default_navigation_timeout() -> u64 {
    60_000
}

fn default_settle() -> u64 {
    3_000
}

fn default_scroll_steps() -> u32 {
    3
}

fn default_scroll_wait() -> u64 {
    800
}

fn default_page_delay() -> u64 {
    1_500
}

fn default_category_delay() -> u64 {
    2_000
}

fn default_warmup_wait() -> u64 {
    2_000
}

fn default_backoff_unit() -> u64 {
    1_000
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string()
}

fn default_accept_language() -> String {
    "pt-BR".to_string()
}

fn default_debug_html_path() -> String {
    "debug_page.html".to_string()
}
