//! Parrilla-Harvest main entry point
//!
//! This is the command-line interface for the Parrilla-Harvest catalog walker.

use anyhow::Context;
use clap::Parser;
use parrilla_harvest::config::{load_config_with_hash, Config};
use parrilla_harvest::output::{load_statistics, print_statistics, read_json_export};
use parrilla_harvest::render::HttpRenderer;
use parrilla_harvest::run::run_harvest;
use parrilla_harvest::storage::{SqliteStorage, Storage};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Parrilla-Harvest: a paginated catalog walker
///
/// Walks every configured category of the catalog, normalizes the products
/// it finds and upserts them into a SQLite store keyed by product link.
#[derive(Parser, Debug)]
#[command(name = "parrilla-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A paginated catalog walker", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Only walk the category with this slug (repeatable)
    #[arg(long = "category", value_name = "SLUG")]
    categories: Vec<String>,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with_all = ["stats", "import"])]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "import"])]
    stats: bool,

    /// Upsert a previously written JSON export and exit
    #[arg(long, value_name = "FILE", conflicts_with_all = ["dry_run", "stats"])]
    import: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    config
        .select_categories(&cli.categories)
        .context("Invalid --category selection")?;

    setup_logging(cli.verbose, cli.quiet, config.crawler.debug);
    tracing::info!(
        "Configuration loaded from {} (hash: {})",
        cli.config.display(),
        config_hash
    );

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if let Some(path) = &cli.import {
        handle_import(&config, path)?;
    } else {
        handle_harvest(config, &config_hash).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr; stdout is reserved for the run summary block.
fn setup_logging(verbose: u8, quiet: bool, debug: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match (verbose, debug) {
            (0, false) => EnvFilter::new("parrilla_harvest=info,warn"),
            (0, true) | (1, _) => EnvFilter::new("parrilla_harvest=debug,info"),
            (2, _) => EnvFilter::new("parrilla_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) {
    let crawler = &config.crawler;

    println!("=== Parrilla-Harvest Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Home URL: {}", crawler.home_url);
    println!("  Page parameter: {}", crawler.page_param);
    println!("  Max pages per category: {}", crawler.max_pages);
    println!("  Max attempts: {}", crawler.max_attempts);
    println!("  Navigation timeout: {}ms", crawler.navigation_timeout_ms);
    println!(
        "  Settle: {}ms + {} x {}ms scroll",
        crawler.settle_ms, crawler.scroll_steps, crawler.scroll_wait_ms
    );
    println!(
        "  Delays: {}ms between pages, {}ms between categories",
        crawler.page_delay_ms, crawler.category_delay_ms
    );
    println!("  Debug: {}", crawler.debug);

    println!("\nSession:");
    println!("  User agent: {}", config.session.user_agent);
    println!("  Accept-Language: {}", config.session.accept_language);

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    println!("  Export: {}", config.output.export_path);

    println!("\nCategories ({}):", config.categories.len());
    for category in &config.categories {
        println!("  - {} [{}] {}", category.name, category.slug, category.url);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let storage = open_storage(config)?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --import mode: upserts a JSON export into the database
fn handle_import(config: &Config, path: &Path) -> anyhow::Result<()> {
    let records = read_json_export(path)
        .with_context(|| format!("Failed to read export {}", path.display()))?;

    let mut storage = open_storage(config)?;
    let stats = storage
        .upsert_products(&records)
        .context("Failed to save imported products")?;

    println!(
        "Imported {} products: {} inserted, {} updated, {} errors",
        records.len(),
        stats.inserted,
        stats.updated,
        stats.errors
    );

    Ok(())
}

/// Handles the main harvest: crawl, export, persist, summarize
async fn handle_harvest(config: Config, config_hash: &str) -> anyhow::Result<()> {
    let category_total = config.categories.len();

    tracing::info!("Categories: {}", category_total);
    tracing::info!("Database: {}", config.output.database_path);

    let mut storage = open_storage(&config)?;
    let config = Arc::new(config);
    let renderer = HttpRenderer::new(config.session.clone());

    let summary = run_harvest(config, renderer, &mut storage, config_hash)
        .await
        .context("Harvest failed")?;

    if let Some(summary) = summary {
        summary.log_report(category_total);
        summary
            .emit(&mut std::io::stdout().lock())
            .context("Failed to write run summary")?;
    }

    Ok(())
}

fn open_storage(config: &Config) -> anyhow::Result<SqliteStorage> {
    SqliteStorage::new(Path::new(&config.output.database_path))
        .with_context(|| format!("Failed to open database {}", config.output.database_path))
}
