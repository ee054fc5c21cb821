//! Integration tests for the harvester
//!
//! These tests use wiremock to serve a mock catalog and drive the full
//! crawl cycle end-to-end through the HTTP rendering session.

use parrilla_harvest::config::{parse_config, Config};
use parrilla_harvest::crawler::{category_counts, harvest};
use parrilla_harvest::output::{read_json_export, write_json_export, RunSummaryBuilder};
use parrilla_harvest::render::HttpRenderer;
use parrilla_harvest::run::run_harvest;
use parrilla_harvest::storage::{RunStatus, SqliteStorage, Storage};
use parrilla_harvest::HarvestError;
use std::collections::BTreeMap;
use std::sync::Arc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock catalog
fn create_test_config(base_url: &str, db_path: &str, categories: &[(&str, &str)]) -> Config {
    let mut toml = format!(
        r#"
[crawler]
home-url = "{base}/"
max-attempts = 2
navigation-timeout-ms = 5000
settle-ms = 0
scroll-steps = 1
scroll-wait-ms = 0
page-delay-ms = 0
category-delay-ms = 0
warmup-wait-ms = 0
backoff-unit-ms = 1

[output]
database-path = "{db}"
export-path = "produtos.json"
"#,
        base = base_url,
        db = db_path
    );

    for (name, slug) in categories {
        toml.push_str(&format!(
            "\n[[category]]\nname = \"{}\"\nurl = \"{}/{}\"\nslug = \"{}\"\n",
            name, base_url, slug, slug
        ));
    }

    parse_config(&toml).expect("test config should be valid")
}

/// Listing markup with `count` product cards and pagination labels `1..=pages`
fn listing_html(prefix: &str, count: usize, pages: u32) -> String {
    let items: String = (0..count)
        .map(|i| {
            format!(
                r#"<li><div class="listagem-item prod-id-{i}">
                    <a class="produto-sobrepor" href="/produto/{prefix}-{i}"></a>
                    <span class="nome-produto">{prefix} {i}</span>
                    <div class="preco-parcela">10x <strong class="cor-principal">R$ R$ 1.510,40</strong></div>
                </div></li>"#,
                i = i,
                prefix = prefix
            )
        })
        .collect();

    let labels: String = (1..=pages)
        .map(|p| format!(r#"<a href="?pagina={p}">{p}</a>"#, p = p))
        .collect();

    format!(
        r#"<html><body><ul class="vitrine">{}</ul><div class="paginacao">{}</div></body></html>"#,
        items, labels
    )
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html; charset=utf-8")
}

/// Mounts the home page and a two-category catalog
///
/// Category A: page 1 with 20 items and 2 pagination labels, page 2 with 5.
/// Category B: a single page of 10 items.
async fn mount_catalog(mock_server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html("<html><body>Home</body></html>".to_string()))
        .mount(mock_server)
        .await;

    // Paged requests are mounted before the bare listing so they win
    Mock::given(method("GET"))
        .and(path("/a"))
        .and(query_param("pagina", "2"))
        .respond_with(html(listing_html("a2", 5, 2)))
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/a"))
        .and(query_param("pagina", "3"))
        .respond_with(html(listing_html("a3", 7, 3)))
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(html(listing_html("a1", 20, 2)))
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(html(listing_html("b1", 10, 0)))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_full_harvest_two_categories() {
    let mock_server = MockServer::start().await;
    mount_catalog(&mock_server).await;

    let config = create_test_config(&mock_server.uri(), ":memory:", &[("A", "a"), ("B", "b")]);
    let config = Arc::new(config);
    let renderer = HttpRenderer::new(config.session.clone());

    let products = harvest(Arc::clone(&config), renderer)
        .await
        .expect("harvest should succeed");

    assert_eq!(products.len(), 35);
    assert_eq!(
        category_counts(&products),
        BTreeMap::from([("A".to_string(), 25), ("B".to_string(), 10)])
    );

    // Page 3 is beyond the detected page count and never visited
    assert!(products.iter().all(|p| !p.name.starts_with("a3")));

    let first = &products[0];
    assert_eq!(first.link, format!("{}/produto/a1-0", mock_server.uri()));
    assert_eq!(first.price_display_text, "R$ 1.510,40");
    assert_eq!(
        first.price_numeric_value.map(|p| p.cents()),
        Some(151_040)
    );
    assert_eq!(first.source_url, format!("{}/a", mock_server.uri()));

    let paged = products.iter().find(|p| p.name == "a2 0").unwrap();
    assert_eq!(paged.source_url, format!("{}/a?pagina=2", mock_server.uri()));
}

#[tokio::test]
async fn test_missing_category_is_skipped() {
    let mock_server = MockServer::start().await;
    mount_catalog(&mock_server).await;

    let config = create_test_config(
        &mock_server.uri(),
        ":memory:",
        &[("Gone", "gone"), ("B", "b")],
    );
    let config = Arc::new(config);
    let renderer = HttpRenderer::new(config.session.clone());

    let products = harvest(Arc::clone(&config), renderer).await.unwrap();

    assert_eq!(products.len(), 10);
    assert!(products.iter().all(|p| p.category == "B"));
}

#[tokio::test]
async fn test_unreachable_home_exhausts_attempts() {
    let mock_server = MockServer::start().await;
    mount_catalog(&mock_server).await;

    let mut config = create_test_config(&mock_server.uri(), ":memory:", &[("A", "a")]);
    // Nothing listens on the discard port, so the warm-up navigation itself fails
    config.crawler.home_url = "http://127.0.0.1:9/".to_string();
    let config = Arc::new(config);
    let renderer = HttpRenderer::new(config.session.clone());

    let result = harvest(Arc::clone(&config), renderer).await;

    assert!(matches!(result, Err(HarvestError::Render(_))));
}

#[tokio::test]
async fn test_missing_home_page_still_harvests() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(html(listing_html("b1", 10, 0)))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), ":memory:", &[("B", "b")]);
    let config = Arc::new(config);
    let renderer = HttpRenderer::new(config.session.clone());

    let products = harvest(Arc::clone(&config), renderer)
        .await
        .expect("a 404 home page should not stop the crawl");

    assert_eq!(products.len(), 10);
}

#[tokio::test]
async fn test_run_is_recorded_end_to_end() {
    let mock_server = MockServer::start().await;
    mount_catalog(&mock_server).await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("produtos.db");
    let mut config = create_test_config(
        &mock_server.uri(),
        &db_path.to_string_lossy(),
        &[("A", "a"), ("B", "b")],
    );
    config.output.export_path = dir.path().join("produtos.json").to_string_lossy().to_string();
    let config = Arc::new(config);

    let mut storage = SqliteStorage::new(&db_path).unwrap();
    let summary = run_harvest(
        Arc::clone(&config),
        HttpRenderer::new(config.session.clone()),
        &mut storage,
        "cafebabe",
    )
    .await
    .unwrap()
    .expect("catalog has products");

    assert_eq!(summary.total, 35);
    assert_eq!(summary.db_stats.inserted, 35);

    let runs = storage.recent_runs(5).unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].status, RunStatus::Completed);
    assert_eq!(runs[0].total_products, 35);
    assert_eq!(read_json_export(dir.path().join("produtos.json").as_path()).unwrap().len(), 35);
}

#[tokio::test]
async fn test_harvest_persist_and_rerun_is_idempotent() {
    let mock_server = MockServer::start().await;
    mount_catalog(&mock_server).await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("produtos.db");
    let config = create_test_config(
        &mock_server.uri(),
        &db_path.to_string_lossy(),
        &[("A", "a"), ("B", "b")],
    );
    let config = Arc::new(config);

    let products = harvest(Arc::clone(&config), HttpRenderer::new(config.session.clone()))
        .await
        .unwrap();

    let mut storage = SqliteStorage::new(&db_path).unwrap();
    let first = storage.upsert_products(&products).unwrap();
    assert_eq!((first.inserted, first.updated, first.errors), (35, 0, 0));

    let again = harvest(Arc::clone(&config), HttpRenderer::new(config.session.clone()))
        .await
        .unwrap();
    let second = storage.upsert_products(&again).unwrap();
    assert_eq!((second.inserted, second.updated, second.errors), (0, 35, 0));

    assert_eq!(storage.count_products().unwrap(), 35);
    assert_eq!(storage.count_priced().unwrap(), 35);
    assert_eq!(
        storage.count_by_category().unwrap(),
        vec![("A".to_string(), 25), ("B".to_string(), 10)]
    );

    let mut summary = RunSummaryBuilder::start();
    summary.products(again).db_stats(second);
    let summary = summary.finish();
    assert_eq!(summary.total, 35);
    assert_eq!(summary.categories_count["A"], 25);
}

#[tokio::test]
async fn test_export_then_import() {
    let mock_server = MockServer::start().await;
    mount_catalog(&mock_server).await;

    let dir = tempfile::tempdir().unwrap();
    let export_path = dir.path().join("produtos.json");
    let db_path = dir.path().join("produtos.db");
    let config = create_test_config(&mock_server.uri(), &db_path.to_string_lossy(), &[("B", "b")]);
    let config = Arc::new(config);

    let products = harvest(Arc::clone(&config), HttpRenderer::new(config.session.clone()))
        .await
        .unwrap();
    write_json_export(&export_path, &products).unwrap();

    let imported = read_json_export(&export_path).unwrap();
    assert_eq!(imported, products);

    let mut storage = SqliteStorage::new(&db_path).unwrap();
    let stats = storage.upsert_products(&imported).unwrap();
    assert_eq!(stats.inserted, 10);

    let stored = storage
        .get_product_by_link(&products[3].link)
        .unwrap()
        .expect("imported product should be stored");
    assert_eq!(stored.name, "b1 3");
    assert_eq!(stored.category.as_deref(), Some("B"));
}
