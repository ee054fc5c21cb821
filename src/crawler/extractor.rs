//! Listing item extraction
//!
//! This module reads product cards out of a listing page snapshot:
//! - display name and detail-page link (both required)
//! - sale price, falling back to the installment price
//! - main image, falling back to its lazy-load attribute
//! - site identifier (data attribute or `prod-id-N` class) and SKU
//!
//! Each card is handled on its own. A card missing its name or link is
//! skipped; a card that cannot be read is recorded as an [`ItemError`] and the
//! remaining cards are still extracted.

use crate::record::{ProductRecord, RawProduct};
use crate::render::RenderedPage;
use chrono::Utc;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;
use url::Url;

/// Compiled selectors for one listing card
struct ListingSelectors {
    item: Selector,
    name: Selector,
    overlay_link: Selector,
    any_link: Selector,
    sale_price: Selector,
    installment_price: Selector,
    image: Selector,
    sku: Selector,
}

fn selectors() -> &'static ListingSelectors {
    static SELECTORS: OnceLock<ListingSelectors> = OnceLock::new();
    SELECTORS.get_or_init(|| {
        let parse = |css: &str| Selector::parse(css).expect("static listing selector");
        ListingSelectors {
            item: parse("li .listagem-item"),
            name: parse(".nome-produto"),
            overlay_link: parse(".produto-sobrepor"),
            any_link: parse("a[href]"),
            sale_price: parse(".preco-venda"),
            installment_price: parse(".preco-parcela strong.cor-principal"),
            image: parse(".imagem-principal"),
            sku: parse(".produto-sku"),
        }
    })
}

fn product_id_class() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"prod-id-(\d+)").expect("valid product id pattern"))
}

/// A listing card that could not be read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemError {
    /// Position of the card on the page
    pub index: usize,
    pub message: String,
}

/// Records read from one page, plus the cards that failed
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub records: Vec<ProductRecord>,
    pub errors: Vec<ItemError>,
}

/// Extracts enriched product records from a listing page
///
/// Every record gets `category`, the parsed price, the extraction timestamp
/// and the default status. `source_url` is left for the caller to tag.
pub fn extract_products(page: &RenderedPage, category: &str) -> Extraction {
    let (raw, errors) = extract_raw_products(&page.html, &page.url);
    let scraped_at = Utc::now().to_rfc3339();

    let records = raw
        .into_iter()
        .map(|item| ProductRecord::from_raw(item, category, &scraped_at))
        .collect();

    Extraction { records, errors }
}

/// Reads the raw listing cards out of an HTML document
///
/// # Arguments
///
/// * `html` - The listing page markup
/// * `base_url` - Location of the page, for resolving relative links
pub fn extract_raw_products(html: &str, base_url: &Url) -> (Vec<RawProduct>, Vec<ItemError>) {
    let document = Html::parse_document(html);
    let selectors = selectors();

    let mut products = Vec::new();
    let mut errors = Vec::new();

    for (index, element) in document.select(&selectors.item).enumerate() {
        match parse_item(element, base_url) {
            Ok(Some(product)) => products.push(product),
            Ok(None) => {
                tracing::debug!("Skipping listing item {}: missing name or link", index);
            }
            Err(message) => {
                tracing::warn!("Failed to read listing item {}: {}", index, message);
                errors.push(ItemError { index, message });
            }
        }
    }

    (products, errors)
}

/// Reads one listing card
///
/// Returns `Ok(None)` when the card lacks a name or a link.
fn parse_item(element: ElementRef<'_>, base_url: &Url) -> Result<Option<RawProduct>, String> {
    let selectors = selectors();

    let name = first_text(element, &selectors.name).unwrap_or_default();

    let href = match element.select(&selectors.overlay_link).next() {
        Some(overlay) => overlay.value().attr("href"),
        None => element
            .select(&selectors.any_link)
            .next()
            .and_then(|a| a.value().attr("href")),
    }
    .map(str::trim)
    .unwrap_or_default();

    if name.is_empty() || href.is_empty() {
        return Ok(None);
    }

    let link = base_url
        .join(href)
        .map_err(|e| format!("unresolvable link '{}': {}", href, e))?;

    let price_text = match element.select(&selectors.sale_price).next() {
        Some(sale) => format!("R$ {}", collapse_text(sale)),
        None => first_text(element, &selectors.installment_price).unwrap_or_default(),
    };

    let image_url = element
        .select(&selectors.image)
        .next()
        .and_then(|img| {
            let value = img.value();
            value
                .attr("src")
                .filter(|src| !src.trim().is_empty())
                .or_else(|| value.attr("data-src"))
        })
        .map(|src| resolve_or_keep(src.trim(), base_url))
        .unwrap_or_default();

    let external_id = element
        .value()
        .attr("data-id")
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .or_else(|| {
            element.value().attr("class").and_then(|class| {
                product_id_class()
                    .captures(class)
                    .map(|caps| caps[1].to_string())
            })
        })
        .unwrap_or_default();

    let sku = first_text(element, &selectors.sku).unwrap_or_default();

    Ok(Some(RawProduct {
        external_id,
        sku,
        name,
        link: link.to_string(),
        price_text,
        image_url,
    }))
}

/// Whitespace-collapsed text of the first match, if non-empty
fn first_text(element: ElementRef<'_>, selector: &Selector) -> Option<String> {
    element
        .select(selector)
        .next()
        .map(collapse_text)
        .filter(|text| !text.is_empty())
}

fn collapse_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn resolve_or_keep(src: &str, base_url: &Url) -> String {
    base_url
        .join(src)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| src.to_string())
}
