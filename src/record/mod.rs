//! Product record definitions
//!
//! A [`ProductRecord`] is the unit of extraction, export and persistence. Its
//! `link` is the product's identity across runs.

mod price;

pub use price::{parse_price, Price, PriceInfo, CONSULT_PRICE};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Availability of a product as shown in the listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductStatus {
    /// Listed in the catalog
    #[default]
    Available,
}

impl ProductStatus {
    /// Converts the status to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Available => "available",
        }
    }

    /// Parses a status from its database string representation
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "available" => Some(Self::Available),
            _ => None,
        }
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

/// A product as read from a listing item, before enrichment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawProduct {
    pub external_id: String,
    pub sku: String,
    pub name: String,
    pub link: String,
    /// Price text as displayed; empty when the item shows none
    pub price_text: String,
    pub image_url: String,
}

/// A normalized product record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    /// Site-assigned identifier (may be empty)
    #[serde(default)]
    pub external_id: String,

    #[serde(default)]
    pub sku: String,

    pub name: String,

    /// Absolute detail-page URL; identity of the product
    pub link: String,

    pub price_display_text: String,

    /// `None` means "consult price"
    pub price_numeric_value: Option<Price>,

    #[serde(default)]
    pub image_url: String,

    pub category: String,

    #[serde(default)]
    pub status: ProductStatus,

    /// Listing page URL the record was observed on
    #[serde(default)]
    pub source_url: String,

    /// RFC 3339 timestamp of the extraction
    pub scraped_at: String,
}

impl ProductRecord {
    /// Builds a record from a raw listing item
    ///
    /// Attaches the category and extraction timestamp and runs the price
    /// parser. `source_url` is left empty for the caller to tag.
    pub fn from_raw(raw: RawProduct, category: &str, scraped_at: &str) -> Self {
        let price = parse_price(&raw.price_text);
        Self {
            external_id: raw.external_id,
            sku: raw.sku,
            name: raw.name,
            link: raw.link,
            price_display_text: price.text,
            price_numeric_value: price.value,
            image_url: raw.image_url,
            category: category.to_string(),
            status: ProductStatus::Available,
            source_url: String::new(),
            scraped_at: scraped_at.to_string(),
        }
    }
}
