//! Price text normalization
//!
//! Listing prices arrive as free text in Brazilian notation (`R$ 1.510,40`),
//! sometimes with a repeated currency prefix or stray line breaks. This module
//! turns that text into a cleaned display string plus an exact numeric value.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Display text used when a product has no usable price
pub const CONSULT_PRICE: &str = "Consult price";

/// Labels the catalog shows instead of a price
const CONSULT_SENTINELS: [&str; 2] = ["consultar", "consult price"];

/// An exact, non-negative monetary amount with two fractional digits
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Price {
    cents: i64,
}

impl Price {
    pub fn from_cents(cents: i64) -> Option<Self> {
        (cents >= 0).then_some(Self { cents })
    }

    pub fn cents(&self) -> i64 {
        self.cents
    }

    pub fn as_f64(&self) -> f64 {
        self.cents as f64 / 100.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.cents / 100, self.cents % 100)
    }
}

impl From<Price> for f64 {
    fn from(price: Price) -> Self {
        price.as_f64()
    }
}

impl TryFrom<f64> for Price {
    type Error = String;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() || value < 0.0 {
            return Err(format!("invalid price value: {}", value));
        }
        let cents = (value * 100.0).round();
        if cents > i64::MAX as f64 {
            return Err(format!("price value out of range: {}", value));
        }
        Ok(Self {
            cents: cents as i64,
        })
    }
}

/// A normalized price: cleaned display text and the numeric value, if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceInfo {
    pub text: String,
    pub value: Option<Price>,
}

fn duplicate_currency() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"R\$(?:\s*R\$)+").expect("valid currency pattern"))
}

fn whitespace() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace pattern"))
}

fn amount() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d[\d.]*),(\d{2})").expect("valid amount pattern"))
}

/// Parses raw listing price text
///
/// Never fails: text without a recognizable amount yields `value: None`,
/// which downstream means "consult price".
///
/// # Example
///
/// ```
/// use parrilla_harvest::record::parse_price;
///
/// let info = parse_price("R$ R$ 1.510,40");
/// assert_eq!(info.text, "R$ 1.510,40");
/// assert_eq!(info.value.unwrap().cents(), 151040);
/// ```
pub fn parse_price(raw: &str) -> PriceInfo {
    let trimmed = raw.trim();
    if trimmed.is_empty()
        || CONSULT_SENTINELS
            .iter()
            .any(|s| trimmed.eq_ignore_ascii_case(s))
    {
        return PriceInfo {
            text: CONSULT_PRICE.to_string(),
            value: None,
        };
    }

    let collapsed = duplicate_currency().replace_all(trimmed, "R$");
    let text = whitespace().replace_all(&collapsed, " ").trim().to_string();

    let value = amount()
        .captures(&text)
        .and_then(|caps| to_cents(&caps[1], &caps[2]))
        .and_then(Price::from_cents);

    PriceInfo { text, value }
}

/// Converts `1.510` + `40` into 151040 cents
fn to_cents(integer_part: &str, fraction: &str) -> Option<i64> {
    let digits: String = integer_part.chars().filter(|c| *c != '.').collect();
    let units: i64 = digits.parse().ok()?;
    let fraction: i64 = fraction.parse().ok()?;
    units.checked_mul(100)?.checked_add(fraction)
}
