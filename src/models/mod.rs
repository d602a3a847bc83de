//! Data models for discounted listings and their persisted snapshots

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A discounted best-seller listing, keyed by its detail-page URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub category_name: String,
    pub product_name: String,
    pub product_price: Option<f64>,
    pub sale_discount: Option<f64>,
    pub best_seller_rating: Option<String>,
    pub ship_from: Option<String>,
    pub sold_by: Option<String>,
    pub rating: Option<String>,
    pub product_description: Option<String>,
    pub number_bought_past_month: Option<String>,
    pub images: Vec<String>,
    pub url: String,
}

/// Envelope written to every snapshot file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeSnapshot {
    pub scrape_date: DateTime<Utc>,
    pub total_products: usize,
    pub products: Vec<ProductRecord>,
}

impl ScrapeSnapshot {
    pub fn new(products: &[ProductRecord]) -> Self {
        Self {
            scrape_date: Utc::now(),
            total_products: products.len(),
            products: products.to_vec(),
        }
    }
}

/// A single product tile on a listing page, kept as its outer HTML so it can
/// outlive the parsed document
#[derive(Debug, Clone)]
pub struct ListingRow {
    pub html: String,
}

/// Result of walking one category
#[derive(Debug, Default)]
pub struct CategoryOutcome {
    pub records: Vec<ProductRecord>,
    pub category_name: Option<String>,
}

impl CategoryOutcome {
    /// The outcome reported once every attempt has failed
    pub fn skipped() -> Self {
        Self::default()
    }
}
