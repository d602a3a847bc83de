//! JSON snapshot persistence.
//!
//! Every save rewrites `<output_dir>/<scope>.json` with the full record set
//! for that scope. The document is written to a sibling temporary file and
//! renamed into place, so readers never observe a half-written snapshot.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tracing::{error, info};

use crate::models::{ProductRecord, ScrapeSnapshot};

/// Scope name of the cumulative snapshot
pub const ALL_PRODUCTS: &str = "all_products";

/// File-name scope for a category display name
pub fn category_slug(category_name: &str) -> String {
    category_name
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .replace(['/', '\\'], "_")
}

pub struct JsonSink {
    output_dir: PathBuf,
}

impl JsonSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn path_for(&self, scope: &str) -> PathBuf {
        self.output_dir.join(format!("{scope}.json"))
    }

    /// Overwrite the snapshot for `scope`. Failures are logged, never raised.
    pub fn save(&self, records: &[ProductRecord], scope: &str) -> bool {
        match self.write_snapshot(records, scope) {
            Ok(path) => {
                info!("Saved {} products to {}", records.len(), path.display());
                true
            }
            Err(e) => {
                error!("Error saving {} snapshot: {:#}", scope, e);
                false
            }
        }
    }

    fn write_snapshot(&self, records: &[ProductRecord], scope: &str) -> Result<PathBuf> {
        if !self.output_dir.exists() {
            fs::create_dir_all(&self.output_dir).with_context(|| {
                format!("Failed to create output directory {}", self.output_dir.display())
            })?;
            info!("Created directory: {}", self.output_dir.display());
        }

        let snapshot = ScrapeSnapshot::new(records);
        let body = to_pretty_json(&snapshot)?;

        let path = self.path_for(scope);
        let tmp = path.with_extension("json.tmp");

        let mut file = fs::File::create(&tmp)
            .with_context(|| format!("Failed to create {}", tmp.display()))?;
        file.write_all(&body)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to move snapshot into {}", path.display()))?;

        Ok(path)
    }
}

fn to_pretty_json<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut ser)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> ProductRecord {
        ProductRecord {
            category_name: "Kitchen & Home".to_string(),
            product_name: name.to_string(),
            product_price: Some(399.0),
            sale_discount: Some(60.0),
            best_seller_rating: Some("12".to_string()),
            ship_from: None,
            sold_by: None,
            rating: Some("4.2 out of 5 stars".to_string()),
            product_description: None,
            number_bought_past_month: None,
            images: vec!["https://m.media-amazon.com/images/I/x.jpg".to_string()],
            url: format!("https://www.amazon.in/dp/{name}"),
        }
    }

    fn read(path: &Path) -> ScrapeSnapshot {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn slug_lowercases_and_joins_words() {
        assert_eq!(category_slug("Home & Kitchen"), "home_&_kitchen");
        assert_eq!(category_slug("  Computers  &   Accessories "), "computers_&_accessories");
        assert_eq!(category_slug("Bags/Luggage"), "bags_luggage");
    }

    #[test]
    fn save_creates_directory_and_envelope() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonSink::new(dir.path().join("nested").join("output"));

        assert!(sink.save(&[record("a"), record("b")], "kitchen"));

        let snapshot = read(&sink.path_for("kitchen"));
        assert_eq!(snapshot.total_products, 2);
        assert_eq!(snapshot.products[1].product_name, "b");
        assert!(!sink.output_dir().join("kitchen.json.tmp").exists());
    }

    #[test]
    fn save_overwrites_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonSink::new(dir.path());

        assert!(sink.save(&[record("a"), record("b"), record("c")], ALL_PRODUCTS));
        assert!(sink.save(&[record("z")], ALL_PRODUCTS));

        let snapshot = read(&sink.path_for(ALL_PRODUCTS));
        assert_eq!(snapshot.total_products, 1);
        assert_eq!(snapshot.products, vec![record("z")]);
    }

    #[test]
    fn snapshot_uses_documented_shape() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonSink::new(dir.path());
        let mut r = record("a");
        r.product_name = "Kadhai ₹ offer".to_string();
        sink.save(&[r], "books");

        let raw = fs::read_to_string(sink.path_for("books")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();

        assert!(value["scrape_date"].is_string());
        assert_eq!(value["total_products"], 1);
        assert_eq!(value["products"][0]["sold_by"], serde_json::Value::Null);
        assert!(raw.contains("Kadhai ₹ offer"));
        assert!(raw.contains("\n    \"total_products\""));
    }

    #[test]
    fn failed_write_reports_false() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not_a_dir");
        fs::write(&blocker, "file in the way").unwrap();

        let sink = JsonSink::new(&blocker);
        assert!(!sink.save(&[record("a")], "kitchen"));
    }
}
