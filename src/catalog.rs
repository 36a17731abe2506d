//! # Product Catalog
//!
//! Product records come from a persistence collaborator. This module only
//! defines the record shape and the lookup seam ([`ProductCatalog`]); the
//! bundled [`InMemoryCatalog`] is enough for the CLI and for tests.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{LabelerError, Result};

/// One sellable product.
///
/// Field aliases accept the column names of existing product exports
/// (`product_code`, `price_per_lb`, `plu_upc`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    #[serde(alias = "product_code")]
    pub code: String,
    pub name: String,
    /// Price per weight unit (pound)
    #[serde(alias = "price_per_lb")]
    pub price_per_unit: f64,
    /// Fixed container weight deducted from the gross reading
    #[serde(default)]
    pub tare: f64,
    /// Digits embedded in the UPC; falls back to `code`
    #[serde(default, alias = "plu_upc")]
    pub barcode_seed: Option<String>,
}

impl ProductRecord {
    pub fn new(code: impl Into<String>, name: impl Into<String>, price_per_unit: f64) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            price_per_unit,
            tare: 0.0,
            barcode_seed: None,
        }
    }

    pub fn with_tare(mut self, tare: f64) -> Self {
        self.tare = tare;
        self
    }

    pub fn with_barcode_seed(mut self, seed: impl Into<String>) -> Self {
        self.barcode_seed = Some(seed.into());
        self
    }

    /// Seed used for the UPC: the barcode seed when set and non-empty,
    /// otherwise the product code.
    pub fn upc_seed(&self) -> &str {
        match self.barcode_seed.as_deref().map(str::trim) {
            Some(seed) if !seed.is_empty() => seed,
            _ => self.code.trim(),
        }
    }

    /// Selection-list line, e.g. `12345 - Chicken Breast ($2.99/lb, tare 0.050, PLU 12345)`.
    pub fn display_line(&self) -> String {
        format!(
            "{} - {} (${:.2}/lb, tare {:.3}, PLU {})",
            self.code,
            self.name,
            self.price_per_unit,
            self.tare,
            self.barcode_seed.as_deref().unwrap_or("")
        )
    }

    fn validate(&self) -> Result<()> {
        if self.code.trim().is_empty() || self.name.trim().is_empty() {
            return Err(LabelerError::InvalidInput(
                "product code and name are required".to_string(),
            ));
        }
        let non_negative = |v: f64| v.is_finite() && v >= 0.0;
        if !non_negative(self.price_per_unit) || !non_negative(self.tare) {
            return Err(LabelerError::InvalidInput(format!(
                "product {}: price and tare must be non-negative",
                self.code
            )));
        }
        Ok(())
    }
}

/// Extract the product code from a selection-list line (the part before `" - "`).
pub fn parse_selection(line: &str) -> Option<&str> {
    let code = line.split(" - ").next()?.trim();
    if code.is_empty() { None } else { Some(code) }
}

/// Lookup seam implemented by whatever stores products.
pub trait ProductCatalog: Send + Sync {
    /// Find a product by its unique code.
    fn find(&self, code: &str) -> Option<ProductRecord>;

    /// All products, ordered by code.
    fn list(&self) -> Vec<ProductRecord>;
}

/// Catalog held in memory, keyed by product code.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    products: BTreeMap<String, ProductRecord>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog containing the single sample product used on a fresh install.
    pub fn with_sample() -> Self {
        let mut catalog = Self::new();
        catalog.products.insert(
            "12345".to_string(),
            ProductRecord::new("12345", "Chicken Breast", 2.99)
                .with_tare(0.05)
                .with_barcode_seed("12345"),
        );
        catalog
    }

    /// Load a JSON array of product records.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let records: Vec<ProductRecord> = serde_json::from_str(&text).map_err(|e| {
            LabelerError::InvalidInput(format!("{}: {}", path.display(), e))
        })?;
        debug!(path = %path.display(), count = records.len(), "Loaded products");
        Self::from_records(records)
    }

    pub fn from_records(records: impl IntoIterator<Item = ProductRecord>) -> Result<Self> {
        let mut catalog = Self::new();
        for record in records {
            catalog.insert(record)?;
        }
        Ok(catalog)
    }

    /// Insert or replace a product.
    pub fn insert(&mut self, record: ProductRecord) -> Result<()> {
        record.validate()?;
        self.products.insert(record.code.trim().to_string(), record);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

impl ProductCatalog for InMemoryCatalog {
    fn find(&self, code: &str) -> Option<ProductRecord> {
        self.products.get(code.trim()).cloned()
    }

    fn list(&self) -> Vec<ProductRecord> {
        self.products.values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_catalog() {
        let catalog = InMemoryCatalog::with_sample();
        let product = catalog.find("12345").unwrap();
        assert_eq!(product.name, "Chicken Breast");
        assert_eq!(product.tare, 0.05);
        assert!(catalog.find("99999").is_none());
    }

    #[test]
    fn test_upc_seed_falls_back_to_code() {
        let p = ProductRecord::new("00042", "Turkey", 3.49);
        assert_eq!(p.upc_seed(), "00042");

        let p = p.with_barcode_seed("  ");
        assert_eq!(p.upc_seed(), "00042");

        let p = p.with_barcode_seed("777");
        assert_eq!(p.upc_seed(), "777");
    }

    #[test]
    fn test_display_line_and_parse_selection() {
        let p = ProductRecord::new("12345", "Chicken Breast", 2.99)
            .with_tare(0.05)
            .with_barcode_seed("12345");
        let line = p.display_line();
        assert_eq!(
            line,
            "12345 - Chicken Breast ($2.99/lb, tare 0.050, PLU 12345)"
        );
        assert_eq!(parse_selection(&line), Some("12345"));
        assert_eq!(parse_selection(""), None);
    }

    #[test]
    fn test_json_aliases() {
        let json = r#"[
            {"product_code": "1", "name": "Ham", "price_per_lb": 4.5, "plu_upc": "222"},
            {"code": "2", "name": "Wings", "price_per_unit": 1.25, "tare": 0.1, "extra": true}
        ]"#;
        let records: Vec<ProductRecord> = serde_json::from_str(json).unwrap();
        let catalog = InMemoryCatalog::from_records(records).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.find("1").unwrap().upc_seed(), "222");
        assert_eq!(catalog.find("2").unwrap().tare, 0.1);
    }

    #[test]
    fn test_insert_rejects_negative_price() {
        let mut catalog = InMemoryCatalog::new();
        let bad = ProductRecord::new("1", "Bad", -1.0);
        assert!(catalog.insert(bad).is_err());
        assert!(catalog.is_empty());
    }
}
