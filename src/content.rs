//! # Label Content
//!
//! Turns a product record, a gross weight and the operator's free-text fields
//! into the immutable [`LabelContent`] every renderer consumes.
//!
//! ## Pricing
//!
//! ```text
//! net   = max(0, gross - tare)
//! total = round(net * price_per_unit + 1e-9, 2)
//! cents = round(total * 100)
//! ```
//!
//! The `1e-9` bias pushes products that land exactly on a half cent (in
//! binary) up to the next cent. Existing labels were priced this way, so the
//! bias is kept bit-for-bit.

use serde::Serialize;

use crate::catalog::{ProductCatalog, ProductRecord};
use crate::error::{LabelerError, Result};
use crate::upc::{self, Upc};

/// Bias added before rounding the total to cents.
pub const PRICE_ROUNDING_BIAS: f64 = 1e-9;

/// Operator-entered text printed as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FreeText {
    pub sell_by: String,
    pub lot: String,
}

impl FreeText {
    pub fn new(sell_by: impl Into<String>, lot: impl Into<String>) -> Self {
        Self {
            sell_by: sell_by.into(),
            lot: lot.into(),
        }
    }

    /// Sell-by defaulting to today's date (`YYYY-MM-DD`), empty lot.
    pub fn today() -> Self {
        Self::new(chrono::Local::now().format("%Y-%m-%d").to_string(), "")
    }
}

/// Everything printed on one label. Built per print action, then dropped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelContent {
    pub product_name: String,
    /// Net weight in pounds
    pub weight: f64,
    pub price_per_lb: f64,
    pub total_price: f64,
    pub sell_by: String,
    pub lot: String,
    pub upc: Upc,
}

impl LabelContent {
    /// Price a product at the given gross weight.
    ///
    /// ## Errors
    ///
    /// `InvalidInput` for a non-finite or negative weight, or a non-numeric
    /// barcode seed.
    pub fn build(product: &ProductRecord, gross: f64, text: &FreeText) -> Result<Self> {
        if !gross.is_finite() || gross < 0.0 {
            return Err(LabelerError::InvalidInput(format!(
                "gross weight must be a non-negative number, got {}",
                gross
            )));
        }

        let net = (gross - product.tare).max(0.0);
        let total = round_total(net, product.price_per_unit);
        let cents = (total * 100.0).round() as u64;
        let upc = upc::make_price_embedded_upc(product.upc_seed(), cents)?;

        Ok(Self {
            product_name: product.name.clone(),
            weight: net,
            price_per_lb: product.price_per_unit,
            total_price: total,
            sell_by: text.sell_by.clone(),
            lot: text.lot.clone(),
            upc,
        })
    }

    /// Raw value of a content key, for template fields with no fixed format.
    ///
    /// Unknown keys yield an empty string.
    pub fn raw_value(&self, key: &str) -> String {
        match key {
            "product_name" => self.product_name.clone(),
            "weight" => self.weight.to_string(),
            "price_per_lb" => self.price_per_lb.to_string(),
            "total_price" => self.total_price.to_string(),
            "sell_by" => self.sell_by.clone(),
            "lot" => self.lot.clone(),
            "upc" => self.upc.to_string(),
            _ => String::new(),
        }
    }
}

/// Look up the selected product and build its label content.
///
/// ## Errors
///
/// - `MissingSelection` when `selection` is `None` or blank
/// - `ProductNotFound` when the catalog has no such code
pub fn build_content(
    catalog: &dyn ProductCatalog,
    selection: Option<&str>,
    gross: f64,
    text: &FreeText,
) -> Result<LabelContent> {
    let code = selection
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .ok_or(LabelerError::MissingSelection)?;

    let product = catalog
        .find(code)
        .ok_or_else(|| LabelerError::ProductNotFound(code.to_string()))?;

    LabelContent::build(&product, gross, text)
}

/// `round(net * price + 1e-9, 2)`.
pub fn round_total(net: f64, price_per_unit: f64) -> f64 {
    round_cents(net * price_per_unit + PRICE_ROUNDING_BIAS)
}

/// Round to two decimals on the exact binary value (ties to even), the same
/// result as a correctly rounded decimal conversion.
fn round_cents(value: f64) -> f64 {
    format!("{:.2}", value).parse().unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::InMemoryCatalog;

    fn chicken() -> ProductRecord {
        ProductRecord::new("12345", "Chicken Breast", 2.99)
            .with_tare(0.05)
            .with_barcode_seed("12345")
    }

    #[test]
    fn test_reference_label() {
        let content = LabelContent::build(&chicken(), 5.0, &FreeText::new("2026-10-20", "L7")).unwrap();
        assert!((content.weight - 4.95).abs() < 1e-12);
        assert_eq!(content.total_price, 14.80);
        assert_eq!(format!("{:.2}", content.total_price), "14.80");
        assert_eq!(content.upc.as_str(), "212345014806");
        assert_eq!(content.sell_by, "2026-10-20");
        assert_eq!(content.lot, "L7");
    }

    #[test]
    fn test_exact_half_cent_rounds_up() {
        // 0.125 and 0.375 are exact in binary
        assert_eq!(round_total(1.0, 0.125), 0.13);
        assert_eq!(round_total(1.0, 0.375), 0.38);
        assert_eq!(round_total(2.5, 0.05), 0.13);
    }

    #[test]
    fn test_binary_below_half_cent_rounds_up() {
        // 1.005 is stored as 1.00499999999999989...; the bias carries it over
        assert_eq!(round_total(1.0, 1.005), 1.01);
        assert_eq!(round_cents(1.005), 1.0);
    }

    #[test]
    fn test_tare_never_goes_negative() {
        let content = LabelContent::build(&chicken(), 0.02, &FreeText::default()).unwrap();
        assert_eq!(content.weight, 0.0);
        assert_eq!(content.total_price, 0.0);
        assert_eq!(content.upc.cents(), "00000");
    }

    #[test]
    fn test_rejects_bad_weight() {
        assert!(LabelContent::build(&chicken(), f64::NAN, &FreeText::default()).is_err());
        assert!(LabelContent::build(&chicken(), -1.0, &FreeText::default()).is_err());
    }

    #[test]
    fn test_build_content_missing_selection() {
        let catalog = InMemoryCatalog::with_sample();
        let err = build_content(&catalog, None, 5.0, &FreeText::default()).unwrap_err();
        assert!(matches!(err, LabelerError::MissingSelection));

        let err = build_content(&catalog, Some("  "), 5.0, &FreeText::default()).unwrap_err();
        assert!(matches!(err, LabelerError::MissingSelection));
    }

    #[test]
    fn test_build_content_product_not_found() {
        let catalog = InMemoryCatalog::with_sample();
        let err = build_content(&catalog, Some("404"), 5.0, &FreeText::default()).unwrap_err();
        assert!(matches!(err, LabelerError::ProductNotFound(code) if code == "404"));
    }

    #[test]
    fn test_seed_falls_back_to_code() {
        let product = ProductRecord::new("777", "Wings", 1.0);
        let content = LabelContent::build(&product, 2.0, &FreeText::default()).unwrap();
        assert_eq!(content.upc.seed(), "00777");
        assert_eq!(content.upc.cents(), "00200");
    }

    #[test]
    fn test_raw_value() {
        let content = LabelContent::build(&chicken(), 5.0, &FreeText::new("d", "l")).unwrap();
        assert_eq!(content.raw_value("upc"), "212345014806");
        assert_eq!(content.raw_value("lot"), "l");
        assert_eq!(content.raw_value("nope"), "");
    }
}
