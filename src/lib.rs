//! # Scale Labeler - Weigh-and-Price Label Printing
//!
//! Reads gross weights from a bench scale, computes net weight and total
//! price for a selected product, and prints a price label with a
//! price-embedded UPC-A barcode. It provides:
//!
//! - **UPC**: check digits and price-embedded codes
//! - **Content**: net weight, rounded total and label fields
//! - **Templates**: JSON vector layouts and raw `.prn` placeholder files
//! - **Rendering**: PDF pages, EPL commands and placeholder substitution
//! - **Scale**: a background reader with a debounced trigger
//! - **Transport**: serial and network (port 9100) printers
//!
//! ## Quick Start
//!
//! ```
//! use scale_labeler::{
//!     catalog::ProductRecord,
//!     content::{FreeText, LabelContent},
//!     printer::PrinterProfile,
//!     render::{PositionalRenderer, Renderer},
//!     template::Template,
//! };
//!
//! let product = ProductRecord::new("12345", "Chicken Breast", 2.99).with_tare(0.05);
//! let content = LabelContent::build(&product, 5.0, &FreeText::new("2026-10-25", "L-7"))?;
//! assert_eq!(content.total_price, 14.80);
//! assert_eq!(content.upc.as_str(), "212345014806");
//!
//! let epl = PositionalRenderer::new(PrinterProfile::default())
//!     .render(&Template::default_2x2(), &content)?;
//! assert!(epl.ends_with(b"P1"));
//!
//! # Ok::<(), scale_labeler::LabelerError>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`upc`] | UPC-A check digit and price-embedded codes |
//! | [`catalog`] | Product records and lookup |
//! | [`content`] | Label content from product and weight |
//! | [`template`] | Template model and loader |
//! | [`render`] | Vector, positional and placeholder renderers |
//! | [`protocol`] | PDF, EPL and charset builders |
//! | [`scale`] | Weight parsing, debouncing and the sampling thread |
//! | [`transport`] | Printer endpoints |
//! | [`printer`] | Printer profiles (DPI, gap) |
//! | [`orchestrator`] | Print cycles and scale-triggered events |
//! | [`config`] | Station configuration |
//! | [`error`] | Error types |

pub mod catalog;
pub mod config;
pub mod content;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod printer;
pub mod protocol;
pub mod render;
pub mod scale;
pub mod template;
pub mod transport;
pub mod upc;

// Re-exports for convenience
pub use error::{LabelerError, Result};
pub use orchestrator::Orchestrator;
pub use printer::PrinterProfile;
