//! # Printer Module
//!
//! Label printer profiles used by the positional command renderer.
//!
//! ## Modules
//!
//! - [`config`]: Resolution, gap and serial defaults

pub mod config;

pub use config::{DEFAULT_PRINTER_BAUD, PrinterProfile};
