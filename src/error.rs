//! # Error Types
//!
//! This module defines the error type used throughout the labeler.
//!
//! | Variant | Raised by | Retried |
//! |---------|-----------|---------|
//! | `InvalidInput` | UPC encoder, weight parsing | never leaves the sampling loop |
//! | `ProductNotFound` / `MissingSelection` | content builder | no |
//! | `MissingTemplate` / `Template` | template loader, renderers | no |
//! | `DeviceUnavailable` / `WriteFailed` / `Timeout` | transport | no |
//! | `RenderingUnsupported` | barcode and image drawing | degraded to text |

use thiserror::Error;

/// Main error type for labeler operations
#[derive(Debug, Error)]
pub enum LabelerError {
    /// Malformed input at a direct API boundary (UPC seed, weight text)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The selected product code has no catalog record
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// No product is designated for the print cycle
    #[error("No product selected")]
    MissingSelection,

    /// No template is selected, or the named one does not exist
    #[error("Template not available: {0}")]
    MissingTemplate(String),

    /// Template exists but cannot be used (bad JSON, wrong kind for renderer)
    #[error("Template error: {0}")]
    Template(String),

    /// The device channel could not be opened
    #[error("Device unavailable: {0}")]
    DeviceUnavailable(String),

    /// Partial or failed write to an open channel
    #[error("Write failed: {0}")]
    WriteFailed(String),

    /// A bounded operation did not finish in time
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Barcode or image capability absent for a field
    #[error("Rendering unsupported: {0}")]
    RenderingUnsupported(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for labeler operations
pub type Result<T> = std::result::Result<T, LabelerError>;
