//! # Rendering Module
//!
//! Turns one `(template, content)` pair into printable bytes.
//!
//! ## Modules
//!
//! - [`vector`]: PDF label pages
//! - [`placeholder`]: `{key}` substitution into raw `.prn` text
//! - [`positional`]: EPL commands derived from a vector template
//! - [`fields`]: Field text shared by all three
//! - [`barcode`]: UPC-A bar modules
//!
//! ## Emission
//!
//! | Template | `emit` | Document (PDF) | Printer payload |
//! |----------|--------|----------------|-----------------|
//! | vector | `vector` | yes | none |
//! | vector | `dual` | yes | EPL |
//! | placeholder | n/a | none | substituted PRN |
//!
//! ## Usage Example
//!
//! ```
//! use scale_labeler::catalog::ProductRecord;
//! use scale_labeler::content::{FreeText, LabelContent};
//! use scale_labeler::printer::PrinterProfile;
//! use scale_labeler::render;
//! use scale_labeler::template::{LayoutTemplate, Template};
//!
//! let product = ProductRecord::new("12345", "Chicken Breast", 2.99).with_tare(0.05);
//! let content = LabelContent::build(&product, 5.0, &FreeText::new("2026-10-25", "")).unwrap();
//! let template = LayoutTemplate::Vector(Template::default_2x2());
//!
//! let emission = render::emit(&template, &content, &PrinterProfile::default()).unwrap();
//! assert!(emission.document.is_some());
//! assert!(emission.commands.is_some());
//! ```

pub mod barcode;
pub mod fields;
pub mod placeholder;
pub mod positional;
pub mod vector;

use crate::content::LabelContent;
use crate::error::Result;
use crate::printer::PrinterProfile;
use crate::template::{EmitMode, LayoutTemplate};

pub use placeholder::PlaceholderRenderer;
pub use positional::PositionalRenderer;
pub use vector::VectorRenderer;

/// Turns a layout plus content into a byte payload.
pub trait Renderer {
    /// The template kind this renderer accepts.
    type Layout;

    fn render(&self, layout: &Self::Layout, content: &LabelContent) -> Result<Vec<u8>>;
}

/// Everything one print action produces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Emission {
    /// PDF artifact to write to disk
    pub document: Option<Vec<u8>>,
    /// Bytes for the printer
    pub commands: Option<Vec<u8>>,
}

/// # Render per Template Mode
///
/// Runs the renderers the template's kind and emission mode call for.
pub fn emit(template: &LayoutTemplate, content: &LabelContent, profile: &PrinterProfile) -> Result<Emission> {
    match template {
        LayoutTemplate::Vector(t) => {
            let document = VectorRenderer::new().render(t, content)?;
            let commands = match t.emit {
                EmitMode::Vector => None,
                EmitMode::Dual => Some(PositionalRenderer::new(*profile).render(t, content)?),
            };
            Ok(Emission {
                document: Some(document),
                commands,
            })
        }
        LayoutTemplate::Placeholder(t) => Ok(Emission {
            document: None,
            commands: Some(PlaceholderRenderer::new().render(t, content)?),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ProductRecord;
    use crate::content::FreeText;
    use crate::template::{PlaceholderTemplate, Template};

    fn content() -> LabelContent {
        let product = ProductRecord::new("12345", "Chicken Breast", 2.99).with_tare(0.05);
        LabelContent::build(&product, 5.0, &FreeText::new("2026-10-25", "")).unwrap()
    }

    #[test]
    fn test_vector_only_has_no_commands() {
        let t = LayoutTemplate::Vector(Template::default_2x2().with_emit(EmitMode::Vector));
        let e = emit(&t, &content(), &PrinterProfile::default()).unwrap();
        assert!(e.document.unwrap().starts_with(b"%PDF-1.4"));
        assert_eq!(e.commands, None);
    }

    #[test]
    fn test_dual_has_both() {
        let t = LayoutTemplate::Vector(Template::default_2x2());
        let e = emit(&t, &content(), &PrinterProfile::default()).unwrap();
        assert!(e.document.is_some());
        assert!(e.commands.unwrap().starts_with(b"N\nq406\n"));
    }

    #[test]
    fn test_placeholder_has_no_document() {
        let t = LayoutTemplate::Placeholder(PlaceholderTemplate {
            name: "p".into(),
            text: "{total_price}".into(),
        });
        let e = emit(&t, &content(), &PrinterProfile::default()).unwrap();
        assert_eq!(e.document, None);
        assert_eq!(e.commands.as_deref(), Some(&b"14.80"[..]));
    }
}
