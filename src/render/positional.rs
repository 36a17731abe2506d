//! # Positional Command Renderer
//!
//! Turns a vector template into EPL commands at the printer's resolution.
//!
//! ```text
//! inches ── round_half_even(v * dpi) ──► dots
//!
//! barcode field  ──► B{x},{y},0,E30,2,2,{h},N,"{upc}"
//! any other field ──► A{x},{y},0,3,1,1,N,"{text}"
//! ```
//!
//! Field coordinates are passed through unchanged; templates meant for
//! both PDF and EPL output should be authored with that in mind.

use tracing::debug;

use super::fields::{Target, field_text};
use super::vector::DEFAULT_BAR_HEIGHT_IN;
use super::Renderer;
use crate::content::LabelContent;
use crate::error::Result;
use crate::printer::PrinterProfile;
use crate::protocol::charset::encode_ascii;
use crate::protocol::epl::{self, EplJob};
use crate::template::{FieldKind, Template};

/// Renders vector templates as EPL command text.
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionalRenderer {
    profile: PrinterProfile,
}

impl PositionalRenderer {
    pub fn new(profile: PrinterProfile) -> Self {
        Self { profile }
    }

    /// The command text before byte encoding.
    pub fn commands(&self, template: &Template, content: &LabelContent) -> String {
        let p = &self.profile;
        let mut job = EplJob::new(
            p.size_to_dots(template.width_in()),
            p.size_to_dots(template.height_in()),
            p.gap_dots,
        );

        for field in &template.fields {
            let x = p.inches_to_dots(field.x);
            let y = p.inches_to_dots(field.y);
            let line = match field.kind() {
                FieldKind::Barcode => {
                    let h = p.size_to_dots(field.height.unwrap_or(DEFAULT_BAR_HEIGHT_IN));
                    epl::barcode(x, y, h, content.upc.as_str())
                }
                _ => epl::text(x, y, &field_text(&field.name, content, Target::Positional)),
            };
            job.push(line);
        }

        job.finish(1)
    }
}

impl Renderer for PositionalRenderer {
    type Layout = Template;

    fn render(&self, template: &Template, content: &LabelContent) -> Result<Vec<u8>> {
        let text = self.commands(template, content);
        debug!(template = %template.name, dpi = self.profile.dpi, bytes = text.len(), "Rendered EPL");
        Ok(encode_ascii(&text))
    }
}
