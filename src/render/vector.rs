//! # Vector Renderer
//!
//! Draws one label page as a PDF sized to the template.
//!
//! ## Field Dispatch
//!
//! | Field | Drawing | Degraded to |
//! |-------|---------|-------------|
//! | `barcode` | UPC-A bars plus digits | `UPC:<code>` at 6 pt |
//! | `logo` / `image` | image scaled into `width` x `height` | `[Image not found]`, `[Image error]`, `[No image support]` |
//! | data fields | text per the shared field table | |
//!
//! Coordinates are inches from the bottom-left corner, as in PDF user space.

use std::path::Path;

use tracing::{debug, warn};

use super::barcode::{bar_runs, is_guard, upca_modules};
use super::fields::{Target, field_text};
use super::Renderer;
use crate::content::LabelContent;
use crate::error::{LabelerError, Result};
use crate::protocol::charset::encode_win_ansi;
use crate::protocol::pdf::{ContentStream, ObjRef, POINTS_PER_INCH, PdfWriter, base14_font, num};
use crate::template::{Field, FieldKind, Template};

/// Barcode bar height when the field has none (inches).
pub const DEFAULT_BAR_HEIGHT_IN: f64 = 0.3;

/// Nominal UPC-A module width (inches).
pub const DEFAULT_MODULE_WIDTH_IN: f64 = 0.0135;

/// Image box when the field has none (inches).
pub const DEFAULT_IMAGE_SIZE_IN: f64 = 0.5;

pub const DEFAULT_IMAGE_PATH: &str = "logo.png";

/// Font size of barcode digits and the barcode fallback text.
const BARCODE_TEXT_SIZE: f64 = 6.0;

/// Guard bars extend below the data bars by this much (points).
const GUARD_EXTENSION_PT: f64 = 3.0;

/// Helvetica digit advance, in 1/1000 em.
const HELVETICA_DIGIT_WIDTH: f64 = 556.0;

/// Renders vector templates to PDF bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct VectorRenderer;

impl VectorRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for VectorRenderer {
    type Layout = Template;

    fn render(&self, template: &Template, content: &LabelContent) -> Result<Vec<u8>> {
        let mut page = Page::new(base14_font(&template.font));

        for field in &template.fields {
            match field.kind() {
                FieldKind::Barcode => page.barcode(field, content),
                FieldKind::Image => page.image(field, template),
                FieldKind::Data => {
                    let text = field_text(&field.name, content, Target::Vector);
                    page.text(field.x, field.y, field.size, &text);
                }
            }
        }

        let bytes = page.finish(template.width_in(), template.height_in());
        debug!(template = %template.name, bytes = bytes.len(), "Rendered PDF");
        Ok(bytes)
    }
}

// ============================================================================
// PAGE ASSEMBLY
// ============================================================================

/// An image XObject waiting to be written.
struct PendingImage {
    name: String,
    dict: String,
    data: Vec<u8>,
    smask: Option<(String, Vec<u8>)>,
}

struct Page {
    font: &'static str,
    /// Base-14 fonts in first-use order; resource `F{n}` is index n-1.
    fonts: Vec<&'static str>,
    images: Vec<PendingImage>,
    ops: ContentStream,
}

impl Page {
    fn new(font: &'static str) -> Self {
        Self {
            font,
            fonts: Vec::new(),
            images: Vec::new(),
            ops: ContentStream::new(),
        }
    }

    fn font_resource(&mut self, font: &'static str) -> String {
        let index = match self.fonts.iter().position(|&f| f == font) {
            Some(i) => i,
            None => {
                self.fonts.push(font);
                self.fonts.len() - 1
            }
        };
        format!("F{}", index + 1)
    }

    fn text(&mut self, x_in: f64, y_in: f64, size: f64, text: &str) {
        self.text_in(self.font, x_in * POINTS_PER_INCH, y_in * POINTS_PER_INCH, size, text);
    }

    fn text_in(&mut self, font: &'static str, x: f64, y: f64, size: f64, text: &str) {
        let resource = self.font_resource(font);
        self.ops.text(&resource, size, x, y, &encode_win_ansi(text));
    }

    fn barcode(&mut self, field: &Field, content: &LabelContent) {
        let x = field.x * POINTS_PER_INCH;
        let y = field.y * POINTS_PER_INCH;
        let code = content.upc.as_str();

        let modules = match upca_modules(&content.upc) {
            Ok(modules) => modules,
            Err(e) => {
                warn!(error = %e, "Barcode unavailable, drawing text");
                self.text_in("Helvetica", x, y, BARCODE_TEXT_SIZE, &format!("UPC:{}", code));
                return;
            }
        };

        let bar_h = field.height.unwrap_or(DEFAULT_BAR_HEIGHT_IN) * POINTS_PER_INCH;
        let module_w = field.width.map_or(DEFAULT_MODULE_WIDTH_IN, |w| w / modules.len() as f64) * POINTS_PER_INCH;
        let data_y = y + BARCODE_TEXT_SIZE + 1.0;

        self.ops.fill_gray(0.0);
        for (start, width) in bar_runs(&modules) {
            let (bottom, height) = if is_guard(start) {
                (data_y - GUARD_EXTENSION_PT, bar_h + GUARD_EXTENSION_PT)
            } else {
                (data_y, bar_h)
            };
            self.ops.fill_rect(x + start as f64 * module_w, bottom, width as f64 * module_w, height);
        }

        // Human-readable digits centred under the symbol
        let symbol_w = modules.len() as f64 * module_w;
        let text_w = code.len() as f64 * HELVETICA_DIGIT_WIDTH / 1000.0 * BARCODE_TEXT_SIZE;
        let text_x = x + ((symbol_w - text_w) / 2.0).max(0.0);
        self.text_in("Helvetica", text_x, y, BARCODE_TEXT_SIZE, code);
    }

    fn image(&mut self, field: &Field, template: &Template) {
        let requested = field.path.as_deref().unwrap_or(DEFAULT_IMAGE_PATH);
        let path = template.resolve_asset(requested);

        let placeholder = match load_image(&path) {
            Ok(img) => {
                let name = format!("Im{}", self.images.len() + 1);
                let w = field.width.unwrap_or(DEFAULT_IMAGE_SIZE_IN) * POINTS_PER_INCH;
                let h = field.height.unwrap_or(DEFAULT_IMAGE_SIZE_IN) * POINTS_PER_INCH;
                self.ops
                    .image(&name, field.x * POINTS_PER_INCH, field.y * POINTS_PER_INCH, w, h);
                self.images.push(PendingImage { name, ..img });
                return;
            }
            Err(ImageFailure::NotFound) => "[Image not found]",
            Err(ImageFailure::Decode(e)) => {
                warn!(path = %path.display(), error = %e, "Image could not be decoded");
                "[Image error]"
            }
            Err(ImageFailure::Unsupported) => "[No image support]",
        };
        self.text(field.x, field.y, field.size, placeholder);
    }

    fn finish(self, width_in: f64, height_in: f64) -> Vec<u8> {
        let mut pdf = PdfWriter::new();
        let catalog = pdf.reserve();
        let pages = pdf.reserve();

        let font_refs: Vec<ObjRef> = self.fonts.iter().map(|f| pdf.add(font_dict(f))).collect();

        let mut xobjects = Vec::new();
        for img in &self.images {
            let mut dict = img.dict.clone();
            if let Some((smask_dict, smask_data)) = &img.smask {
                let smask = pdf.add_stream(smask_dict, smask_data);
                dict.push_str(&format!(" /SMask {}", smask));
            }
            xobjects.push((img.name.clone(), pdf.add_stream(&dict, &img.data)));
        }

        let contents = pdf.add_stream("", &self.ops.into_bytes());

        let mut resources = String::from("/Font <<");
        for (i, r) in font_refs.iter().enumerate() {
            resources.push_str(&format!(" /F{} {}", i + 1, r));
        }
        resources.push_str(" >>");
        if !xobjects.is_empty() {
            resources.push_str(" /XObject <<");
            for (name, r) in &xobjects {
                resources.push_str(&format!(" /{} {}", name, r));
            }
            resources.push_str(" >>");
        }

        let page = pdf.add(format!(
            "<< /Type /Page /Parent {} /MediaBox [0 0 {} {}] /Resources << {} >> /Contents {} >>",
            pages,
            num(width_in * POINTS_PER_INCH),
            num(height_in * POINTS_PER_INCH),
            resources,
            contents
        ));
        pdf.set(pages, format!("<< /Type /Pages /Kids [{}] /Count 1 >>", page));
        pdf.set(catalog, format!("<< /Type /Catalog /Pages {} >>", pages));

        pdf.finish(catalog)
    }
}

fn font_dict(font: &str) -> String {
    match font {
        "Symbol" | "ZapfDingbats" => format!("<< /Type /Font /Subtype /Type1 /BaseFont /{} >>", font),
        _ => format!(
            "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
            font
        ),
    }
}

// ============================================================================
// IMAGES
// ============================================================================

enum ImageFailure {
    NotFound,
    #[cfg_attr(not(feature = "image"), allow(dead_code))]
    Decode(LabelerError),
    #[cfg_attr(feature = "image", allow(dead_code))]
    Unsupported,
}

#[cfg(feature = "image")]
fn load_image(path: &Path) -> std::result::Result<PendingImage, ImageFailure> {
    if !path.is_file() {
        return Err(ImageFailure::NotFound);
    }
    let decoded = image::open(path)
        .map_err(|e| ImageFailure::Decode(LabelerError::RenderingUnsupported(e.to_string())))?
        .to_rgba8();
    let (width, height) = decoded.dimensions();

    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    let mut alpha = Vec::with_capacity((width * height) as usize);
    for px in decoded.pixels() {
        rgb.extend_from_slice(&px.0[..3]);
        alpha.push(px.0[3]);
    }

    let image_dict = |color_space: &str| {
        format!(
            "/Type /XObject /Subtype /Image /Width {} /Height {} /ColorSpace /{} /BitsPerComponent 8 /Filter /FlateDecode",
            width, height, color_space
        )
    };

    let smask = if alpha.iter().any(|&a| a < u8::MAX) {
        Some((image_dict("DeviceGray"), deflate(&alpha).map_err(ImageFailure::Decode)?))
    } else {
        None
    };

    Ok(PendingImage {
        name: String::new(),
        dict: image_dict("DeviceRGB"),
        data: deflate(&rgb).map_err(ImageFailure::Decode)?,
        smask,
    })
}

#[cfg(not(feature = "image"))]
fn load_image(path: &Path) -> std::result::Result<PendingImage, ImageFailure> {
    if !path.is_file() {
        return Err(ImageFailure::NotFound);
    }
    Err(ImageFailure::Unsupported)
}

#[cfg(feature = "image")]
fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    use flate2::Compression;
    use flate2::write::ZlibEncoder;
    use std::io::Write;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}
