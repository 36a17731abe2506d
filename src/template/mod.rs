//! # Layout Templates
//!
//! A template says where each label field goes. The same template drives
//! every renderer.
//!
//! ## JSON Layout
//!
//! ```json
//! {
//!   "name": "default_2x2",
//!   "size_in": [2.0, 2.0],
//!   "font": "Helvetica",
//!   "emit": "dual",
//!   "fields": [
//!     {"name": "product_name", "x": 0.1, "y": 1.5, "size": 10},
//!     {"name": "barcode", "x": 0.1, "y": 0.05, "width": 1.8, "height": 0.5}
//!   ]
//! }
//! ```
//!
//! Coordinates are inches from the bottom-left corner. Unknown keys are
//! ignored; `file` is accepted for `path`.
//!
//! ## Kinds
//!
//! | File | Variant | Renderers |
//! |------|---------|-----------|
//! | `*.json` | [`LayoutTemplate::Vector`] | PDF, plus EPL when `emit` is `dual` |
//! | `*.prn` | [`LayoutTemplate::Placeholder`] | placeholder substitution only |

pub mod loader;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use loader::TemplateLoader;

/// Nominal label size when a template omits `size_in`.
pub const DEFAULT_SIZE_IN: [f64; 2] = [2.0, 2.0];

pub const DEFAULT_FONT: &str = "Helvetica";

pub const DEFAULT_FONT_SIZE: f64 = 8.0;

/// Which outputs a vector template produces when printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmitMode {
    /// PDF artifact only
    #[serde(alias = "vector_only", alias = "pdf")]
    Vector,
    /// PDF artifact plus positional commands sent to the printer
    #[default]
    Dual,
}

/// One placed element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    /// Font size in points
    #[serde(default = "default_font_size")]
    pub size: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    /// Image path for logo fields
    #[serde(default, alias = "file", skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// How renderers treat a field, decided by its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Barcode,
    Image,
    /// Text drawn from the label content
    Data,
}

impl Field {
    pub fn new(name: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            name: name.into(),
            x,
            y,
            size: DEFAULT_FONT_SIZE,
            width: None,
            height: None,
            path: None,
        }
    }

    pub fn with_size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }

    pub fn with_box(mut self, width: f64, height: f64) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn kind(&self) -> FieldKind {
        match self.name.as_str() {
            "barcode" => FieldKind::Barcode,
            "logo" | "image" => FieldKind::Image,
            _ => FieldKind::Data,
        }
    }
}

fn default_font_size() -> f64 {
    DEFAULT_FONT_SIZE
}

fn default_size_in() -> [f64; 2] {
    DEFAULT_SIZE_IN
}

fn default_font() -> String {
    DEFAULT_FONT.to_string()
}

/// A declarative vector layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_size_in")]
    pub size_in: [f64; 2],
    #[serde(default = "default_font")]
    pub font: String,
    #[serde(default)]
    pub emit: EmitMode,
    #[serde(default)]
    pub fields: Vec<Field>,
    /// Directory relative image paths resolve against
    #[serde(skip)]
    pub source_dir: Option<PathBuf>,
}

impl Template {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size_in: DEFAULT_SIZE_IN,
            font: default_font(),
            emit: EmitMode::default(),
            fields: Vec::new(),
            source_dir: None,
        }
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_emit(mut self, emit: EmitMode) -> Self {
        self.emit = emit;
        self
    }

    pub fn width_in(&self) -> f64 {
        self.size_in[0]
    }

    pub fn height_in(&self) -> f64 {
        self.size_in[1]
    }

    /// Resolve an asset path against the template's directory.
    pub fn resolve_asset(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        match &self.source_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// The stock 2x2 inch layout.
    pub fn default_2x2() -> Self {
        Self::new("default_2x2")
            .field(Field::new("product_name", 0.1, 1.5).with_size(10.0))
            .field(Field::new("weight", 0.1, 1.3).with_size(9.0))
            .field(Field::new("price_per_lb", 0.1, 1.1).with_size(9.0))
            .field(Field::new("total_price", 0.1, 0.9).with_size(12.0))
            .field(Field::new("sell_by", 0.1, 0.7))
            .field(Field::new("lot", 0.1, 0.5))
            .field(Field::new("barcode", 0.1, 0.05).with_box(1.8, 0.5))
    }
}

/// Raw printer-language text with `{name}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderTemplate {
    pub name: String,
    pub text: String,
}

/// A loaded template, tagged by kind.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutTemplate {
    Vector(Template),
    Placeholder(PlaceholderTemplate),
}

impl LayoutTemplate {
    pub fn name(&self) -> &str {
        match self {
            LayoutTemplate::Vector(t) => &t.name,
            LayoutTemplate::Placeholder(t) => &t.name,
        }
    }

    pub fn as_vector(&self) -> Option<&Template> {
        match self {
            LayoutTemplate::Vector(t) => Some(t),
            LayoutTemplate::Placeholder(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_keys() {
        let t: Template = serde_json::from_str(r#"{"fields": [{"name": "lot"}]}"#).unwrap();
        assert_eq!(t.size_in, [2.0, 2.0]);
        assert_eq!(t.font, "Helvetica");
        assert_eq!(t.emit, EmitMode::Dual);
        assert_eq!(t.fields[0].size, 8.0);
        assert_eq!(t.fields[0].x, 0.0);
        assert_eq!(t.fields[0].height, None);
    }

    #[test]
    fn test_unknown_keys_and_file_alias() {
        let t: Template = serde_json::from_str(
            r#"{"name": "x", "version": 3, "emit": "vector_only",
                "fields": [{"name": "logo", "file": "brand.png", "color": "red"}]}"#,
        )
        .unwrap();
        assert_eq!(t.emit, EmitMode::Vector);
        assert_eq!(t.fields[0].path.as_deref(), Some("brand.png"));
    }

    #[test]
    fn test_field_kinds() {
        assert_eq!(Field::new("barcode", 0.0, 0.0).kind(), FieldKind::Barcode);
        assert_eq!(Field::new("logo", 0.0, 0.0).kind(), FieldKind::Image);
        assert_eq!(Field::new("image", 0.0, 0.0).kind(), FieldKind::Image);
        assert_eq!(Field::new("weight", 0.0, 0.0).kind(), FieldKind::Data);
        assert_eq!(Field::new("department", 0.0, 0.0).kind(), FieldKind::Data);
    }

    #[test]
    fn test_resolve_asset() {
        let mut t = Template::new("x");
        assert_eq!(t.resolve_asset("logo.png"), PathBuf::from("logo.png"));

        t.source_dir = Some(PathBuf::from("/srv/templates"));
        assert_eq!(t.resolve_asset("logo.png"), PathBuf::from("/srv/templates/logo.png"));
        assert_eq!(t.resolve_asset("/abs/logo.png"), PathBuf::from("/abs/logo.png"));
    }

    #[test]
    fn test_default_template_shape() {
        let t = Template::default_2x2();
        let names: Vec<_> = t.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            ["product_name", "weight", "price_per_lb", "total_price", "sell_by", "lot", "barcode"]
        );
    }
}
