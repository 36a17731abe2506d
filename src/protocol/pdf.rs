//! # Minimal PDF Writer
//!
//! Just enough of PDF 1.4 to lay out one label page: indirect objects,
//! content streams, base-14 fonts and image XObjects.
//!
//! ## File Layout
//!
//! ```text
//! %PDF-1.4
//! %âãÏÓ
//! 1 0 obj ... endobj        objects in id order
//! ...
//! xref                      one 20-byte entry per object
//! trailer << /Size n /Root 1 0 R >>
//! startxref
//! {offset}
//! %%EOF
//! ```
//!
//! Output has no timestamps or random IDs, so the same input always yields
//! the same bytes.

use std::fmt::Write as _;

use tracing::debug;

/// Header plus the binary comment line that marks the file as binary.
const HEADER: &[u8] = b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n";

/// Points per inch.
pub const POINTS_PER_INCH: f64 = 72.0;

/// The 14 fonts every PDF viewer must provide.
pub const BASE14_FONTS: [&str; 14] = [
    "Courier",
    "Courier-Bold",
    "Courier-BoldOblique",
    "Courier-Oblique",
    "Helvetica",
    "Helvetica-Bold",
    "Helvetica-BoldOblique",
    "Helvetica-Oblique",
    "Symbol",
    "Times-Bold",
    "Times-BoldItalic",
    "Times-Italic",
    "Times-Roman",
    "ZapfDingbats",
];

/// Map a requested font to a base-14 name, falling back to Helvetica.
pub fn base14_font(name: &str) -> &'static str {
    BASE14_FONTS
        .iter()
        .find(|f| f.eq_ignore_ascii_case(name))
        .copied()
        .unwrap_or("Helvetica")
}

/// An indirect object reference (`n 0 R`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjRef(pub u32);

impl std::fmt::Display for ObjRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} 0 R", self.0)
    }
}

// ============================================================================
// DOCUMENT
// ============================================================================

/// Accumulates numbered objects and serializes them with an xref table.
#[derive(Debug, Default)]
pub struct PdfWriter {
    objects: Vec<Option<Vec<u8>>>,
}

impl PdfWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve an object number to fill in later with [`set`](Self::set).
    pub fn reserve(&mut self) -> ObjRef {
        self.objects.push(None);
        ObjRef(self.objects.len() as u32)
    }

    pub fn set(&mut self, obj: ObjRef, body: impl Into<Vec<u8>>) {
        if let Some(slot) = (obj.0 as usize).checked_sub(1).and_then(|i| self.objects.get_mut(i)) {
            *slot = Some(body.into());
        }
    }

    /// Add a non-stream object such as `<< /Type /Font ... >>`.
    pub fn add(&mut self, body: impl Into<Vec<u8>>) -> ObjRef {
        let obj = self.reserve();
        self.set(obj, body);
        obj
    }

    /// Add a stream object. `dict` holds extra entries; `/Length` is added.
    pub fn add_stream(&mut self, dict: &str, data: &[u8]) -> ObjRef {
        let mut body = Vec::with_capacity(data.len() + dict.len() + 48);
        let sep = if dict.is_empty() { "" } else { " " };
        body.extend_from_slice(format!("<< /Length {}{}{} >>\nstream\n", data.len(), sep, dict).as_bytes());
        body.extend_from_slice(data);
        body.extend_from_slice(b"\nendstream");
        self.add(body)
    }

    /// Serialize with `root` as the document catalog.
    ///
    /// Reserved objects that were never set are written as `null`.
    pub fn finish(self, root: ObjRef) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(HEADER);

        let mut offsets = Vec::with_capacity(self.objects.len());
        for (i, body) in self.objects.iter().enumerate() {
            offsets.push(out.len());
            out.extend_from_slice(format!("{} 0 obj\n", i + 1).as_bytes());
            out.extend_from_slice(body.as_deref().unwrap_or(b"null"));
            out.extend_from_slice(b"\nendobj\n");
        }

        let xref_at = out.len();
        let size = self.objects.len() + 1;
        let mut tail = String::new();
        let _ = write!(tail, "xref\n0 {}\n0000000000 65535 f \n", size);
        for offset in &offsets {
            let _ = write!(tail, "{:010} 00000 n \n", offset);
        }
        let _ = write!(
            tail,
            "trailer\n<< /Size {} /Root {} >>\nstartxref\n{}\n%%EOF\n",
            size, root, xref_at
        );
        out.extend_from_slice(tail.as_bytes());

        debug!(objects = self.objects.len(), bytes = out.len(), "PDF serialized");
        out
    }
}

// ============================================================================
// CONTENT STREAMS
// ============================================================================

/// Builds page drawing operators.
#[derive(Debug, Clone, Default)]
pub struct ContentStream {
    ops: Vec<u8>,
}

impl ContentStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw one line of already-encoded text at (x, y) with font resource
    /// `font`.
    pub fn text(&mut self, font: &str, size: f64, x: f64, y: f64, encoded: &[u8]) -> &mut Self {
        let head = format!("BT /{} {} Tf {} {} Td ", font, num(size), num(x), num(y));
        self.ops.extend_from_slice(head.as_bytes());
        self.ops.extend_from_slice(&literal_string(encoded));
        self.ops.extend_from_slice(b" Tj ET\n");
        self
    }

    /// Filled rectangle in the current fill color.
    pub fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64) -> &mut Self {
        self.op(format!("{} {} {} {} re f\n", num(x), num(y), num(w), num(h)))
    }

    /// Gray fill color, 0 is black.
    pub fn fill_gray(&mut self, level: f64) -> &mut Self {
        self.op(format!("{} g\n", num(level)))
    }

    /// Paint image XObject `name` scaled into the box.
    pub fn image(&mut self, name: &str, x: f64, y: f64, w: f64, h: f64) -> &mut Self {
        self.op(format!(
            "q {} 0 0 {} {} {} cm /{} Do Q\n",
            num(w),
            num(h),
            num(x),
            num(y),
            name
        ))
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.ops
    }

    fn op(&mut self, s: String) -> &mut Self {
        self.ops.extend_from_slice(s.as_bytes());
        self
    }
}

/// Format a number with at most 3 decimals and no trailing zeros.
pub fn num(v: f64) -> String {
    if !v.is_finite() {
        return "0".to_string();
    }
    let s = format!("{:.3}", v);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    match s {
        "" | "-0" => "0".to_string(),
        _ => s.to_string(),
    }
}

/// `(...)` string literal with `\`, `(`, `)` escaped and control or high
/// bytes written as octal.
pub fn literal_string(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() + 2);
    out.push(b'(');
    for &b in bytes {
        match b {
            b'\\' | b'(' | b')' => {
                out.push(b'\\');
                out.push(b);
            }
            0x20..=0x7E => out.push(b),
            _ => out.extend_from_slice(format!("\\{:03o}", b).as_bytes()),
        }
    }
    out.push(b')');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_num_formatting() {
        assert_eq!(num(144.0), "144");
        assert_eq!(num(7.2), "7.2");
        assert_eq!(num(0.0), "0");
        assert_eq!(num(-0.0001), "0");
        assert_eq!(num(1.23456), "1.235");
        assert_eq!(num(f64::NAN), "0");
    }

    #[test]
    fn test_literal_string_escapes() {
        assert_eq!(literal_string(b"a(b)c\\"), b"(a\\(b\\)c\\\\)".to_vec());
        assert_eq!(literal_string(&[0xF1, b'\n']), b"(\\361\\012)".to_vec());
    }

    #[test]
    fn test_base14_fallback() {
        assert_eq!(base14_font("Helvetica"), "Helvetica");
        assert_eq!(base14_font("times-roman"), "Times-Roman");
        assert_eq!(base14_font("Arial"), "Helvetica");
        assert_eq!(base14_font(""), "Helvetica");
    }

    #[test]
    fn test_xref_offsets_point_at_objects() {
        let mut w = PdfWriter::new();
        let catalog = w.reserve();
        let info = w.add("<< /Title (x) >>");
        w.set(catalog, "<< /Type /Catalog >>");
        let bytes = w.finish(catalog);
        let text = String::from_utf8_lossy(&bytes).into_owned();

        assert!(text.starts_with("%PDF-1.4\n"));
        assert!(text.ends_with("%%EOF\n"));

        let xref_at: usize = text.lines().rev().nth(1).unwrap().parse().unwrap();
        assert!(bytes[xref_at..].starts_with(b"xref\n0 3\n"));

        for obj in [catalog, info] {
            let marker = format!("{} 0 obj", obj.0);
            let offset = bytes.windows(marker.len()).position(|w| w == marker.as_bytes()).unwrap();
            assert!(text.contains(&format!("{:010} 00000 n ", offset)));
        }
    }

    #[test]
    fn test_stream_length() {
        let mut w = PdfWriter::new();
        let s = w.add_stream("", b"0 g\n");
        let root = w.add("<< /Type /Catalog >>");
        let text = String::from_utf8_lossy(&w.finish(root)).into_owned();
        assert_eq!(s, ObjRef(1));
        assert!(text.contains("<< /Length 4 >>\nstream\n0 g\n\nendstream"));
    }

    #[test]
    fn test_content_ops() {
        let mut c = ContentStream::new();
        c.text("F1", 12.0, 7.2, 64.8, b"Total: $14.80")
            .fill_gray(0.0)
            .fill_rect(1.0, 2.0, 0.5, 36.0)
            .image("Im1", 7.2, 122.4, 57.6, 36.0);
        assert_eq!(
            String::from_utf8(c.into_bytes()).unwrap(),
            "BT /F1 12 Tf 7.2 64.8 Td (Total: $14.80) Tj ET\n\
             0 g\n\
             1 2 0.5 36 re f\n\
             q 57.6 0 0 36 7.2 122.4 cm /Im1 Do Q\n"
        );
    }
}
