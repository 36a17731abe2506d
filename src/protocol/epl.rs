//! # EPL Positional Commands
//!
//! Line-oriented commands understood by EPL2 label printers (and the EPL
//! emulation in Datamax and Zebra desktop models).
//!
//! ## Job Structure
//!
//! ```text
//! N                                   clear image buffer
//! q406                                label width (dots)
//! Q406,24                             label length, gap (dots)
//! B20,10,0,E30,2,2,102,N,"212345014806"
//! A20,304,0,3,1,1,N,"Chicken Breast"
//! P1                                  print one copy
//! ```
//!
//! Lines are joined with a bare `\n`; there is no trailing newline.
//!
//! ## Field Arguments
//!
//! | Command | Arguments |
//! |---------|-----------|
//! | `A` | x, y, rotation, font, h-mult, v-mult, reverse, "data" |
//! | `B` | x, y, rotation, symbology, narrow, wide, height, human-readable, "data" |

// ============================================================================
// CONSTANTS
// ============================================================================

/// Default gap between labels, in dots.
pub const DEFAULT_GAP_DOTS: u32 = 24;

/// Symbology selector passed to `B` (EAN-13 family).
pub const BARCODE_SYMBOLOGY: &str = "E30";

/// Resident font used for `A` text.
pub const TEXT_FONT: u8 = 3;

// ============================================================================
// COMMAND BUILDERS
// ============================================================================

/// # Clear Image Buffer (N)
#[inline]
pub fn clear_buffer() -> String {
    "N".to_string()
}

/// # Set Label Width (q)
///
/// ```
/// use scale_labeler::protocol::epl;
///
/// assert_eq!(epl::label_width(406), "q406");
/// ```
#[inline]
pub fn label_width(dots: u32) -> String {
    format!("q{}", dots)
}

/// # Set Label Length and Gap (Q)
#[inline]
pub fn label_length(dots: u32, gap: u32) -> String {
    format!("Q{},{}", dots, gap)
}

/// # Barcode (B)
///
/// Rotation 0, narrow/wide bar ratio 2:2, no human-readable line.
pub fn barcode(x: i64, y: i64, height: u32, data: &str) -> String {
    format!(
        "B{},{},0,{},2,2,{},N,\"{}\"",
        x,
        y,
        BARCODE_SYMBOLOGY,
        height,
        quote_safe(data)
    )
}

/// # ASCII Text (A)
///
/// Rotation 0, font 3, no magnification, normal (not reversed).
pub fn text(x: i64, y: i64, data: &str) -> String {
    format!("A{},{},0,{},1,1,N,\"{}\"", x, y, TEXT_FONT, quote_safe(data))
}

/// # Print (P)
#[inline]
pub fn print(copies: u32) -> String {
    format!("P{}", copies)
}

/// Replace embedded double quotes, which would end the data argument.
pub fn quote_safe(data: &str) -> String {
    data.replace('"', "'")
}

// ============================================================================
// JOB BUILDER
// ============================================================================

/// Collects command lines for one label.
#[derive(Debug, Clone, Default)]
pub struct EplJob {
    lines: Vec<String>,
}

impl EplJob {
    /// Start a job: clear buffer, then set width and length.
    pub fn new(width_dots: u32, height_dots: u32, gap_dots: u32) -> Self {
        Self {
            lines: vec![
                clear_buffer(),
                label_width(width_dots),
                label_length(height_dots, gap_dots),
            ],
        }
    }

    pub fn push(&mut self, line: String) -> &mut Self {
        self.lines.push(line);
        self
    }

    /// Append `P{copies}` and join the lines.
    pub fn finish(mut self, copies: u32) -> String {
        self.lines.push(print(copies));
        self.lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_commands() {
        assert_eq!(clear_buffer(), "N");
        assert_eq!(label_width(406), "q406");
        assert_eq!(label_length(406, 24), "Q406,24");
        assert_eq!(print(1), "P1");
    }

    #[test]
    fn test_barcode_command() {
        assert_eq!(
            barcode(20, 10, 102, "212345014806"),
            r#"B20,10,0,E30,2,2,102,N,"212345014806""#
        );
    }

    #[test]
    fn test_text_command() {
        assert_eq!(text(20, 304, "Chicken Breast"), r#"A20,304,0,3,1,1,N,"Chicken Breast""#);
    }

    #[test]
    fn test_embedded_quotes_replaced() {
        assert_eq!(text(0, 0, r#"12" Sub"#), r#"A0,0,0,3,1,1,N,"12' Sub""#);
    }

    #[test]
    fn test_job_joins_without_trailing_newline() {
        let mut job = EplJob::new(406, 406, DEFAULT_GAP_DOTS);
        job.push(text(1, 2, "x"));
        assert_eq!(job.finish(1), "N\nq406\nQ406,24\nA1,2,0,3,1,1,N,\"x\"\nP1");
    }
}
