//! Weight extraction from scale output lines.
//!
//! Scales print lines such as `ST,GS,+  4.950lb` or `   1.40 LB G`. The first
//! `digits.digits` token is the reading; everything else is framing.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{LabelerError, Result};

static WEIGHT_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+\.\d+)").expect("weight pattern is valid"));

/// Parse the first decimal number in a line.
///
/// ## Errors
///
/// `InvalidInput` when the line holds no decimal token. Callers inside the
/// sampling loop discard these silently.
pub fn parse_weight(line: &str) -> Result<f64> {
    let token = WEIGHT_TOKEN
        .find(line)
        .ok_or_else(|| LabelerError::InvalidInput(format!("no weight in {:?}", line.trim())))?;

    token
        .as_str()
        .parse::<f64>()
        .map_err(|e| LabelerError::InvalidInput(format!("{}: {}", token.as_str(), e)))
}

/// Decode raw bytes from the device, dropping invalid UTF-8, and trim.
pub fn decode_line(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .chars()
        .filter(|&c| c != char::REPLACEMENT_CHARACTER)
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_framed_reading() {
        assert_eq!(parse_weight("ST,GS,+  4.950lb").unwrap(), 4.95);
        assert_eq!(parse_weight("   1.40 LB G").unwrap(), 1.4);
    }

    #[test]
    fn test_first_token_wins() {
        assert_eq!(parse_weight("2.50 lb 3.75 lb").unwrap(), 2.5);
    }

    #[test]
    fn test_integers_are_not_weights() {
        assert!(parse_weight("ST,GS 5 lb").is_err());
        assert!(parse_weight("").is_err());
        assert!(parse_weight("OVERLOAD").is_err());
    }

    #[test]
    fn test_decode_line_drops_garbage() {
        assert_eq!(decode_line(b"\xff 1.25 lb\r\n"), "1.25 lb");
    }
}
