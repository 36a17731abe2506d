//! # Price-Embedded UPC-A
//!
//! Builds the 12-digit UPC-A codes printed on random-weight labels. The code
//! carries the price directly instead of pointing at a price lookup:
//!
//! ```text
//!  2  SSSSS  CCCCC  K
//!  │    │      │    └─ mod-10 check digit
//!  │    │      └────── price in cents (5 digits)
//!  │    └───────────── product seed (5 digits)
//!  └────────────────── number system 2: random-weight item
//! ```
//!
//! ## Example
//!
//! ```
//! use scale_labeler::upc;
//!
//! let code = upc::make_price_embedded_upc("12345", 1480)?;
//! assert_eq!(code.as_str(), "212345014806");
//! assert!(upc::verify(code.as_str()));
//! # Ok::<(), scale_labeler::LabelerError>(())
//! ```

use std::fmt;

use serde::Serialize;

use crate::error::{LabelerError, Result};

/// Number-system digit for random-weight, price-embedded codes.
pub const PRICE_EMBEDDED_PREFIX: char = '2';

/// Width of the seed and cents groups.
const GROUP_WIDTH: usize = 5;

/// A validated 12-digit UPC-A code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Upc(String);

impl Upc {
    /// Wrap an existing code, checking length, digits and check digit.
    pub fn parse(code: &str) -> Result<Self> {
        if verify(code) {
            Ok(Self(code.to_string()))
        } else {
            Err(LabelerError::InvalidInput(format!(
                "not a valid 12-digit UPC-A: {:?}",
                code
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The 5-digit product seed group.
    pub fn seed(&self) -> &str {
        &self.0[1..6]
    }

    /// The 5-digit cents group.
    pub fn cents(&self) -> &str {
        &self.0[6..11]
    }

    pub fn check(&self) -> char {
        // Invariant: 12 ASCII digits
        self.0.as_bytes()[11] as char
    }
}

impl fmt::Display for Upc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// # UPC-A Check Digit
///
/// Takes the first 11 digits of a code. Digits at 0-indexed positions
/// 0, 2, 4, 6, 8, 10 are weighted ×3, positions 1, 3, 5, 7, 9 ×1.
///
/// ```text
/// total = S_odd * 3 + S_even
/// check = (10 - total mod 10) mod 10
/// ```
///
/// ## Errors
///
/// `InvalidInput` unless `digits` is exactly 11 ASCII digits.
pub fn check_digit(digits: &str) -> Result<char> {
    if digits.len() != 11 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(LabelerError::InvalidInput(format!(
            "expected 11 digits, got {:?}",
            digits
        )));
    }

    let values: Vec<u32> = digits.bytes().map(|b| u32::from(b - b'0')).collect();
    let s_odd: u32 = values.iter().step_by(2).sum();
    let s_even: u32 = values.iter().skip(1).step_by(2).sum();
    let total = s_odd * 3 + s_even;
    let check = (10 - total % 10) % 10;

    // check is 0..=9
    Ok(char::from(b'0' + check as u8))
}

/// True when `code` is 12 digits whose last digit matches [`check_digit`].
pub fn verify(code: &str) -> bool {
    if code.len() != 12 || !code.is_ascii() {
        return false;
    }
    match check_digit(&code[..11]) {
        Ok(expected) => code.ends_with(expected),
        Err(_) => false,
    }
}

/// # Make Price-Embedded UPC
///
/// `core = "2" + seed5 + cents5`, followed by its check digit.
///
/// Seed and cents are left-padded with zeros to 5 digits. Longer values keep
/// their five least-significant digits.
///
/// ## Errors
///
/// `InvalidInput` if the seed is empty or contains anything but ASCII digits.
pub fn make_price_embedded_upc(seed: &str, cents: u64) -> Result<Upc> {
    let seed = seed.trim();
    if seed.is_empty() || !seed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(LabelerError::InvalidInput(format!(
            "barcode seed must be numeric, got {:?}",
            seed
        )));
    }

    let seed5 = fit_group(seed);
    let cents5 = fit_group(&cents.to_string());

    let mut code = String::with_capacity(12);
    code.push(PRICE_EMBEDDED_PREFIX);
    code.push_str(&seed5);
    code.push_str(&cents5);
    let check = check_digit(&code)?;
    code.push(check);

    Ok(Upc(code))
}

/// Zero-pad to the group width, or keep the trailing group-width digits.
fn fit_group(digits: &str) -> String {
    if digits.len() >= GROUP_WIDTH {
        digits[digits.len() - GROUP_WIDTH..].to_string()
    } else {
        format!("{:0>width$}", digits, width = GROUP_WIDTH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_digit_known_code() {
        // 03600029145 → 2 (common UPC-A textbook example)
        assert_eq!(check_digit("03600029145").unwrap(), '2');
    }

    #[test]
    fn test_check_digit_rejects_bad_length() {
        assert!(matches!(
            check_digit("1234"),
            Err(LabelerError::InvalidInput(_))
        ));
        assert!(check_digit("123456789012").is_err());
    }

    #[test]
    fn test_check_digit_rejects_non_digits() {
        assert!(check_digit("1234567890a").is_err());
        assert!(check_digit("１２３４５６７８９０１").is_err());
    }

    #[test]
    fn test_make_upc_sample_product() {
        let code = make_price_embedded_upc("12345", 1480).unwrap();
        assert_eq!(code.as_str(), "212345014806");
        assert_eq!(code.seed(), "12345");
        assert_eq!(code.cents(), "01480");
        assert_eq!(code.check(), '6');
    }

    #[test]
    fn test_make_upc_pads_short_values() {
        let code = make_price_embedded_upc("7", 5).unwrap();
        assert_eq!(&code.as_str()[..11], "20000700005");
    }

    #[test]
    fn test_make_upc_truncates_long_values() {
        let code = make_price_embedded_upc("9912345", 123456).unwrap();
        assert_eq!(code.seed(), "12345");
        assert_eq!(code.cents(), "23456");
        assert!(verify(code.as_str()));
    }

    #[test]
    fn test_make_upc_rejects_non_numeric_seed() {
        assert!(make_price_embedded_upc("ABC12", 100).is_err());
        assert!(make_price_embedded_upc("", 100).is_err());
    }

    #[test]
    fn test_make_upc_structure_across_ranges() {
        for seed in (0..=99_999u64).step_by(997).chain([99_999]) {
            for cents in (0..=99_999u64).step_by(1_009).chain([99_999]) {
                let code = make_price_embedded_upc(&seed.to_string(), cents).unwrap();
                let s = code.as_str();
                assert_eq!(s.len(), 12);
                assert!(s.bytes().all(|b| b.is_ascii_digit()));
                assert_eq!(&s[0..1], "2");
                assert_eq!(&s[1..6], format!("{:05}", seed));
                assert_eq!(&s[6..11], format!("{:05}", cents));
                assert_eq!(check_digit(&s[..11]).unwrap(), code.check());
            }
        }
    }

    #[test]
    fn test_verify_is_idempotent() {
        for code in ["036000291452", "212345014806", "200000000004"] {
            assert!(verify(code), "{}", code);
            let recomputed = check_digit(&code[..11]).unwrap();
            assert_eq!(code.chars().last(), Some(recomputed));
        }
    }

    #[test]
    fn test_verify_rejects_bad_check() {
        assert!(!verify("212345014807"));
        assert!(!verify("21234501480"));
    }

    #[test]
    fn test_parse_roundtrip() {
        let upc = Upc::parse("212345014806").unwrap();
        assert_eq!(upc.to_string(), "212345014806");
        assert!(Upc::parse("212345014801").is_err());
    }
}
