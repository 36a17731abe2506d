//! UPC-A bar modules.
//!
//! Uses the barcoders crate's EAN-13 encoder: a UPC-A symbol is an EAN-13
//! symbol whose number system digit is `0`, so both encode to the same 95
//! modules.

use barcoders::sym::ean13::EAN13;

use crate::error::{LabelerError, Result};
use crate::upc::Upc;

/// Modules in a UPC-A symbol, guards included.
pub const UPCA_MODULES: usize = 95;

/// Encode a UPC as bar modules (1 = bar, 0 = space).
///
/// ## Errors
///
/// `RenderingUnsupported` if the encoder rejects the code.
pub fn upca_modules(upc: &Upc) -> Result<Vec<u8>> {
    let code = upc.as_str();
    let body = code
        .get(..11)
        .ok_or_else(|| LabelerError::RenderingUnsupported(format!("UPC-A needs 12 digits: {}", code)))?;

    let symbol = EAN13::new(&format!("0{}", body))
        .map_err(|e| LabelerError::RenderingUnsupported(format!("UPC-A {}: {:?}", code, e)))?;
    let modules = symbol.encode();

    if modules.len() != UPCA_MODULES {
        return Err(LabelerError::RenderingUnsupported(format!(
            "UPC-A {}: {} modules",
            code,
            modules.len()
        )));
    }
    Ok(modules)
}

/// Merge adjacent bar modules into `(start, width)` runs.
pub fn bar_runs(modules: &[u8]) -> Vec<(usize, usize)> {
    let mut runs = Vec::new();
    let mut start = None;
    for (i, &m) in modules.iter().enumerate() {
        match (m == 1, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                runs.push((s, i - s));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        runs.push((s, modules.len() - s));
    }
    runs
}

/// Whether module `i` belongs to a guard pattern, drawn taller than data
/// bars.
pub fn is_guard(i: usize) -> bool {
    i < 3 || (45..50).contains(&i) || i >= UPCA_MODULES - 3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upca_module_count() {
        let upc = Upc::parse("212345014806").unwrap();
        let modules = upca_modules(&upc).unwrap();
        assert_eq!(modules.len(), 95);
        // start guard 101, middle guard 01010, end guard 101
        assert_eq!(&modules[..3], &[1, 0, 1]);
        assert_eq!(&modules[45..50], &[0, 1, 0, 1, 0]);
        assert_eq!(&modules[92..], &[1, 0, 1]);
    }

    #[test]
    fn test_bar_runs() {
        assert_eq!(bar_runs(&[1, 0, 1, 1, 0, 0, 1]), vec![(0, 1), (2, 2), (6, 1)]);
        assert!(bar_runs(&[0, 0]).is_empty());
    }

    #[test]
    fn test_guards() {
        assert!(is_guard(0));
        assert!(is_guard(47));
        assert!(is_guard(94));
        assert!(!is_guard(3));
        assert!(!is_guard(91));
    }
}
