//! # Single-Byte Text Encoding
//!
//! Label printers and PDF base-14 fonts both take single-byte text.
//!
//! | Encoder | Target | Passes through |
//! |---------|--------|----------------|
//! | [`encode_ascii`] | printer command streams | U+0000–U+007F |
//! | [`encode_win_ansi`] | PDF strings in base-14 fonts | ASCII, Latin-1, WinAnsi extras |
//!
//! Anything else becomes `?`. Characters are replaced, never escaped.

use tracing::debug;

/// Encode as ASCII, replacing everything else with `?`.
pub fn encode_ascii(s: &str) -> Vec<u8> {
    encode_with(s, |ch| ch.is_ascii().then_some(ch as u8))
}

/// Encode as WinAnsiEncoding (Windows-1252), replacing unmapped characters
/// with `?`.
pub fn encode_win_ansi(s: &str) -> Vec<u8> {
    encode_with(s, unicode_to_win_ansi)
}

fn encode_with(s: &str, map: impl Fn(char) -> Option<u8>) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len());
    for ch in s.chars() {
        match map(ch) {
            Some(byte) => out.push(byte),
            None => {
                debug!(character = %ch, code = ch as u32, "Unmapped character replaced with '?'");
                out.push(b'?');
            }
        }
    }
    out
}

fn unicode_to_win_ansi(ch: char) -> Option<u8> {
    let code = ch as u32;
    if code < 0x80 || (0xA0..=0xFF).contains(&code) {
        return Some(code as u8);
    }
    // 0x80–0x9F differ from Latin-1
    let byte = match ch {
        '€' => 0x80,
        '‚' => 0x82,
        'ƒ' => 0x83,
        '„' => 0x84,
        '…' => 0x85,
        '†' => 0x86,
        '‡' => 0x87,
        'ˆ' => 0x88,
        '‰' => 0x89,
        'Š' => 0x8A,
        '‹' => 0x8B,
        'Œ' => 0x8C,
        'Ž' => 0x8E,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '˜' => 0x98,
        '™' => 0x99,
        'š' => 0x9A,
        '›' => 0x9B,
        'œ' => 0x9C,
        'ž' => 0x9E,
        'Ÿ' => 0x9F,
        _ => return None,
    };
    Some(byte)
}
