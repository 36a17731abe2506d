//! # Placeholder Renderer
//!
//! Fills a raw printer-language template (`.prn`) with label values.
//!
//! ## Substitution
//!
//! - `{key}` for every content key, matched case-insensitively
//! - legacy angle-bracket tokens, matched exactly:
//!
//! | Token | Value |
//! |-------|-------|
//! | `<WtLbs>` | weight |
//! | `<KillDate>` | sell-by |
//! | `<SellBy1>` | sell-by |
//! | `<PluWgtSer>` | UPC |
//!
//! Values are inserted literally. Tokens with no mapping stay as they are.
//! The result is ASCII; other characters become `?`.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::debug;

use super::fields::placeholder_values;
use super::Renderer;
use crate::content::LabelContent;
use crate::error::Result;
use crate::protocol::charset::encode_ascii;
use crate::template::PlaceholderTemplate;

/// Legacy tokens and the content key each one stands for.
pub const ANGLE_ALIASES: [(&str, &str); 4] = [
    ("<WtLbs>", "weight"),
    ("<KillDate>", "sell_by"),
    ("<SellBy1>", "sell_by"),
    ("<PluWgtSer>", "upc"),
];

const KEYS: [&str; 7] = ["product_name", "weight", "price_per_lb", "total_price", "sell_by", "lot", "upc"];

/// One pass over the text, so inserted values are never rescanned.
static TOKENS: LazyLock<Regex> = LazyLock::new(|| {
    let keys: Vec<String> = KEYS.iter().map(|k| regex::escape(k)).collect();
    let aliases: Vec<String> = ANGLE_ALIASES
        .iter()
        .map(|(token, _)| regex::escape(&token[1..token.len() - 1]))
        .collect();
    let pattern = format!(r"\{{(?i:({}))\}}|<({})>", keys.join("|"), aliases.join("|"));
    Regex::new(&pattern).expect("placeholder pattern is valid")
});

/// Substitutes content into placeholder templates.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderRenderer;

impl PlaceholderRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Substitute into `text` without encoding.
    pub fn substitute(&self, text: &str, content: &LabelContent) -> String {
        let values = placeholder_values(content);
        let lookup = |key: &str| {
            values
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.as_str())
                .unwrap_or_default()
        };

        TOKENS
            .replace_all(text, |caps: &Captures<'_>| {
                if let Some(key) = caps.get(1) {
                    return lookup(&key.as_str().to_ascii_lowercase()).to_string();
                }
                let token = caps.get(0).map_or("", |m| m.as_str());
                ANGLE_ALIASES
                    .iter()
                    .find(|(alias, _)| *alias == token)
                    .map_or_else(|| token.to_string(), |(_, key)| lookup(key).to_string())
            })
            .into_owned()
    }
}

impl Renderer for PlaceholderRenderer {
    type Layout = PlaceholderTemplate;

    fn render(&self, template: &PlaceholderTemplate, content: &LabelContent) -> Result<Vec<u8>> {
        let text = self.substitute(&template.text, content);
        debug!(template = %template.name, bytes = text.len(), "Rendered placeholder template");
        Ok(encode_ascii(&text))
    }
}
