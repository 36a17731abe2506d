//! Business-field text shared by all renderers.
//!
//! | field | vector | positional | placeholder |
//! |-------|--------|------------|-------------|
//! | `product_name` | `{name}` | `{name}` | `{name}` |
//! | `weight` | `Weight: 4.950 lb` | `4.950 lb` | `4.950` |
//! | `price_per_lb` | `2.99 /lb` | `2.99 /lb` | `2.99` |
//! | `total_price` | `Total: $14.80` | `Total: $14.80` | `14.80` |
//! | `sell_by` | `Sell by: {date}` | `Sell by: {date}` | `{date}` |
//! | `lot` | `Lot: {lot}` | `Lot: {lot}` | `{lot}` |
//! | anything else | raw value | raw value | not substituted |

use crate::content::LabelContent;

/// Output family a field is formatted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Vector,
    Positional,
}

/// Text for a data field on a vector or positional label.
pub fn field_text(name: &str, content: &LabelContent, target: Target) -> String {
    match name {
        "product_name" => content.product_name.clone(),
        "weight" => match target {
            Target::Vector => format!("Weight: {:.3} lb", content.weight),
            Target::Positional => format!("{:.3} lb", content.weight),
        },
        "price_per_lb" => format!("{:.2} /lb", content.price_per_lb),
        "total_price" => format!("Total: ${:.2}", content.total_price),
        "sell_by" => format!("Sell by: {}", content.sell_by),
        "lot" => format!("Lot: {}", content.lot),
        other => content.raw_value(other),
    }
}

/// Keys substituted into placeholder templates, with their bare values.
pub fn placeholder_values(content: &LabelContent) -> [(&'static str, String); 7] {
    [
        ("product_name", content.product_name.clone()),
        ("weight", format!("{:.3}", content.weight)),
        ("price_per_lb", format!("{:.2}", content.price_per_lb)),
        ("total_price", format!("{:.2}", content.total_price)),
        ("sell_by", content.sell_by.clone()),
        ("lot", content.lot.clone()),
        ("upc", content.upc.to_string()),
    ]
}
