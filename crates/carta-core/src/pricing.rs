//! Unit price and display-name resolution for cart lines.
//!
//! Values are numeric only. Currency formatting belongs to whatever renders
//! them.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::products::Product;

/// The price a cart line is charged at and the name it is shown under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPrice {
    pub unit_price: Decimal,
    pub display_name: String,
}

/// Resolves the unit price and display name for `product` in `selected_size`.
///
/// With a size, the price comes from the product's size table when that entry
/// parses as a number, otherwise from the flat `precio`. The display name gets
/// a `" - {size}"` suffix whenever a size is selected. See [`normalize_size`]
/// for what counts as a selection.
#[must_use]
pub fn resolve_price(product: &Product, selected_size: Option<&str>) -> ResolvedPrice {
    match normalize_size(selected_size) {
        Some(size) => ResolvedPrice {
            unit_price: product.size_price(size).unwrap_or(product.price),
            display_name: format!("{} - {size}", product.name),
        },
        None => ResolvedPrice {
            unit_price: product.price,
            display_name: product.name.clone(),
        },
    }
}

/// Trims a size label; blank or whitespace-only labels are no selection.
#[must_use]
pub fn normalize_size(selected_size: Option<&str>) -> Option<&str> {
    selected_size.map(str::trim).filter(|size| !size.is_empty())
}

/// Parses an upstream price value: a JSON number or a numeric string.
///
/// Returns `None` for anything else, including blank strings.
#[must_use]
pub fn parse_price(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(Decimal::from(i))
            } else if let Some(u) = n.as_u64() {
                Some(Decimal::from(u))
            } else {
                n.as_f64().and_then(|f| Decimal::try_from(f).ok())
            }
        }
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Decimal::from_str(trimmed).ok()
            }
        }
        _ => None,
    }
}

/// Lenient `precio` deserializer: unparsable or `null` prices become zero.
pub(crate) fn deserialize_price<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(parse_price(&raw).unwrap_or(Decimal::ZERO))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn pizza() -> Product {
        serde_json::from_value(json!({
            "id": 3,
            "nombre": "Pizza Hawaiana",
            "precio": 20000,
            "type": "Pizza",
            "grupo_id": 1,
            "tamanos_disponibles": ["Pequeña", "Grande", "Familiar"],
            "precios_por_tamano": { "Grande": 35000, "Pequeña": "22000", "Familiar": "n/a" }
        }))
        .unwrap()
    }

    #[test]
    fn selected_size_uses_size_table_price() {
        let resolved = resolve_price(&pizza(), Some("Grande"));
        assert_eq!(resolved.unit_price, Decimal::from(35_000));
        assert_eq!(resolved.display_name, "Pizza Hawaiana - Grande");
    }

    #[test]
    fn no_size_uses_flat_price_and_plain_name() {
        let resolved = resolve_price(&pizza(), None);
        assert_eq!(resolved.unit_price, Decimal::from(20_000));
        assert_eq!(resolved.display_name, "Pizza Hawaiana");
    }

    #[test]
    fn string_table_entry_is_parsed() {
        let resolved = resolve_price(&pizza(), Some("Pequeña"));
        assert_eq!(resolved.unit_price, Decimal::from(22_000));
    }

    #[test]
    fn unparsable_table_entry_falls_back_to_flat_price_but_keeps_suffix() {
        let resolved = resolve_price(&pizza(), Some("Familiar"));
        assert_eq!(resolved.unit_price, Decimal::from(20_000));
        assert_eq!(resolved.display_name, "Pizza Hawaiana - Familiar");
    }

    #[test]
    fn size_missing_from_table_falls_back_to_flat_price() {
        let resolved = resolve_price(&pizza(), Some("Mediana"));
        assert_eq!(resolved.unit_price, Decimal::from(20_000));
        assert_eq!(resolved.display_name, "Pizza Hawaiana - Mediana");
    }

    #[test]
    fn empty_size_counts_as_no_selection() {
        let resolved = resolve_price(&pizza(), Some(""));
        assert_eq!(resolved.display_name, "Pizza Hawaiana");
    }

    #[test]
    fn whitespace_size_counts_as_no_selection() {
        let resolved = resolve_price(&pizza(), Some("   "));
        assert_eq!(resolved.unit_price, Decimal::from(20_000));
        assert_eq!(resolved.display_name, "Pizza Hawaiana");
    }

    #[test]
    fn padded_size_is_trimmed_before_lookup() {
        let resolved = resolve_price(&pizza(), Some(" Grande "));
        assert_eq!(resolved.unit_price, Decimal::from(35_000));
        assert_eq!(resolved.display_name, "Pizza Hawaiana - Grande");
    }

    #[test]
    fn parse_price_accepts_decimal_strings_and_floats() {
        assert_eq!(
            parse_price(&json!("12500.50")),
            Some(Decimal::from_str("12500.50").unwrap())
        );
        assert_eq!(parse_price(&json!(1.5)), Some(Decimal::from_str("1.5").unwrap()));
        assert_eq!(parse_price(&json!("  ")), None);
        assert_eq!(parse_price(&json!(null)), None);
        assert_eq!(parse_price(&json!(true)), None);
    }
}
