//! Menu records as served by the storefront API.
//!
//! Wire field names are Spanish (`nombre`, `precio`, `tamanos_disponibles`);
//! the Rust names are English. A few upstream quirks are absorbed here so the
//! rest of the workspace never sees them:
//!
//! - `precio`, the values of `precios_por_tamano` and a combo item's
//!   `cantidad` arrive as JSON numbers or numeric strings.
//! - `disponible` is usually a bool but sometimes `"true"`/`"false"` or `1`/`0`.
//! - `ingredientes` is either an array of strings or one comma-separated
//!   string.
//! - A combo's `items` is either an ordered array or an object keyed by
//!   position (`{"0": {...}, "1": {...}}`), depending on how the record was
//!   last written. Both normalize to the same ordered `Vec<ComboItem>`.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::ids::{CategoryId, ProductId};
use crate::pricing::{deserialize_price, parse_price};

/// Product kinds whose price depends on a selected size.
pub const SIZED_KINDS: [&str; 3] = ["Pizza", "Bebida", "Acompañante"];

/// A menu category (pizzas, drinks, combos...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(default, rename = "descripcion")]
    pub description: Option<String>,
    #[serde(default, rename = "imagen_url")]
    pub image_url: Option<String>,
}

/// A product as listed by the storefront API.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Product {
    pub id: ProductId,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(default, rename = "descripcion")]
    pub description: Option<String>,
    #[serde(default, rename = "imagen_url")]
    pub image_url: Option<String>,
    /// Flat list price; also the fallback when a size has no table entry.
    #[serde(default, rename = "precio", deserialize_with = "deserialize_price")]
    pub price: Decimal,
    /// Product kind, e.g. `"Pizza"`, `"Bebida"`, `"Combo"`.
    #[serde(default, rename = "type", alias = "tipo")]
    pub kind: Option<String>,
    #[serde(
        default,
        rename = "grupo_id",
        alias = "categoriaId",
        alias = "categoria_id"
    )]
    pub category_id: Option<CategoryId>,
    /// `None` when the listing omits the flag.
    #[serde(default, rename = "disponible", deserialize_with = "deserialize_flag")]
    pub available: Option<bool>,
    #[serde(
        default,
        rename = "ingredientes",
        deserialize_with = "deserialize_ingredients"
    )]
    pub ingredients: Vec<String>,
    /// Size labels in display order.
    #[serde(
        default,
        rename = "tamanos_disponibles",
        deserialize_with = "null_as_default"
    )]
    pub sizes: Vec<String>,
    /// Raw per-size price table; entries are parsed at resolve time.
    #[serde(
        default,
        rename = "precios_por_tamano",
        deserialize_with = "null_as_default"
    )]
    pub size_prices: BTreeMap<String, Value>,
    #[serde(default, rename = "items", deserialize_with = "deserialize_combo_items")]
    pub combo_items: Vec<ComboItem>,
}

impl Product {
    /// Returns `true` when the add-to-cart flow must collect a size first.
    #[must_use]
    pub fn requires_size(&self) -> bool {
        self.kind
            .as_deref()
            .is_some_and(|kind| SIZED_KINDS.contains(&kind))
            && !self.sizes.is_empty()
    }

    #[must_use]
    pub fn is_combo(&self) -> bool {
        !self.combo_items.is_empty()
    }

    /// Listing-level availability. A missing flag counts as available; the
    /// add-to-cart path never relies on this value.
    #[must_use]
    pub fn is_listed_available(&self) -> bool {
        self.available.unwrap_or(true)
    }

    /// Parsed price table entry for `size`, if present and numeric.
    #[must_use]
    pub fn size_price(&self, size: &str) -> Option<Decimal> {
        self.size_prices.get(size).and_then(parse_price)
    }

    /// Every listed size with the price a shopper would pay for it.
    #[must_use]
    pub fn size_options(&self) -> Vec<(String, Decimal)> {
        self.sizes
            .iter()
            .map(|size| (size.clone(), self.size_price(size).unwrap_or(self.price)))
            .collect()
    }
}

/// One constituent of a combo product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComboItem {
    pub id: ProductId,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(default, rename = "imagen_url")]
    pub image_url: Option<String>,
    #[serde(
        default = "default_quantity",
        rename = "cantidad",
        deserialize_with = "deserialize_quantity"
    )]
    pub quantity: u32,
    #[serde(
        default = "default_available",
        rename = "disponible",
        deserialize_with = "deserialize_item_available"
    )]
    pub available: bool,
}

fn default_quantity() -> u32 {
    1
}

fn default_available() -> bool {
    true
}

/// Reads an upstream availability flag: a JSON bool, `"true"`/`"false"` in
/// any case, or `1`/`0` as a number or string. Anything else is `None`.
#[must_use]
pub fn parse_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::Number(n) => match n.as_u64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(parse_flag(&raw))
}

fn deserialize_item_available<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(deserialize_flag(deserializer)?.unwrap_or(true))
}

/// `cantidad` as a number or numeric string; anything else counts as one.
fn deserialize_quantity<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let quantity = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64().and_then(|q| u32::try_from(q).ok()),
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    };
    Ok(quantity.unwrap_or_else(default_quantity))
}

/// Normalizes a raw `items` value into an ordered list of combo items.
///
/// Arrays keep their order. Objects are ordered by key: numeric keys first in
/// numeric order (so `"10"` follows `"2"`), then any other keys
/// lexicographically. Entries that do not parse as a [`ComboItem`] are
/// skipped; any other JSON shape yields an empty list.
#[must_use]
pub fn normalize_combo_items(value: &Value) -> Vec<ComboItem> {
    match value {
        Value::Array(entries) => entries.iter().filter_map(parse_combo_item).collect(),
        Value::Object(map) => {
            let mut keyed: Vec<(&String, &Value)> = map.iter().collect();
            keyed.sort_by(|(a, _), (b, _)| {
                match (a.parse::<u64>(), b.parse::<u64>()) {
                    (Ok(x), Ok(y)) => x.cmp(&y),
                    (Ok(_), Err(_)) => std::cmp::Ordering::Less,
                    (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
                    (Err(_), Err(_)) => a.cmp(b),
                }
            });
            keyed
                .into_iter()
                .filter_map(|(_, entry)| parse_combo_item(entry))
                .collect()
        }
        _ => Vec::new(),
    }
}

fn parse_combo_item(value: &Value) -> Option<ComboItem> {
    match ComboItem::deserialize(value) {
        Ok(item) => Some(item),
        Err(err) => {
            tracing::warn!(error = %err, "skipping combo item that does not parse");
            None
        }
    }
}

fn deserialize_combo_items<'de, D>(deserializer: D) -> Result<Vec<ComboItem>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(normalize_combo_items(&raw))
}

fn deserialize_ingredients<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    let parts: Vec<String> = match raw {
        Value::String(joined) => joined.split(',').map(str::to_owned).collect(),
        Value::Array(entries) => entries
            .into_iter()
            .filter_map(|entry| match entry {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };
    Ok(parts
        .into_iter()
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
        .collect())
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
#[path = "products_test.rs"]
mod tests;
