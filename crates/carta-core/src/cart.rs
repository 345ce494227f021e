use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ids::{CategoryId, ProductId};
use crate::pricing::{normalize_size, resolve_price};
use crate::products::Product;

/// A validated request to append one line to the shopper's cart.
///
/// `unit_price` and `display_name` always come from [`resolve_price`], so a
/// sized line carries the size price and the `"{name} - {size}"` label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLineRequest {
    pub product_id: ProductId,
    pub display_name: String,
    pub unit_price: Decimal,
    pub image_url: Option<String>,
    pub ingredients: Vec<String>,
    pub kind: Option<String>,
    pub category_id: CategoryId,
    pub selected_size: Option<String>,
}

impl CartLineRequest {
    #[must_use]
    pub fn new(product: &Product, category_id: CategoryId, selected_size: Option<&str>) -> Self {
        let selected_size = normalize_size(selected_size);
        let resolved = resolve_price(product, selected_size);
        Self {
            product_id: product.id.clone(),
            display_name: resolved.display_name,
            unit_price: resolved.unit_price,
            image_url: product.image_url.clone(),
            ingredients: product.ingredients.clone(),
            kind: product.kind.clone(),
            category_id,
            selected_size: selected_size.map(str::to_owned),
        }
    }
}
