//! Domain model and configuration for the carta storefront client.
//!
//! Everything here is pure data: categories, products, combo compositions,
//! size-based price resolution, and the cart line request handed to the
//! cart store. Network access lives in `carta-client`.

mod app_config;
mod cart;
mod config;
mod ids;
mod pricing;
mod products;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use cart::CartLineRequest;
pub use config::{load_app_config, load_app_config_from_env};
pub use ids::{CategoryId, ProductId, ProductKey};
pub use pricing::{normalize_size, parse_price, resolve_price, ResolvedPrice};
pub use products::{
    normalize_combo_items, parse_flag, Category, ComboItem, Product, SIZED_KINDS,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
