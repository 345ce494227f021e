//! Command handlers. Each one mounts the hooks a storefront page would,
//! waits for them to settle and prints the result.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use carta_client::hooks::{
    refetch_while_failed, use_category, use_category_products, use_product, use_products,
};
use carta_client::{ApiClient, AvailabilityGate, InMemoryCart};
use carta_core::{AppConfig, CategoryId, ProductId};

use crate::display::{format_cop, print_categories, print_product_detail, print_product_table};

/// Waits for `fut` up to `wait_secs`, then gives up with `what` in the error.
async fn within<T>(
    wait_secs: u64,
    what: &str,
    fut: impl Future<Output = T>,
) -> anyhow::Result<T> {
    tokio::time::timeout(Duration::from_secs(wait_secs), fut)
        .await
        .with_context(|| format!("{what} still unavailable after {wait_secs}s of retrying"))
}

/// List all categories. A plain one-shot request.
///
/// # Errors
///
/// Returns an error if the request fails.
pub(crate) async fn run_categories(api: &ApiClient) -> anyhow::Result<()> {
    let categories = api
        .list_categories()
        .await
        .context("failed to load categories")?;
    print_categories(&categories);
    Ok(())
}

/// Category page: the category record, retried by this page on the
/// configured interval, followed by the category's product list (one
/// attempt).
///
/// # Errors
///
/// Returns an error if the category does not load within `wait_secs`.
pub(crate) async fn run_category(
    api: &Arc<ApiClient>,
    config: &AppConfig,
    id: CategoryId,
    wait_secs: u64,
) -> anyhow::Result<()> {
    let category_hook = use_category(api, config, Some(id.clone()));
    let products_hook = use_category_products(api, config, Some(id.clone()));

    let state = within(
        wait_secs,
        &format!("category {id}"),
        refetch_while_failed(&category_hook, config.retry_interval()),
    )
    .await?;
    let category = state
        .into_data()
        .with_context(|| format!("category {id} has no record"))?;

    println!("{}", category.name);
    if let Some(description) = &category.description {
        println!("{description}");
    }
    println!();

    let listing = products_hook.wait_settled().await;
    match listing.data() {
        Some(products) => print_product_table(products),
        None => println!("products could not be loaded; reopen the category to try again"),
    }
    Ok(())
}

/// Full menu, self-retrying until it loads or `wait_secs` passes.
///
/// # Errors
///
/// Returns an error if the menu does not load within `wait_secs`.
pub(crate) async fn run_menu(
    api: &Arc<ApiClient>,
    config: &AppConfig,
    wait_secs: u64,
) -> anyhow::Result<()> {
    let menu = use_products(api, config);
    let state = within(wait_secs, "menu", menu.wait_for(|s| s.data().is_some())).await?;
    if let Some(products) = state.data() {
        print_product_table(products);
    }
    Ok(())
}

/// Products of one category. Single attempt, no retry.
///
/// # Errors
///
/// Returns an error if the single attempt fails.
pub(crate) async fn run_products(
    api: &Arc<ApiClient>,
    config: &AppConfig,
    category_id: CategoryId,
) -> anyhow::Result<()> {
    let hook = use_category_products(api, config, Some(category_id.clone()));
    let state = hook.wait_settled().await;
    if let Some(failure) = state.failure() {
        anyhow::bail!(
            "products of category {category_id} could not be loaded ({:?}): {}",
            failure.kind,
            failure.message.as_deref().unwrap_or("no details")
        );
    }
    if let Some(products) = state.data() {
        print_product_table(products);
    }
    Ok(())
}

/// Product detail page.
///
/// # Errors
///
/// Returns an error if the product does not load within `wait_secs`.
pub(crate) async fn run_product(
    api: &Arc<ApiClient>,
    config: &AppConfig,
    category_id: CategoryId,
    product_id: ProductId,
    wait_secs: u64,
) -> anyhow::Result<()> {
    let hook = use_product(api, config, Some(category_id), Some(product_id.clone()));
    let state = within(
        wait_secs,
        &format!("product {product_id}"),
        hook.wait_for(|s| s.data().is_some()),
    )
    .await?;
    if let Some(product) = state.data() {
        print_product_detail(product);
    }
    Ok(())
}

/// Loads a product detail page and presses "add to cart" on it.
///
/// # Errors
///
/// Returns an error if the product does not load or the add is rejected.
pub(crate) async fn run_add(
    api: &Arc<ApiClient>,
    config: &AppConfig,
    category_id: CategoryId,
    product_id: ProductId,
    size: Option<String>,
    wait_secs: u64,
) -> anyhow::Result<()> {
    let hook = use_product(api, config, Some(category_id), Some(product_id.clone()));
    let product = within(
        wait_secs,
        &format!("product {product_id}"),
        hook.wait_for(|s| s.data().is_some()),
    )
    .await?
    .into_data()
    .with_context(|| format!("product {product_id} has no record"))?;

    let gate = AvailabilityGate::from_config(Arc::clone(api), config);
    let cart = InMemoryCart::new();
    let outcome = gate.add_to_cart(&product, size.as_deref(), &cart).await;

    for note in cart.notifications() {
        eprintln!("! {note}");
    }
    let line = outcome.context("item was not added to the cart")?;

    println!("added: {}  {}", line.display_name, format_cop(line.unit_price));
    println!("cart total: {}", format_cop(cart.total()));
    Ok(())
}
