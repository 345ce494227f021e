mod display;
mod pages;

use std::sync::Arc;

use carta_client::ApiClient;
use carta_core::{CategoryId, ProductId};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

const DEFAULT_WAIT_SECS: &str = "30";

#[derive(Debug, Parser)]
#[command(name = "carta")]
#[command(about = "Carta storefront command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List menu categories
    Categories,
    /// Show a category and its products
    Category {
        id: String,
        /// Give up retrying after this many seconds
        #[arg(long, default_value = DEFAULT_WAIT_SECS)]
        wait_secs: u64,
    },
    /// Show the full menu
    Menu {
        /// Give up retrying after this many seconds
        #[arg(long, default_value = DEFAULT_WAIT_SECS)]
        wait_secs: u64,
    },
    /// List the products of one category (single attempt)
    Products { category_id: String },
    /// Show a product with its sizes, prices and combo contents
    Product {
        category_id: String,
        product_id: String,
        /// Give up retrying after this many seconds
        #[arg(long, default_value = DEFAULT_WAIT_SECS)]
        wait_secs: u64,
    },
    /// Verify a product with the server and add it to a cart
    Add {
        category_id: String,
        product_id: String,
        /// Size label, required for sized products (e.g. "Grande")
        #[arg(long)]
        size: Option<String>,
        /// Give up loading the product after this many seconds
        #[arg(long, default_value = DEFAULT_WAIT_SECS)]
        wait_secs: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = carta_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::debug!(env = %config.env, base_url = %config.api_base_url, "config loaded");
    let api = Arc::new(ApiClient::new(&config)?);

    match cli.command {
        Commands::Categories => pages::run_categories(&api).await?,
        Commands::Category { id, wait_secs } => {
            pages::run_category(&api, &config, CategoryId::from(id), wait_secs).await?;
        }
        Commands::Menu { wait_secs } => pages::run_menu(&api, &config, wait_secs).await?,
        Commands::Products { category_id } => {
            pages::run_products(&api, &config, CategoryId::from(category_id)).await?;
        }
        Commands::Product {
            category_id,
            product_id,
            wait_secs,
        } => {
            pages::run_product(
                &api,
                &config,
                CategoryId::from(category_id),
                ProductId::from(product_id),
                wait_secs,
            )
            .await?;
        }
        Commands::Add {
            category_id,
            product_id,
            size,
            wait_secs,
        } => {
            pages::run_add(
                &api,
                &config,
                CategoryId::from(category_id),
                ProductId::from(product_id),
                size,
                wait_secs,
            )
            .await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests;
