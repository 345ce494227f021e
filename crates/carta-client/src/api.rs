//! HTTP client for the storefront REST API.
//!
//! Every method issues exactly one request. Recovering from failures is the
//! job of [`crate::RemoteResource`] and its retry timer, not of the
//! transport.

use std::time::Duration;

use carta_core::{AppConfig, Category, CategoryId, Product, ProductKey};
use futures::future::BoxFuture;
use reqwest::{Client, Url};
use serde_json::Value;

use crate::error::ClientError;

/// Client for the storefront REST API.
///
/// Use [`ApiClient::new`] with the loaded [`AppConfig`], or
/// [`ApiClient::with_base_url`] to point at a mock server in tests.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Creates a client from the application configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`ClientError::InvalidBaseUrl`] if
    /// `api_base_url` is not usable as a base.
    pub fn new(config: &AppConfig) -> Result<Self, ClientError> {
        Self::with_base_url(
            &config.api_base_url,
            config.request_timeout_secs,
            config.connect_timeout_secs,
            &config.user_agent,
        )
    }

    /// Creates a client with an explicit base URL and timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`ClientError::InvalidBaseUrl`] if
    /// `base_url` does not parse or cannot carry path segments.
    pub fn with_base_url(
        base_url: &str,
        timeout_secs: u64,
        connect_timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .user_agent(user_agent)
            .build()?;

        // Exactly one trailing slash so appended segments land under the
        // configured prefix (`/api/categorias`, not `/categorias`).
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let parsed = Url::parse(&normalised).map_err(|e| ClientError::InvalidBaseUrl {
            base_url: base_url.to_owned(),
            reason: e.to_string(),
        })?;
        if parsed.cannot_be_a_base() {
            return Err(ClientError::InvalidBaseUrl {
                base_url: base_url.to_owned(),
                reason: "URL cannot be used as a base".to_owned(),
            });
        }

        Ok(Self {
            client,
            base_url: parsed,
        })
    }

    /// `GET /categorias`
    ///
    /// # Errors
    ///
    /// - [`ClientError::Http`] on network failure.
    /// - [`ClientError::Status`] on a non-2xx status.
    /// - [`ClientError::Deserialize`] if the body is not a list of categories.
    pub async fn list_categories(&self) -> Result<Vec<Category>, ClientError> {
        let url = self.endpoint(&["categorias"]);
        self.fetch_list(&url).await
    }

    /// `GET /categorias/{id}`
    ///
    /// # Errors
    ///
    /// Same as [`ApiClient::list_categories`], plus [`ClientError::EmptyBody`]
    /// when the server answers 2xx without a record.
    pub async fn get_category(&self, id: &CategoryId) -> Result<Category, ClientError> {
        let url = self.endpoint(&["categorias", id.as_str()]);
        self.fetch_record(&url).await
    }

    /// `GET /productos`, the full menu.
    ///
    /// # Errors
    ///
    /// Same as [`ApiClient::list_categories`].
    pub async fn list_products(&self) -> Result<Vec<Product>, ClientError> {
        let url = self.endpoint(&["productos"]);
        self.fetch_list(&url).await
    }

    /// `GET /categorias/{id}/productos`
    ///
    /// Products that omit their category are stamped with `id`.
    ///
    /// # Errors
    ///
    /// Same as [`ApiClient::list_categories`].
    pub async fn list_category_products(
        &self,
        id: &CategoryId,
    ) -> Result<Vec<Product>, ClientError> {
        let url = self.endpoint(&["categorias", id.as_str(), "productos"]);
        let mut products: Vec<Product> = self.fetch_list(&url).await?;
        for product in &mut products {
            product.category_id.get_or_insert_with(|| id.clone());
        }
        Ok(products)
    }

    /// `GET /categorias/{categoriaId}/productos/{id}`, decoded.
    ///
    /// The returned product always carries `key.category_id` when the record
    /// itself omits it.
    ///
    /// # Errors
    ///
    /// Same as [`ApiClient::get_category`].
    pub async fn get_product(&self, key: &ProductKey) -> Result<Product, ClientError> {
        let url = self.product_url(key);
        let mut product: Product = self.fetch_record(&url).await?;
        product.category_id.get_or_insert_with(|| key.category_id.clone());
        Ok(product)
    }

    /// `GET /categorias/{categoriaId}/productos/{id}`, raw.
    ///
    /// Returns `Ok(None)` when the server answers 2xx with an empty body or
    /// JSON `null`. The body is not forced into [`Product`] so that partial
    /// records (e.g. `{"disponible": false}`) can still be inspected.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Http`] on network failure.
    /// - [`ClientError::Status`] on a non-2xx status.
    /// - [`ClientError::Deserialize`] if the body is not JSON.
    pub async fn get_product_record(&self, key: &ProductKey) -> Result<Option<Value>, ClientError> {
        let url = self.product_url(key);
        self.request_json(&url).await
    }

    fn product_url(&self, key: &ProductKey) -> Url {
        self.endpoint(&[
            "categorias",
            key.category_id.as_str(),
            "productos",
            key.product_id.as_str(),
        ])
    }

    /// Appends percent-encoded path segments to the base URL.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // with_base_url rejects cannot-be-a-base URLs, so this always succeeds.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn fetch_list<T>(&self, url: &Url) -> Result<Vec<T>, ClientError>
    where
        T: serde::de::DeserializeOwned,
    {
        match self.request_json(url).await? {
            Some(body) => decode(body, url),
            None => Ok(Vec::new()),
        }
    }

    async fn fetch_record<T>(&self, url: &Url) -> Result<T, ClientError>
    where
        T: serde::de::DeserializeOwned,
    {
        match self.request_json(url).await? {
            Some(body) => decode(body, url),
            None => Err(ClientError::EmptyBody {
                context: format!("GET {}", url.path()),
            }),
        }
    }

    /// Sends a GET request and parses the body as JSON.
    ///
    /// An empty body or a literal `null` yields `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] on network failure,
    /// [`ClientError::Status`] on a non-2xx status, and
    /// [`ClientError::Deserialize`] if the body is not valid JSON.
    async fn request_json(&self, url: &Url) -> Result<Option<Value>, ClientError> {
        tracing::debug!(url = %url, "storefront GET");
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                url: url.to_string(),
                message: extract_error_message(&body),
            });
        }

        if body.trim().is_empty() {
            return Ok(None);
        }
        let value: Value = serde_json::from_str(&body).map_err(|e| ClientError::Deserialize {
            context: format!("GET {}", url.path()),
            source: e,
        })?;
        Ok((!value.is_null()).then_some(value))
    }
}

fn decode<T>(body: Value, url: &Url) -> Result<T, ClientError>
where
    T: serde::de::DeserializeOwned,
{
    serde_json::from_value(body).map_err(|e| ClientError::Deserialize {
        context: format!("GET {}", url.path()),
        source: e,
    })
}

/// Pulls a human-readable message out of an error body such as
/// `{"message": "..."}`, `{"error": "..."}` or `{"mensaje": "..."}`.
fn extract_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["message", "error", "mensaje"]
        .iter()
        .find_map(|field| value.get(*field).and_then(Value::as_str))
        .map(str::trim)
        .filter(|msg| !msg.is_empty())
        .map(str::to_owned)
}

/// Source of canonical product records for revalidation.
///
/// [`ApiClient`] is the production implementation; the seam exists so the
/// availability gate can be exercised without a network.
pub trait ProductSource: Send + Sync {
    fn fetch_canonical<'a>(
        &'a self,
        key: &'a ProductKey,
    ) -> BoxFuture<'a, Result<Option<Value>, ClientError>>;
}

impl ProductSource for ApiClient {
    fn fetch_canonical<'a>(
        &'a self,
        key: &'a ProductKey,
    ) -> BoxFuture<'a, Result<Option<Value>, ClientError>> {
        Box::pin(self.get_product_record(key))
    }
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
