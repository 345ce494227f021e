//! Revalidate-before-mutate protocol for add-to-cart.
//!
//! Every add re-reads the canonical product record from the server, even when
//! the product was listed a moment ago; the locally held `disponible` flag is
//! never trusted. Only one add per product may be in flight at a time.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use carta_core::{normalize_size, parse_flag, AppConfig, CartLineRequest, Product, ProductKey};
use serde_json::Value;

use crate::api::{ApiClient, ProductSource};
use crate::cart::CartStore;
use crate::error::{AddError, ClientError};

const GENERIC_VERIFICATION_FAILURE: &str =
    "could not verify product availability, please try again";
const NO_RECORD: &str = "the product could not be found, please refresh the menu";
const NO_CATEGORY: &str = "this product has no category and cannot be verified";

pub struct AvailabilityGate {
    source: Arc<dyn ProductSource>,
    pending: Mutex<HashSet<ProductKey>>,
    timeout: Duration,
}

impl AvailabilityGate {
    /// `timeout` bounds the single revalidation fetch of each attempt.
    #[must_use]
    pub fn new(source: Arc<dyn ProductSource>, timeout: Duration) -> Self {
        Self {
            source,
            pending: Mutex::new(HashSet::new()),
            timeout,
        }
    }

    #[must_use]
    pub fn from_config(api: Arc<ApiClient>, config: &AppConfig) -> Self {
        Self::new(api, config.request_timeout())
    }

    /// Whether an add for `key` is being verified right now. Pages disable
    /// the add control while this is `true`.
    #[must_use]
    pub fn is_pending(&self, key: &ProductKey) -> bool {
        self.lock().contains(key)
    }

    /// Validates an add-to-cart attempt and builds the cart line.
    ///
    /// Steps, in order: size check (no request), per-product pending guard,
    /// exactly one fetch of the canonical record, availability check, price
    /// resolution.
    ///
    /// # Errors
    ///
    /// - [`AddError::SizeRequired`] for a sized product without a size.
    /// - [`AddError::AlreadyPending`] while another add of the same product is
    ///   being verified.
    /// - [`AddError::VerificationFailed`] when the record cannot be fetched or
    ///   has no body; carries the server's message when it sent one.
    /// - [`AddError::Unavailable`] when the fresh record says
    ///   `"disponible": false`.
    pub async fn try_add(
        &self,
        product: &Product,
        selected_size: Option<&str>,
    ) -> Result<CartLineRequest, AddError> {
        let selected_size = normalize_size(selected_size);
        if product.requires_size() && selected_size.is_none() {
            return Err(AddError::SizeRequired);
        }

        let Some(category_id) = product.category_id.clone() else {
            return Err(AddError::VerificationFailed(NO_CATEGORY.to_owned()));
        };
        let key = ProductKey::new(category_id.clone(), product.id.clone());
        let _guard = self.acquire(&key).ok_or(AddError::AlreadyPending)?;

        let record = self
            .revalidate(&key)
            .await
            .map_err(|err| {
                tracing::warn!(product = %key, error = %err, "availability check failed");
                AddError::VerificationFailed(
                    err.server_message()
                        .unwrap_or(GENERIC_VERIFICATION_FAILURE)
                        .to_owned(),
                )
            })?
            .ok_or_else(|| AddError::VerificationFailed(NO_RECORD.to_owned()))?;

        if record.get("disponible").and_then(parse_flag) == Some(false) {
            return Err(AddError::Unavailable);
        }

        Ok(CartLineRequest::new(product, category_id, selected_size))
    }

    /// Runs [`AvailabilityGate::try_add`] and hands the outcome to `cart`:
    /// the line goes to [`CartStore::add_item`], a rejection to
    /// [`CartStore::notify`].
    ///
    /// A duplicate click while the first add is pending is rejected without a
    /// notification; the first attempt will report its own outcome.
    ///
    /// # Errors
    ///
    /// Same as [`AvailabilityGate::try_add`].
    pub async fn add_to_cart(
        &self,
        product: &Product,
        selected_size: Option<&str>,
        cart: &dyn CartStore,
    ) -> Result<CartLineRequest, AddError> {
        match self.try_add(product, selected_size).await {
            Ok(line) => {
                tracing::info!(
                    product_id = %line.product_id,
                    display_name = %line.display_name,
                    unit_price = %line.unit_price,
                    "added to cart"
                );
                cart.add_item(line.clone());
                Ok(line)
            }
            Err(AddError::AlreadyPending) => {
                tracing::debug!(product_id = %product.id, "add already pending");
                Err(AddError::AlreadyPending)
            }
            Err(err) => {
                tracing::info!(product_id = %product.id, reason = %err, "add to cart rejected");
                cart.notify(&err.to_string());
                Err(err)
            }
        }
    }

    async fn revalidate(&self, key: &ProductKey) -> Result<Option<Value>, ClientError> {
        let after_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
        tokio::time::timeout(self.timeout, self.source.fetch_canonical(key))
            .await
            .map_err(|_| ClientError::Timeout { after_ms })?
    }

    fn acquire(&self, key: &ProductKey) -> Option<PendingGuard<'_>> {
        if !self.lock().insert(key.clone()) {
            return None;
        }
        Some(PendingGuard {
            pending: &self.pending,
            key: key.clone(),
        })
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<ProductKey>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Marks a product as pending until dropped.
struct PendingGuard<'a> {
    pending: &'a Mutex<HashSet<ProductKey>>,
    key: ProductKey,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use futures::future::BoxFuture;
    use serde_json::json;
    use tokio::sync::Notify;

    use super::*;
    use crate::cart::InMemoryCart;

    /// Answers every fetch with `record` after `release` is notified (when
    /// set), counting calls.
    struct FakeSource {
        record: Result<Option<Value>, u16>,
        release: Option<Arc<Notify>>,
        calls: AtomicU32,
    }

    impl FakeSource {
        fn answering(record: Option<Value>) -> Self {
            Self {
                record: Ok(record),
                release: None,
                calls: AtomicU32::new(0),
            }
        }
    }

    impl ProductSource for FakeSource {
        fn fetch_canonical<'a>(
            &'a self,
            key: &'a ProductKey,
        ) -> BoxFuture<'a, Result<Option<Value>, ClientError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                if let Some(release) = &self.release {
                    release.notified().await;
                }
                self.record.clone().map_err(|status| ClientError::Status {
                    status,
                    url: format!("http://api.test/{key}"),
                    message: None,
                })
            })
        }
    }

    fn pizza() -> Product {
        serde_json::from_value(json!({
            "id": 9,
            "nombre": "Pizza Hawaiana",
            "precio": 20000,
            "type": "Pizza",
            "grupo_id": 2,
            "disponible": true,
            "tamanos_disponibles": ["Pequeña", "Grande"],
            "precios_por_tamano": {"Grande": 35000, "Pequeña": 22000}
        }))
        .unwrap()
    }

    fn gate(source: &Arc<FakeSource>) -> AvailabilityGate {
        AvailabilityGate::new(
            Arc::clone(source) as Arc<dyn ProductSource>,
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn missing_size_is_rejected_before_any_fetch() {
        let source = Arc::new(FakeSource::answering(Some(json!({"disponible": true}))));
        let result = gate(&source).try_add(&pizza(), None).await;
        assert_eq!(result, Err(AddError::SizeRequired));
        let result = gate(&source).try_add(&pizza(), Some("")).await;
        assert_eq!(result, Err(AddError::SizeRequired));
        let result = gate(&source).try_add(&pizza(), Some("  ")).await;
        assert_eq!(result, Err(AddError::SizeRequired));
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn stale_local_flag_is_ignored_in_favor_of_fresh_record() {
        let mut product = pizza();
        product.available = Some(true);
        let source = Arc::new(FakeSource::answering(Some(json!({"disponible": false}))));
        let cart = InMemoryCart::new();

        let result = gate(&source)
            .add_to_cart(&product, Some("Grande"), &cart)
            .await;

        assert_eq!(result, Err(AddError::Unavailable));
        assert!(cart.is_empty());
        assert_eq!(
            cart.notifications(),
            vec![AddError::Unavailable.to_string()]
        );
    }

    #[tokio::test]
    async fn string_false_flag_in_fresh_record_blocks_the_add() {
        let source = Arc::new(FakeSource::answering(Some(json!({"disponible": "false"}))));
        let result = gate(&source).try_add(&pizza(), Some("Grande")).await;
        assert_eq!(result, Err(AddError::Unavailable));
    }

    #[tokio::test]
    async fn padded_size_is_added_under_the_trimmed_label() {
        let source = Arc::new(FakeSource::answering(Some(json!({"disponible": true}))));
        let line = gate(&source)
            .try_add(&pizza(), Some(" Grande "))
            .await
            .unwrap();
        assert_eq!(line.display_name, "Pizza Hawaiana - Grande");
        assert_eq!(line.selected_size.as_deref(), Some("Grande"));
    }

    #[tokio::test]
    async fn locally_unavailable_product_is_still_checked_with_server() {
        let mut product = pizza();
        product.available = Some(false);
        let source = Arc::new(FakeSource::answering(Some(json!({"id": 9}))));

        let line = gate(&source)
            .try_add(&product, Some("Pequeña"))
            .await
            .unwrap();

        assert_eq!(line.display_name, "Pizza Hawaiana - Pequeña");
        assert_eq!(line.unit_price, rust_decimal::Decimal::from(22_000));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_record_fails_verification() {
        let source = Arc::new(FakeSource::answering(None));
        let result = gate(&source).try_add(&pizza(), Some("Grande")).await;
        assert!(matches!(result, Err(AddError::VerificationFailed(_))));
    }

    #[tokio::test]
    async fn server_error_without_message_uses_generic_text() {
        let source = Arc::new(FakeSource {
            record: Err(500),
            release: None,
            calls: AtomicU32::new(0),
        });
        let result = gate(&source).try_add(&pizza(), Some("Grande")).await;
        assert_eq!(
            result,
            Err(AddError::VerificationFailed(
                GENERIC_VERIFICATION_FAILURE.to_owned()
            ))
        );
    }

    #[tokio::test]
    async fn product_without_category_cannot_be_verified() {
        let mut product = pizza();
        product.category_id = None;
        let source = Arc::new(FakeSource::answering(Some(json!({}))));
        let result = gate(&source).try_add(&product, Some("Grande")).await;
        assert!(matches!(result, Err(AddError::VerificationFailed(_))));
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn second_add_while_pending_is_rejected_without_notification() {
        let release = Arc::new(Notify::new());
        let source = Arc::new(FakeSource {
            record: Ok(Some(json!({"disponible": true}))),
            release: Some(Arc::clone(&release)),
            calls: AtomicU32::new(0),
        });
        let gate = gate(&source);
        let cart = InMemoryCart::new();
        let product = pizza();
        let key = ProductKey::new("2".into(), "9".into());

        let first = gate.add_to_cart(&product, Some("Grande"), &cart);
        let second = async {
            tokio::task::yield_now().await;
            assert!(gate.is_pending(&key));
            let result = gate.add_to_cart(&product, Some("Grande"), &cart).await;
            release.notify_one();
            result
        };
        let (first, second) = tokio::join!(first, second);

        assert!(first.is_ok());
        assert_eq!(second, Err(AddError::AlreadyPending));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cart.lines().len(), 1);
        assert!(cart.notifications().is_empty());
        assert!(!gate.is_pending(&key));
    }

    #[tokio::test(start_paused = true)]
    async fn hung_revalidation_times_out() {
        let source = Arc::new(FakeSource {
            record: Ok(Some(json!({}))),
            release: Some(Arc::new(Notify::new())),
            calls: AtomicU32::new(0),
        });
        let gate = gate(&source);
        let result = gate.try_add(&pizza(), Some("Grande")).await;
        assert_eq!(
            result,
            Err(AddError::VerificationFailed(
                GENERIC_VERIFICATION_FAILURE.to_owned()
            ))
        );
        assert!(!gate.is_pending(&ProductKey::new("2".into(), "9".into())));
    }
}
