//! The four page-level hooks built on [`RemoteResource`].
//!
//! | Hook | Identity | Retry |
//! |------|----------|-------|
//! | [`use_category`] | category id | caller-driven ([`refetch_while_failed`]) |
//! | [`use_products`] | none (whole menu) | self-managed timer |
//! | [`use_category_products`] | category id | single attempt |
//! | [`use_product`] | (category id, product id) | self-managed timer |
//!
//! The category page polls from the outside while the product hooks poll on
//! their own; the category product list never retries and only fetches again
//! when its category changes. Each hook hands pages the
//! `{data, loading, error}` triple through [`HookView`].

use std::sync::Arc;
use std::time::Duration;

use carta_core::{AppConfig, Category, CategoryId, Product, ProductId, ProductKey};
use tokio::sync::watch;

use crate::api::ApiClient;
use crate::resource::{RemoteResource, ResourceOptions, ResourceState, RetryPolicy};

/// What a page renders from a hook.
#[derive(Debug, Clone, PartialEq)]
pub struct HookView<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: bool,
}

impl<T> From<ResourceState<T>> for HookView<T> {
    fn from(state: ResourceState<T>) -> Self {
        let loading = state.is_loading();
        let error = state.is_error();
        Self {
            data: state.into_data(),
            loading,
            error,
        }
    }
}

/// Read-side accessors shared by every hook.
macro_rules! hook_accessors {
    ($hook:ident, $data:ty) => {
        impl $hook {
            #[must_use]
            pub fn view(&self) -> HookView<$data> {
                self.resource.snapshot().into()
            }

            /// Full state, including the failure kind and message.
            #[must_use]
            pub fn state(&self) -> ResourceState<$data> {
                self.resource.snapshot()
            }

            #[must_use]
            pub fn subscribe(&self) -> watch::Receiver<ResourceState<$data>> {
                self.resource.subscribe()
            }

            /// Live retry timers owned by this hook (0 or 1).
            #[must_use]
            pub fn live_timers(&self) -> usize {
                self.resource.live_timers()
            }

            pub async fn wait_settled(&self) -> ResourceState<$data> {
                self.resource.wait_settled().await
            }

            pub async fn wait_for<P>(&self, predicate: P) -> ResourceState<$data>
            where
                P: FnMut(&ResourceState<$data>) -> bool,
            {
                self.resource.wait_for(predicate).await
            }
        }
    };
}

/// Category page hook. Failures are not retried here; see
/// [`refetch_while_failed`].
pub struct CategoryHook {
    resource: RemoteResource<CategoryId, Category>,
}

hook_accessors!(CategoryHook, Category);

impl CategoryHook {
    pub fn set_category(&self, id: Option<CategoryId>) {
        self.resource.observe(id);
    }

    pub fn refetch(&self) {
        self.resource.refetch();
    }

    #[must_use]
    pub fn category_id(&self) -> Option<CategoryId> {
        self.resource.identity()
    }
}

/// Mounts the category-by-id hook.
///
/// Must be called inside a Tokio runtime when `id` is `Some`.
#[must_use]
pub fn use_category(
    api: &Arc<ApiClient>,
    config: &AppConfig,
    id: Option<CategoryId>,
) -> CategoryHook {
    let api = Arc::clone(api);
    let fetch = move |id: CategoryId| {
        let api = Arc::clone(&api);
        async move { api.get_category(&id).await }
    };
    let resource = RemoteResource::new(
        "category",
        fetch,
        ResourceOptions::from_config(config, RetryPolicy::CallerDriven),
    );
    resource.observe(id);
    CategoryHook { resource }
}

/// Page-side polling for [`CategoryHook`]: while the hook is failed, sleep
/// `interval` and refetch. Returns the first settled state that is not a
/// failure.
///
/// Never gives up on its own; wrap it in `tokio::time::timeout` to cap the
/// wait. Dropping the future stops the polling.
pub async fn refetch_while_failed(
    hook: &CategoryHook,
    interval: Duration,
) -> ResourceState<Category> {
    loop {
        let state = hook.wait_settled().await;
        if !state.is_error() {
            return state;
        }
        tokio::time::sleep(interval).await;
        tracing::debug!(category = ?hook.category_id(), "category page retrying");
        hook.refetch();
    }
}

/// Full menu hook.
pub struct ProductsHook {
    resource: RemoteResource<(), Vec<Product>>,
}

hook_accessors!(ProductsHook, Vec<Product>);

impl ProductsHook {
    pub fn refetch(&self) {
        self.resource.refetch();
    }
}

/// Mounts the full product list hook and starts fetching immediately.
///
/// # Panics
///
/// Panics if called outside a Tokio runtime.
#[must_use]
pub fn use_products(api: &Arc<ApiClient>, config: &AppConfig) -> ProductsHook {
    let api = Arc::clone(api);
    let fetch = move |(): ()| {
        let api = Arc::clone(&api);
        async move { api.list_products().await }
    };
    let resource = RemoteResource::new(
        "products",
        fetch,
        ResourceOptions::from_config(config, RetryPolicy::SelfManaged),
    );
    resource.observe(Some(()));
    ProductsHook { resource }
}

/// Product list of one category. One attempt per category; there is no
/// refetch, a new attempt needs a category change.
pub struct CategoryProductsHook {
    resource: RemoteResource<CategoryId, Vec<Product>>,
}

hook_accessors!(CategoryProductsHook, Vec<Product>);

impl CategoryProductsHook {
    pub fn set_category(&self, id: Option<CategoryId>) {
        self.resource.observe(id);
    }
}

/// Mounts the product-list-by-category hook.
///
/// Must be called inside a Tokio runtime when `id` is `Some`.
#[must_use]
pub fn use_category_products(
    api: &Arc<ApiClient>,
    config: &AppConfig,
    id: Option<CategoryId>,
) -> CategoryProductsHook {
    let api = Arc::clone(api);
    let fetch = move |id: CategoryId| {
        let api = Arc::clone(&api);
        async move { api.list_category_products(&id).await }
    };
    let resource = RemoteResource::new(
        "category_products",
        fetch,
        ResourceOptions::from_config(config, RetryPolicy::SingleAttempt),
    );
    resource.observe(id);
    CategoryProductsHook { resource }
}

/// Product detail hook.
pub struct ProductHook {
    resource: RemoteResource<ProductKey, Product>,
}

hook_accessors!(ProductHook, Product);

impl ProductHook {
    /// Re-keys the hook. With either id missing it parks in `Idle`.
    pub fn set_key(&self, category_id: Option<CategoryId>, product_id: Option<ProductId>) {
        self.resource
            .observe(ProductKey::from_parts(category_id, product_id));
    }

    pub fn refetch(&self) {
        self.resource.refetch();
    }

    #[must_use]
    pub fn key(&self) -> Option<ProductKey> {
        self.resource.identity()
    }
}

/// Mounts the product-by-id hook.
///
/// Must be called inside a Tokio runtime when both ids are present.
#[must_use]
pub fn use_product(
    api: &Arc<ApiClient>,
    config: &AppConfig,
    category_id: Option<CategoryId>,
    product_id: Option<ProductId>,
) -> ProductHook {
    let api = Arc::clone(api);
    let fetch = move |key: ProductKey| {
        let api = Arc::clone(&api);
        async move { api.get_product(&key).await }
    };
    let resource = RemoteResource::new(
        "product",
        fetch,
        ResourceOptions::from_config(config, RetryPolicy::SelfManaged),
    );
    let hook = ProductHook { resource };
    hook.set_key(category_id, product_id);
    hook
}
