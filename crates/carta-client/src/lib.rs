//! Data synchronization and add-to-cart guard for the carta storefront.
//!
//! - [`ApiClient`] talks to the upstream REST API, one request per call.
//! - [`RemoteResource`] keeps one remote record in sync with an identity and
//!   recovers from failures by polling through [`RetryScheduler`].
//! - [`hooks`] mounts the four page-level resources.
//! - [`AvailabilityGate`] re-checks a product with the server before a line
//!   reaches the [`CartStore`].

mod api;
mod cart;
mod error;
mod gate;
pub mod hooks;
mod resource;
mod retry;

pub use api::{ApiClient, ProductSource};
pub use cart::{CartLine, CartStore, InMemoryCart};
pub use error::{AddError, ClientError, FailureKind, FetchFailure};
pub use gate::AvailabilityGate;
pub use hooks::HookView;
pub use resource::{Fetch, RemoteResource, ResourceOptions, ResourceState, RetryPolicy};
pub use retry::RetryScheduler;
