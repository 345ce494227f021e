//! The cart store as seen from the add-to-cart path.
//!
//! The gate only appends validated lines and raises notifications; it never
//! reads the cart back. [`InMemoryCart`] is a process-local store for the CLI
//! and tests.

use std::sync::{Mutex, MutexGuard, PoisonError};

use carta_core::CartLineRequest;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Collaborator contract for the shopper's cart.
pub trait CartStore: Send + Sync {
    fn add_item(&self, line: CartLineRequest);

    /// Shows `message` to the shopper.
    fn notify(&self, message: &str);
}

#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub line_id: Uuid,
    pub added_at: DateTime<Utc>,
    pub request: CartLineRequest,
}

#[derive(Debug, Default)]
pub struct InMemoryCart {
    lines: Mutex<Vec<CartLine>>,
    notifications: Mutex<Vec<String>>,
}

impl InMemoryCart {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn lines(&self) -> Vec<CartLine> {
        lock(&self.lines).clone()
    }

    #[must_use]
    pub fn notifications(&self) -> Vec<String> {
        lock(&self.notifications).clone()
    }

    /// Sum of unit prices over all lines.
    #[must_use]
    pub fn total(&self) -> Decimal {
        lock(&self.lines)
            .iter()
            .map(|line| line.request.unit_price)
            .sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        lock(&self.lines).is_empty()
    }
}

impl CartStore for InMemoryCart {
    fn add_item(&self, line: CartLineRequest) {
        let line = CartLine {
            line_id: Uuid::new_v4(),
            added_at: Utc::now(),
            request: line,
        };
        tracing::debug!(
            line_id = %line.line_id,
            product_id = %line.request.product_id,
            "cart line appended"
        );
        lock(&self.lines).push(line);
    }

    fn notify(&self, message: &str) {
        lock(&self.notifications).push(message.to_owned());
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
