//! Store contracts.
//!
//! The engine assumes a document store offering atomic single-document
//! update-with-filter semantics. These traits spell out exactly which
//! operations it relies on; [`crate::MemoryStore`] and the server's
//! PostgreSQL store implement them.
//!
//! Every method is atomic on its own. Nothing here offers multi-document
//! transactions: the reservation engine composes these calls and
//! compensates on failure instead.

use crate::error::StoreResult;
use crate::{Cart, CartLine, CustomerId, Order, OrderStatus, Product, SleepMode, Timestamp};
use async_trait::async_trait;
use std::sync::Arc;

/// Products and their variant stock.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Get a product by ID.
    async fn product(&self, id: &str) -> StoreResult<Option<Product>>;

    /// All products, ordered by category then name.
    async fn products(&self) -> StoreResult<Vec<Product>>;

    /// Products in one category.
    async fn products_in_category(&self, category: &str) -> StoreResult<Vec<Product>>;

    /// Distinct categories, sorted.
    async fn categories(&self) -> StoreResult<Vec<String>>;

    /// Insert a product or replace its catalog data.
    ///
    /// For an existing product, stock of variants that survive the edit is
    /// kept as stored; only new variants take the given quantity.
    async fn upsert_product(&self, product: &Product) -> StoreResult<()>;

    /// Delete a product. Returns whether it existed.
    async fn delete_product(&self, id: &str) -> StoreResult<bool>;

    /// Atomically add `delta` (may be negative) to one variant's stock.
    ///
    /// Matches on product ID and variant name and touches only that count.
    /// Returns the stock after the update, or `None` when nothing matched.
    async fn adjust_stock(
        &self,
        product_id: &str,
        flavor: &str,
        delta: i64,
    ) -> StoreResult<Option<i64>>;

    /// Current stock of one variant.
    async fn variant_stock(&self, product_id: &str, flavor: &str) -> StoreResult<Option<i64>>;
}

/// Per-customer carts.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Load a customer's cart; an unknown customer has an empty cart.
    async fn load_cart(&self, customer_id: CustomerId) -> StoreResult<Cart>;

    /// Write a cart, creating the customer record on first use.
    async fn save_cart(&self, cart: &Cart) -> StoreResult<()>;

    /// Carts whose expiry is set and strictly before `now`.
    async fn expired_carts(&self, now: Timestamp) -> StoreResult<Vec<Cart>>;

    /// All known customer IDs.
    async fn customers(&self) -> StoreResult<Vec<CustomerId>>;
}

/// Placed orders.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persist a new `pending` order and return it with its assigned ID.
    async fn create_order(
        &self,
        customer_id: CustomerId,
        items: Vec<CartLine>,
        now: Timestamp,
    ) -> StoreResult<Order>;

    /// Get an order by ID.
    async fn order(&self, id: &str) -> StoreResult<Option<Order>>;

    /// A customer's orders, newest first.
    async fn orders_for_customer(&self, customer_id: CustomerId) -> StoreResult<Vec<Order>>;

    /// Orders in any of the given statuses, oldest first.
    async fn orders_with_status(&self, statuses: &[OrderStatus]) -> StoreResult<Vec<Order>>;

    /// Count of orders in any of the given statuses.
    async fn count_orders(&self, statuses: &[OrderStatus]) -> StoreResult<u64>;

    /// Move an order from `from` to `to` only if it is still in `from`.
    ///
    /// Returns whether the update matched.
    async fn transition_order(
        &self,
        id: &str,
        from: OrderStatus,
        to: OrderStatus,
    ) -> StoreResult<bool>;

    /// Pending orders created strictly before `before`.
    async fn pending_orders_before(&self, before: Timestamp) -> StoreResult<Vec<Order>>;
}

/// The operational-mode singleton.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Read the record; a store that never wrote it returns the initial one.
    async fn sleep_mode(&self) -> StoreResult<SleepMode>;

    /// Write the record if its version is still `expected_version`.
    ///
    /// Returns whether the write happened.
    async fn update_sleep_mode(
        &self,
        expected_version: u64,
        enabled: bool,
        end_time: Option<String>,
    ) -> StoreResult<bool>;
}

/// Everything the engine needs from the shared store.
pub trait ShopStore: InventoryStore + CartStore + OrderStore + SettingsStore {}

impl<T> ShopStore for T where T: InventoryStore + CartStore + OrderStore + SettingsStore {}

/// Store handle shared by every engine component.
pub type SharedStore = Arc<dyn ShopStore>;
