//! In-memory store.
//!
//! Holds every collection behind a single mutex, which makes each trait
//! method trivially atomic. Used by the tests, the benchmarks and any
//! deployment that does not need durability.

use crate::error::StoreResult;
use crate::settings::SleepMode;
use crate::store::{CartStore, InventoryStore, OrderStore, SettingsStore};
use crate::{
    Cart, CartLine, CustomerId, Order, OrderStatus, Product, ProductId, StoreError, Timestamp,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Default)]
struct State {
    products: HashMap<ProductId, Product>,
    carts: HashMap<CustomerId, Cart>,
    orders: Vec<Order>,
    next_order: u64,
    sleep_mode: SleepMode,
}

/// Planned failures for one kind of write: let `skip` calls through, then
/// fail the next `fail` calls.
#[derive(Debug, Default)]
struct Faults {
    skip: usize,
    fail: usize,
}

/// Thread-safe in-memory implementation of every store contract.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    cart_faults: Mutex<Faults>,
    stock_faults: Mutex<Faults>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` cart writes fail with [`StoreError::Unavailable`].
    ///
    /// Lets callers exercise the compensation paths of the engine.
    pub fn fail_cart_writes(&self, n: usize) {
        *self.cart_faults.lock() = Faults { skip: 0, fail: n };
    }

    /// Make the next `n` stock adjustments fail with [`StoreError::Unavailable`].
    pub fn fail_stock_adjustments(&self, n: usize) {
        self.fail_stock_adjustments_after(0, n);
    }

    /// Let `skip` stock adjustments succeed, then fail the next `n`.
    pub fn fail_stock_adjustments_after(&self, skip: usize, n: usize) {
        *self.stock_faults.lock() = Faults { skip, fail: n };
    }

    /// Number of orders held, in any status.
    pub fn order_count(&self) -> usize {
        self.state.lock().orders.len()
    }

    fn injected(faults: &Mutex<Faults>, what: &str) -> StoreResult<()> {
        let mut faults = faults.lock();
        if faults.skip > 0 {
            faults.skip -= 1;
            return Ok(());
        }
        if faults.fail > 0 {
            faults.fail -= 1;
            return Err(StoreError::Unavailable(format!("injected {what} failure")));
        }
        Ok(())
    }
}

fn sorted(mut products: Vec<Product>) -> Vec<Product> {
    products.sort_by(|a, b| a.category.cmp(&b.category).then_with(|| a.name.cmp(&b.name)));
    products
}

#[async_trait]
impl InventoryStore for MemoryStore {
    async fn product(&self, id: &str) -> StoreResult<Option<Product>> {
        Ok(self.state.lock().products.get(id).cloned())
    }

    async fn products(&self) -> StoreResult<Vec<Product>> {
        let products = self.state.lock().products.values().cloned().collect();
        Ok(sorted(products))
    }

    async fn products_in_category(&self, category: &str) -> StoreResult<Vec<Product>> {
        let products = self
            .state
            .lock()
            .products
            .values()
            .filter(|p| p.category == category)
            .cloned()
            .collect();
        Ok(sorted(products))
    }

    async fn categories(&self) -> StoreResult<Vec<String>> {
        let categories: BTreeSet<String> = self
            .state
            .lock()
            .products
            .values()
            .map(|p| p.category.clone())
            .collect();
        Ok(categories.into_iter().collect())
    }

    async fn upsert_product(&self, product: &Product) -> StoreResult<()> {
        let mut state = self.state.lock();
        let mut incoming = product.clone();

        if let Some(existing) = state.products.get(&product.id) {
            for variant in &mut incoming.flavors {
                if let Some(current) = existing.variant(&variant.name) {
                    variant.quantity = current.quantity;
                }
            }
        }

        state.products.insert(incoming.id.clone(), incoming);
        Ok(())
    }

    async fn delete_product(&self, id: &str) -> StoreResult<bool> {
        Ok(self.state.lock().products.remove(id).is_some())
    }

    async fn adjust_stock(
        &self,
        product_id: &str,
        flavor: &str,
        delta: i64,
    ) -> StoreResult<Option<i64>> {
        Self::injected(&self.stock_faults, "stock adjustment")?;

        let mut state = self.state.lock();
        let variant = state
            .products
            .get_mut(product_id)
            .and_then(|p| p.flavors.iter_mut().find(|v| v.name == flavor));

        Ok(variant.map(|v| {
            v.quantity += delta;
            v.quantity
        }))
    }

    async fn variant_stock(&self, product_id: &str, flavor: &str) -> StoreResult<Option<i64>> {
        Ok(self
            .state
            .lock()
            .products
            .get(product_id)
            .and_then(|p| p.variant(flavor))
            .map(|v| v.quantity))
    }
}

#[async_trait]
impl CartStore for MemoryStore {
    async fn load_cart(&self, customer_id: CustomerId) -> StoreResult<Cart> {
        Ok(self
            .state
            .lock()
            .carts
            .get(&customer_id)
            .cloned()
            .unwrap_or_else(|| Cart::empty(customer_id)))
    }

    async fn save_cart(&self, cart: &Cart) -> StoreResult<()> {
        Self::injected(&self.cart_faults, "cart write")?;
        self.state.lock().carts.insert(cart.customer_id, cart.clone());
        Ok(())
    }

    async fn expired_carts(&self, now: Timestamp) -> StoreResult<Vec<Cart>> {
        let mut carts: Vec<Cart> = self
            .state
            .lock()
            .carts
            .values()
            .filter(|c| c.is_expired(now))
            .cloned()
            .collect();
        carts.sort_by_key(|c| c.customer_id);
        Ok(carts)
    }

    async fn customers(&self) -> StoreResult<Vec<CustomerId>> {
        let mut ids: Vec<CustomerId> = self.state.lock().carts.keys().copied().collect();
        ids.sort_unstable();
        Ok(ids)
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn create_order(
        &self,
        customer_id: CustomerId,
        items: Vec<CartLine>,
        now: Timestamp,
    ) -> StoreResult<Order> {
        let mut state = self.state.lock();
        state.next_order += 1;

        let order = Order {
            id: format!("order-{}", state.next_order),
            customer_id,
            items,
            status: OrderStatus::Pending,
            created_at: now,
        };
        state.orders.push(order.clone());
        Ok(order)
    }

    async fn order(&self, id: &str) -> StoreResult<Option<Order>> {
        Ok(self.state.lock().orders.iter().find(|o| o.id == id).cloned())
    }

    async fn orders_for_customer(&self, customer_id: CustomerId) -> StoreResult<Vec<Order>> {
        Ok(self
            .state
            .lock()
            .orders
            .iter()
            .rev()
            .filter(|o| o.customer_id == customer_id)
            .cloned()
            .collect())
    }

    async fn orders_with_status(&self, statuses: &[OrderStatus]) -> StoreResult<Vec<Order>> {
        Ok(self
            .state
            .lock()
            .orders
            .iter()
            .filter(|o| statuses.contains(&o.status))
            .cloned()
            .collect())
    }

    async fn count_orders(&self, statuses: &[OrderStatus]) -> StoreResult<u64> {
        let count = self
            .state
            .lock()
            .orders
            .iter()
            .filter(|o| statuses.contains(&o.status))
            .count();
        Ok(count as u64)
    }

    async fn transition_order(
        &self,
        id: &str,
        from: OrderStatus,
        to: OrderStatus,
    ) -> StoreResult<bool> {
        let mut state = self.state.lock();
        match state
            .orders
            .iter_mut()
            .find(|o| o.id == id && o.status == from)
        {
            Some(order) => {
                order.status = to;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn pending_orders_before(&self, before: Timestamp) -> StoreResult<Vec<Order>> {
        Ok(self
            .state
            .lock()
            .orders
            .iter()
            .filter(|o| o.status == OrderStatus::Pending && o.created_at < before)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn sleep_mode(&self) -> StoreResult<SleepMode> {
        Ok(self.state.lock().sleep_mode.clone())
    }

    async fn update_sleep_mode(
        &self,
        expected_version: u64,
        enabled: bool,
        end_time: Option<String>,
    ) -> StoreResult<bool> {
        let mut state = self.state.lock();
        if state.sleep_mode.version != expected_version {
            return Ok(false);
        }

        state.sleep_mode = SleepMode {
            enabled,
            end_time,
            version: expected_version + 1,
        };
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Variant;

    fn pod() -> Product {
        Product::new(
            "pod-1",
            "Pod",
            1500,
            "pods",
            vec![Variant::new("Mint", 2), Variant::new("Menthol", 1)],
        )
    }

    #[tokio::test]
    async fn adjust_stock_matches_product_and_variant() {
        let store = MemoryStore::new();
        store.upsert_product(&pod()).await.unwrap();

        assert_eq!(store.adjust_stock("pod-1", "Mint", -1).await.unwrap(), Some(1));
        assert_eq!(store.adjust_stock("pod-1", "Mint", -2).await.unwrap(), Some(-1));
        assert_eq!(store.variant_stock("pod-1", "Menthol").await.unwrap(), Some(1));

        assert_eq!(store.adjust_stock("pod-1", "Grape", 1).await.unwrap(), None);
        assert_eq!(store.adjust_stock("pod-9", "Mint", 1).await.unwrap(), None);
    }

    #[tokio::test]
    async fn upsert_keeps_stock_of_surviving_variants() {
        let store = MemoryStore::new();
        store.upsert_product(&pod()).await.unwrap();
        store.adjust_stock("pod-1", "Mint", -1).await.unwrap();

        let mut edited = pod();
        edited.price = 1800;
        edited.flavors = vec![Variant::new("Mint", 50), Variant::new("Grape", 4)];
        store.upsert_product(&edited).await.unwrap();

        let stored = store.product("pod-1").await.unwrap().unwrap();
        assert_eq!(stored.price, 1800);
        assert_eq!(stored.variant("Mint").unwrap().quantity, 1);
        assert_eq!(stored.variant("Grape").unwrap().quantity, 4);
        assert!(stored.variant("Menthol").is_none());
    }

    #[tokio::test]
    async fn unknown_customer_has_empty_cart() {
        let store = MemoryStore::new();
        let cart = store.load_cart(5).await.unwrap();
        assert!(cart.is_empty());
        assert!(store.customers().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn injected_cart_failure_trips_once() {
        let store = MemoryStore::new();
        store.fail_cart_writes(1);

        let cart = Cart::empty(5);
        assert!(store.save_cart(&cart).await.is_err());
        assert!(store.save_cart(&cart).await.is_ok());
        assert_eq!(store.customers().await.unwrap(), vec![5]);
    }

    #[tokio::test]
    async fn transition_is_conditional() {
        let store = MemoryStore::new();
        let order = store.create_order(1, vec![], 1000).await.unwrap();

        assert!(store
            .transition_order(&order.id, OrderStatus::Pending, OrderStatus::Confirmed)
            .await
            .unwrap());
        assert!(!store
            .transition_order(&order.id, OrderStatus::Pending, OrderStatus::Cancelled)
            .await
            .unwrap());
        assert_eq!(store.count_orders(&OrderStatus::OPEN).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn sleep_mode_compare_and_set() {
        let store = MemoryStore::new();
        assert!(store
            .update_sleep_mode(0, true, Some("18:00".into()))
            .await
            .unwrap());
        assert!(!store.update_sleep_mode(0, false, None).await.unwrap());

        let mode = store.sleep_mode().await.unwrap();
        assert!(mode.enabled);
        assert_eq!(mode.version, 1);
    }

    #[tokio::test]
    async fn categories_are_distinct_and_sorted() {
        let store = MemoryStore::new();
        store.upsert_product(&pod()).await.unwrap();
        let mut liquid = pod();
        liquid.id = "liq-1".into();
        liquid.category = "liquids".into();
        store.upsert_product(&liquid).await.unwrap();
        let mut other = pod();
        other.id = "pod-2".into();
        store.upsert_product(&other).await.unwrap();

        assert_eq!(store.categories().await.unwrap(), vec!["liquids", "pods"]);
        assert_eq!(store.products_in_category("pods").await.unwrap().len(), 2);
    }
}
