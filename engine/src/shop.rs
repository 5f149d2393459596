//! Shop facade.
//!
//! Wires the gate, reservations, finalizer and sweeper over one shared store
//! so callers configure everything in one place.

use crate::error::Result;
use crate::notify::NullNotifier;
use crate::{
    AdminGrant, Error, ModeGate, Notifier, OrderFinalizer, Product, Reservations, SharedStore,
    Sweeper, MILLIS_PER_SECOND,
};
use std::sync::Arc;

/// Engine-side settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShopConfig {
    /// How long a cart holds its stock after the first line was added
    pub cart_ttl_ms: u64,
    /// Open orders at which the shop closes itself; `None` never closes
    pub auto_close_threshold: Option<u64>,
    /// How far ahead of the auto-close the advertised end time lies
    pub close_window_ms: u64,
    /// Pending orders older than this are cancelled by the sweep loop
    pub stale_order_after_ms: Option<u64>,
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self {
            cart_ttl_ms: 600 * MILLIS_PER_SECOND,
            auto_close_threshold: None,
            close_window_ms: 2 * 60 * 60 * MILLIS_PER_SECOND,
            stale_order_after_ms: None,
        }
    }
}

/// Catalog reads and operator edits.
#[derive(Clone)]
pub struct Catalog {
    store: SharedStore,
}

impl Catalog {
    pub async fn products(&self) -> Result<Vec<Product>> {
        Ok(self.store.products().await?)
    }

    pub async fn product(&self, id: &str) -> Result<Product> {
        self.store
            .product(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("product {id}")))
    }

    pub async fn categories(&self) -> Result<Vec<String>> {
        Ok(self.store.categories().await?)
    }

    pub async fn products_in_category(&self, category: &str) -> Result<Vec<Product>> {
        Ok(self.store.products_in_category(category).await?)
    }

    /// Validate and write a product. Existing variant stock is kept.
    pub async fn upsert_product(&self, _grant: &AdminGrant, product: Product) -> Result<Product> {
        product.validate()?;
        self.store.upsert_product(&product).await?;
        tracing::info!(product_id = %product.id, "Product saved");
        self.product(&product.id).await
    }

    pub async fn delete_product(&self, _grant: &AdminGrant, id: &str) -> Result<()> {
        if !self.store.delete_product(id).await? {
            return Err(Error::NotFound(format!("product {id}")));
        }
        tracing::info!(product_id = %id, "Product deleted");
        Ok(())
    }

    /// Add `delta` units (negative to write off) to one variant.
    ///
    /// Goes through the same atomic adjust as reservations, so it is safe
    /// while customers are shopping. Stock never ends up below zero.
    pub async fn restock(
        &self,
        _grant: &AdminGrant,
        product_id: &str,
        flavor: &str,
        delta: i64,
    ) -> Result<i64> {
        // Negated to revert an overdrawn write-off
        let revert = delta.checked_neg().ok_or(Error::InvalidQuantity)?;

        let product = self.product(product_id).await?;
        if product.variant(flavor).is_none() {
            return Err(Error::VariantUnavailable {
                product_id: product_id.to_string(),
                flavor: flavor.to_string(),
            });
        }

        let after = self
            .store
            .adjust_stock(product_id, flavor, delta)
            .await?
            .ok_or_else(|| Error::NotFound(format!("product {product_id}")))?;

        if after < 0 {
            if let Err(e) = self.store.adjust_stock(product_id, flavor, revert).await {
                tracing::error!(
                    product_id = %product_id,
                    flavor = %flavor,
                    error = %e,
                    "Could not revert write-off"
                );
            }
            return Err(Error::InsufficientStock {
                flavor: flavor.to_string(),
                requested: revert,
                available: after + revert,
            });
        }

        tracing::info!(
            product_id = %product_id,
            flavor = %flavor,
            delta,
            stock = after,
            "Stock adjusted"
        );
        Ok(after)
    }
}

/// All engine components over one store.
#[derive(Clone)]
pub struct Shop {
    store: SharedStore,
    config: ShopConfig,
    gate: ModeGate,
    reservations: Reservations,
    finalizer: OrderFinalizer,
    sweeper: Sweeper,
}

impl Shop {
    /// Build a shop that drops every notification.
    pub fn new(store: SharedStore, config: ShopConfig) -> Self {
        Self::with_notifier(store, config, Arc::new(NullNotifier))
    }

    /// Build a shop that reports to `notifier`.
    pub fn with_notifier(
        store: SharedStore,
        config: ShopConfig,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let gate = ModeGate::new(
            store.clone(),
            config.auto_close_threshold,
            config.close_window_ms,
        );
        let reservations = Reservations::new(store.clone(), gate.clone(), config.cart_ttl_ms);
        let finalizer = OrderFinalizer::new(
            store.clone(),
            gate.clone(),
            reservations.clone(),
            notifier.clone(),
        );
        let sweeper = Sweeper::new(store.clone(), reservations.clone(), notifier);

        Self {
            store,
            config,
            gate,
            reservations,
            finalizer,
            sweeper,
        }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn config(&self) -> &ShopConfig {
        &self.config
    }

    pub fn gate(&self) -> &ModeGate {
        &self.gate
    }

    pub fn reservations(&self) -> &Reservations {
        &self.reservations
    }

    pub fn orders(&self) -> &OrderFinalizer {
        &self.finalizer
    }

    pub fn sweeper(&self) -> &Sweeper {
        &self.sweeper
    }

    pub fn catalog(&self) -> Catalog {
        Catalog {
            store: self.store.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AdminGate, MemoryStore, Variant};

    const NOW: u64 = 1_706_745_600_000;

    async fn shop() -> Shop {
        let shop = Shop::new(Arc::new(MemoryStore::new()), ShopConfig::default());
        let grant = AdminGate::trusted(NOW);
        shop.catalog()
            .upsert_product(&grant, Product::new(
                "pod-1",
                "Pod",
                1500,
                "pods",
                vec![Variant::new("Mint", 2)],
            ))
            .await
            .unwrap();
        shop
    }

    #[test]
    fn default_config() {
        let config = ShopConfig::default();
        assert_eq!(config.cart_ttl_ms, 600_000);
        assert_eq!(config.close_window_ms, 7_200_000);
        assert_eq!(config.auto_close_threshold, None);
    }

    #[tokio::test]
    async fn upsert_rejects_invalid_product() {
        let shop = shop().await;
        let bad = Product::new("", "Nameless", 100, "pods", vec![]);
        assert!(matches!(
            shop.catalog()
                .upsert_product(&AdminGate::trusted(NOW), bad)
                .await,
            Err(Error::InvalidCatalog(_))
        ));
    }

    #[tokio::test]
    async fn restock_and_write_off() {
        let shop = shop().await;
        let grant = AdminGate::trusted(NOW);
        let catalog = shop.catalog();

        assert_eq!(catalog.restock(&grant, "pod-1", "Mint", 3).await.unwrap(), 5);
        assert_eq!(catalog.restock(&grant, "pod-1", "Mint", -5).await.unwrap(), 0);

        let err = catalog.restock(&grant, "pod-1", "Mint", -1).await.unwrap_err();
        assert!(matches!(err, Error::InsufficientStock { available: 0, .. }));
        assert_eq!(catalog.product("pod-1").await.unwrap().total_stock(), 0);
    }

    #[tokio::test]
    async fn restock_refuses_unnegatable_delta() {
        let shop = shop().await;
        let grant = AdminGate::trusted(NOW);
        let catalog = shop.catalog();

        assert_eq!(
            catalog.restock(&grant, "pod-1", "Mint", i64::MIN).await,
            Err(Error::InvalidQuantity)
        );
        assert_eq!(catalog.product("pod-1").await.unwrap().total_stock(), 2);
    }

    #[tokio::test]
    async fn restock_unknown_variant() {
        let shop = shop().await;
        let grant = AdminGate::trusted(NOW);
        assert!(matches!(
            shop.catalog().restock(&grant, "pod-1", "Grape", 1).await,
            Err(Error::VariantUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn delete_then_lookup() {
        let shop = shop().await;
        let grant = AdminGate::trusted(NOW);
        let catalog = shop.catalog();

        catalog.delete_product(&grant, "pod-1").await.unwrap();
        assert!(matches!(catalog.product("pod-1").await, Err(Error::NotFound(_))));
        assert!(matches!(
            catalog.delete_product(&grant, "pod-1").await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn components_share_one_store() {
        let shop = shop().await;
        shop.reservations()
            .add_line(7, "pod-1", "Mint", 2, NOW)
            .await
            .unwrap();

        let order = shop.orders().checkout(7, NOW).await.unwrap();
        assert_eq!(order.total(), 3000);
        assert_eq!(shop.orders().customer_orders(7).await.unwrap().len(), 1);
        assert_eq!(shop.catalog().product("pod-1").await.unwrap().total_stock(), 0);
    }
}
