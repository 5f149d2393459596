//! Background expiry loop.
//!
//! Runs one engine sweep per tick and, when configured, cancels stale
//! pending orders. Stops when the shutdown signal flips.

use std::time::Duration;

use stockroom_engine::Shop;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::handlers::now;

/// Run one pass: release expired carts, then cancel stale orders.
pub async fn run_once(shop: &Shop) {
    match shop.sweeper().sweep(now()).await {
        Ok(report) => {
            if report.failures > 0 {
                tracing::warn!(failures = report.failures, "Some carts will be retried next pass");
            }
        }
        Err(e) => tracing::error!(error = %e, "Expiry sweep failed"),
    }

    if let Some(max_age) = shop.config().stale_order_after_ms {
        if let Err(e) = shop.orders().cancel_stale(now(), max_age).await {
            tracing::error!(error = %e, "Stale order cleanup failed");
        }
    }
}

/// Spawn the loop. Send `true` on the paired sender to stop it.
pub fn spawn(shop: Shop, period: Duration, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!(interval_secs = period.as_secs(), "Expiry sweeper started");

        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => run_once(&shop).await,
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::info!("Expiry sweeper stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use stockroom_engine::{
        AdminGate, CartStore, InventoryStore, MemoryStore, Product, ShopConfig, Variant,
    };

    #[tokio::test]
    async fn run_once_releases_expired_carts() {
        let store = Arc::new(MemoryStore::new());
        let config = ShopConfig {
            cart_ttl_ms: 1,
            ..ShopConfig::default()
        };
        let shop = Shop::new(store.clone(), config);
        shop.catalog()
            .upsert_product(&AdminGate::trusted(1_000), Product::new(
                "pod-1",
                "Pod",
                1500,
                "pods",
                vec![Variant::new("Mint", 2)],
            ))
            .await
            .unwrap();

        // Added far in the past, so the 1 ms TTL has long run out
        shop.reservations()
            .add_line(1, "pod-1", "Mint", 2, 1_000)
            .await
            .unwrap();

        run_once(&shop).await;

        assert!(store.load_cart(1).await.unwrap().is_empty());
        assert_eq!(store.variant_stock("pod-1", "Mint").await.unwrap(), Some(2));
    }

    #[tokio::test]
    async fn loop_stops_on_shutdown() {
        let shop = Shop::new(Arc::new(MemoryStore::new()), ShopConfig::default());
        let (tx, rx) = watch::channel(false);

        let handle = spawn(shop, Duration::from_secs(3600), rx);
        tx.send(true).unwrap();

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
