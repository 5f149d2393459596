//! Expiry sweeper.
//!
//! One pass releases every cart whose time-to-live has run out. The caller
//! decides how often to run it.

use crate::error::Result;
use crate::notify::{deliver, Notifier, Recipient};
use crate::{Reservations, SharedStore, Timestamp};
use serde::Serialize;
use std::sync::Arc;

/// Outcome of one sweep pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Carts emptied in this pass
    pub carts_swept: usize,
    /// Cart lines whose stock went back
    pub lines_released: u32,
    /// Carts that could not be fully released; retried on the next pass
    pub failures: usize,
}

/// Releases expired carts.
#[derive(Clone)]
pub struct Sweeper {
    store: SharedStore,
    reservations: Reservations,
    notifier: Arc<dyn Notifier>,
}

impl Sweeper {
    pub fn new(
        store: SharedStore,
        reservations: Reservations,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            reservations,
            notifier,
        }
    }

    /// Release every cart with an expiry before `now`.
    ///
    /// A failure on one cart is logged and counted; the pass carries on with
    /// the rest. Only the initial listing can fail the whole pass.
    pub async fn sweep(&self, now: Timestamp) -> Result<SweepReport> {
        let expired = self.store.expired_carts(now).await?;
        let mut report = SweepReport::default();

        for mut cart in expired {
            let customer_id = cart.customer_id;
            match self.reservations.release_lines(&mut cart).await {
                Ok(released) => {
                    report.carts_swept += 1;
                    report.lines_released += released;
                    tracing::debug!(customer_id, released, "Released expired cart");
                    deliver(
                        self.notifier.as_ref(),
                        Recipient::Customer(customer_id),
                        "Your cart expired and the items went back on the shelf.",
                    )
                    .await;
                }
                Err(e) => {
                    report.failures += 1;
                    tracing::error!(customer_id, error = %e, "Failed to release expired cart");
                }
            }
        }

        if report.carts_swept > 0 || report.failures > 0 {
            tracing::info!(
                carts = report.carts_swept,
                lines = report.lines_released,
                failures = report.failures,
                "Expiry sweep finished"
            );
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::RecordingNotifier;
    use crate::store::{CartStore, InventoryStore};
    use crate::{MemoryStore, ModeGate, Product, Variant};

    const NOW: Timestamp = 1_706_745_600_000;
    const TTL: u64 = 600_000;

    async fn setup() -> (Arc<MemoryStore>, Reservations, Sweeper, Arc<RecordingNotifier>) {
        let store = Arc::new(MemoryStore::new());
        store
            .upsert_product(&Product::new(
                "pod-1",
                "Pod",
                1500,
                "pods",
                vec![Variant::new("Mint", 4), Variant::new("Menthol", 4)],
            ))
            .await
            .unwrap();

        let notifier = Arc::new(RecordingNotifier::new());
        let gate = ModeGate::new(store.clone(), None, 7_200_000);
        let reservations = Reservations::new(store.clone(), gate, TTL);
        let sweeper = Sweeper::new(store.clone(), reservations.clone(), notifier.clone());
        (store, reservations, sweeper, notifier)
    }

    async fn stock(store: &MemoryStore, flavor: &str) -> i64 {
        store.variant_stock("pod-1", flavor).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn sweeps_only_expired_carts() {
        let (store, reservations, sweeper, notifier) = setup().await;
        reservations.add_line(1, "pod-1", "Mint", 2, NOW).await.unwrap();
        reservations.add_line(2, "pod-1", "Mint", 1, NOW + TTL).await.unwrap();

        let report = sweeper.sweep(NOW + TTL + 1).await.unwrap();

        assert_eq!(report.carts_swept, 1);
        assert_eq!(report.lines_released, 1);
        assert_eq!(stock(&store, "Mint").await, 3);
        assert!(store.load_cart(1).await.unwrap().is_empty());
        assert_eq!(store.load_cart(2).await.unwrap().item_count(), 1);
        assert_eq!(notifier.notices_for(Recipient::Customer(1)).len(), 1);
    }

    #[tokio::test]
    async fn second_sweep_is_a_no_op() {
        let (store, reservations, sweeper, _) = setup().await;
        reservations.add_line(1, "pod-1", "Mint", 2, NOW).await.unwrap();
        reservations.add_line(1, "pod-1", "Menthol", 1, NOW).await.unwrap();

        let later = NOW + TTL + 1;
        let first = sweeper.sweep(later).await.unwrap();
        let second = sweeper.sweep(later).await.unwrap();

        assert_eq!(first.lines_released, 2);
        assert_eq!(second, SweepReport::default());
        assert_eq!(stock(&store, "Mint").await, 4);
        assert_eq!(stock(&store, "Menthol").await, 4);

        let cart = store.load_cart(1).await.unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.expires_at, None);
    }

    #[tokio::test]
    async fn one_failing_cart_does_not_stop_the_rest() {
        let (store, reservations, sweeper, _) = setup().await;
        reservations.add_line(1, "pod-1", "Mint", 1, NOW).await.unwrap();
        reservations.add_line(2, "pod-1", "Menthol", 1, NOW).await.unwrap();

        // Carts are swept in customer order; customer 1's release fails
        store.fail_stock_adjustments(1);
        let report = sweeper.sweep(NOW + TTL + 1).await.unwrap();

        assert_eq!(report.failures, 1);
        assert_eq!(report.carts_swept, 1);
        assert_eq!(stock(&store, "Mint").await, 3);
        assert_eq!(stock(&store, "Menthol").await, 4);

        // The failed cart is picked up on the next pass
        let retry = sweeper.sweep(NOW + TTL + 2).await.unwrap();
        assert_eq!(retry.carts_swept, 1);
        assert_eq!(stock(&store, "Mint").await, 4);
    }
}
