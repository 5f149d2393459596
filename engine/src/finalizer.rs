//! Order finalizer.
//!
//! Turns carts into orders and settles them. Checkout does not touch stock:
//! the units were already taken when the lines were added. Cancelling hands
//! them back through the same release path as removing a cart line.

use crate::error::Result;
use crate::notify::{deliver, Notifier, Recipient};
use crate::{
    AdminGrant, CartLine, CustomerId, Error, ModeGate, Order, OrderStatus, Reservations,
    SharedStore, Timestamp,
};
use std::sync::Arc;

/// Converts carts to orders and moves orders through their lifecycle.
#[derive(Clone)]
pub struct OrderFinalizer {
    store: SharedStore,
    gate: ModeGate,
    reservations: Reservations,
    notifier: Arc<dyn Notifier>,
}

impl OrderFinalizer {
    pub fn new(
        store: SharedStore,
        gate: ModeGate,
        reservations: Reservations,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            gate,
            reservations,
            notifier,
        }
    }

    /// Place an order from a customer's cart.
    ///
    /// The order takes over the cart's reservations, so the cart is emptied
    /// without releasing stock. If emptying the cart fails, the new order is
    /// cancelled again without releasing stock (the cart still holds it) and
    /// the checkout reports [`Error::PersistenceFailure`].
    pub async fn checkout(&self, customer_id: CustomerId, now: Timestamp) -> Result<Order> {
        self.gate.ensure_open(now).await?;

        let mut cart = self.store.load_cart(customer_id).await?;
        if cart.is_empty() {
            return Err(Error::EmptyCart);
        }

        let order = self
            .store
            .create_order(customer_id, cart.lines.clone(), now)
            .await?;

        cart.clear();
        if let Err(e) = self.store.save_cart(&cart).await {
            tracing::error!(
                customer_id,
                order_id = %order.id,
                error = %e,
                "Cart not emptied after checkout, voiding order"
            );
            if let Err(void_err) = self
                .store
                .transition_order(&order.id, OrderStatus::Pending, OrderStatus::Cancelled)
                .await
            {
                tracing::error!(order_id = %order.id, error = %void_err, "Could not void order");
            }
            return Err(e.into());
        }

        tracing::info!(customer_id, order_id = %order.id, total = order.total(), "Order placed");
        deliver(
            self.notifier.as_ref(),
            Recipient::Operators,
            &format!(
                "New order {} from customer {}: {} item(s), total {}",
                order.id,
                customer_id,
                order.items.iter().map(|l| l.quantity).sum::<u32>(),
                order.total()
            ),
        )
        .await;

        Ok(order)
    }

    /// Accept a pending order. Stock is not touched.
    pub async fn confirm(&self, _grant: &AdminGrant, order_id: &str) -> Result<Order> {
        let order = self.load(order_id).await?;
        self.transition(&order, OrderStatus::Confirmed).await?;

        deliver(
            self.notifier.as_ref(),
            Recipient::Customer(order.customer_id),
            &format!("Your order {} has been confirmed.", order.id),
        )
        .await;

        self.load(order_id).await
    }

    /// Reject or cancel an order, handing its stock back.
    ///
    /// Every line is released first, then the status moves to `cancelled`.
    pub async fn cancel(&self, _grant: &AdminGrant, order_id: &str) -> Result<Order> {
        let order = self.load(order_id).await?;
        self.cancel_order(&order).await?;

        deliver(
            self.notifier.as_ref(),
            Recipient::Customer(order.customer_id),
            &format!("Your order {} has been cancelled.", order.id),
        )
        .await;

        self.load(order_id).await
    }

    /// Cancel pending orders placed more than `max_age_ms` ago.
    ///
    /// Returns how many were cancelled. One order failing does not stop the
    /// others.
    pub async fn cancel_stale(&self, now: Timestamp, max_age_ms: u64) -> Result<usize> {
        let cutoff = now.saturating_sub(max_age_ms);
        let stale = self.store.pending_orders_before(cutoff).await?;
        let mut cancelled = 0;

        for order in stale {
            match self.cancel_order(&order).await {
                Ok(()) => {
                    cancelled += 1;
                    deliver(
                        self.notifier.as_ref(),
                        Recipient::Customer(order.customer_id),
                        &format!("Your order {} expired and was cancelled.", order.id),
                    )
                    .await;
                }
                Err(e) => {
                    tracing::error!(
                        order_id = %order.id,
                        error = %e,
                        "Failed to cancel stale order"
                    );
                }
            }
        }

        if cancelled > 0 {
            tracing::info!(cancelled, "Cancelled stale orders");
        }
        Ok(cancelled)
    }

    /// Orders in any of the given statuses; all orders for an empty filter.
    pub async fn orders(&self, statuses: &[OrderStatus]) -> Result<Vec<Order>> {
        let statuses = if statuses.is_empty() {
            &[
                OrderStatus::Pending,
                OrderStatus::Confirmed,
                OrderStatus::Cancelled,
            ][..]
        } else {
            statuses
        };
        Ok(self.store.orders_with_status(statuses).await?)
    }

    /// A customer's orders, newest first.
    pub async fn customer_orders(&self, customer_id: CustomerId) -> Result<Vec<Order>> {
        Ok(self.store.orders_for_customer(customer_id).await?)
    }

    async fn load(&self, order_id: &str) -> Result<Order> {
        self.store
            .order(order_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("order {order_id}")))
    }

    async fn transition(&self, order: &Order, to: OrderStatus) -> Result<()> {
        if !order.status.can_transition_to(to) {
            return Err(Error::InvalidTransition {
                from: order.status,
                to,
            });
        }

        let moved = self
            .store
            .transition_order(&order.id, order.status, to)
            .await?;
        if !moved {
            // Changed underneath us; report against the fresh status.
            let current = self.load(&order.id).await?;
            return Err(Error::InvalidTransition {
                from: current.status,
                to,
            });
        }

        tracing::info!(
            order_id = %order.id,
            from = %order.status,
            to = %to,
            "Order status changed"
        );
        Ok(())
    }

    async fn cancel_order(&self, order: &Order) -> Result<()> {
        if !order.status.can_transition_to(OrderStatus::Cancelled) {
            return Err(Error::InvalidTransition {
                from: order.status,
                to: OrderStatus::Cancelled,
            });
        }

        let mut released = Vec::with_capacity(order.items.len());
        let mut outcome = Ok(());
        for line in &order.items {
            match self
                .reservations
                .release(&line.product_id, &line.flavor, line.quantity)
                .await
            {
                Ok(_) => released.push(line),
                Err(e) => {
                    outcome = Err(e);
                    break;
                }
            }
        }

        if outcome.is_ok() {
            outcome = self.transition(order, OrderStatus::Cancelled).await;
        }

        if outcome.is_err() {
            // The order keeps its status, so it must keep its stock too.
            self.take_back(order, &released).await;
        }
        outcome
    }

    /// Re-reserve lines released by a cancel that did not complete.
    async fn take_back(&self, order: &Order, lines: &[&CartLine]) {
        for line in lines {
            let delta = -i64::from(line.quantity);
            if let Err(e) = self
                .store
                .adjust_stock(&line.product_id, &line.flavor, delta)
                .await
            {
                tracing::error!(
                    order_id = %order.id,
                    product_id = %line.product_id,
                    flavor = %line.flavor,
                    error = %e,
                    "Could not take back stock released by a failed cancel"
                );
            }
        }
        if !lines.is_empty() {
            tracing::warn!(order_id = %order.id, lines = lines.len(), "Reverted partial cancel");
        }
    }
}
