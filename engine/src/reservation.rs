//! Reservation engine.
//!
//! Keeps variant stock and customer carts in step. Stock and cart live in
//! separate documents and the store only offers single-document atomicity,
//! so every operation is a fixed sequence of two writes:
//!
//! - **Reserving** (add): decrement stock, then write the cart. If anything
//!   after the decrement fails, the decrement is reverted before returning.
//! - **Releasing** (remove, clear, expiry, cancellation): increment stock,
//!   then write the cart. If the cart write fails the increment stays. The
//!   shop may briefly show more free stock than it has, but stock is never
//!   lost.
//!
//! ## Race guarantee
//!
//! The availability check and the decrement are two store calls. Two callers
//! can both pass the check against the same stock before either decrement
//! lands. The decrement itself is atomic and returns the resulting count, so
//! the caller that drives the count below zero sees it and compensates with
//! an increment, reporting [`Error::InsufficientStock`]. Stock can therefore
//! be observed negative for the width of that window, but never stays
//! negative, and the losing caller never gets a cart line for it.

use crate::cart::{Cart, CartLine};
use crate::error::Result;
use crate::{CustomerId, Error, ModeGate, SharedStore, Timestamp};

/// Adds, removes and clears cart lines against live stock.
#[derive(Clone)]
pub struct Reservations {
    store: SharedStore,
    gate: ModeGate,
    cart_ttl_ms: u64,
}

impl Reservations {
    pub fn new(store: SharedStore, gate: ModeGate, cart_ttl_ms: u64) -> Self {
        Self {
            store,
            gate,
            cart_ttl_ms,
        }
    }

    /// Read a customer's cart.
    pub async fn cart(&self, customer_id: CustomerId) -> Result<Cart> {
        Ok(self.store.load_cart(customer_id).await?)
    }

    /// Reserve `quantity` units of a product variant into a customer's cart.
    ///
    /// Steps, in order:
    /// 1. refuse if the shop is closed
    /// 2. look up the product and the variant
    /// 3. check the cart's existing quantity plus `quantity` against stock
    /// 4. atomically decrement stock
    /// 5. compensate and refuse if the decrement went below zero
    /// 6. add to the cart (stamping the expiry if the cart was empty)
    /// 7. write the cart, compensating the decrement if the write fails
    pub async fn add_line(
        &self,
        customer_id: CustomerId,
        product_id: &str,
        flavor: &str,
        quantity: u32,
        now: Timestamp,
    ) -> Result<Cart> {
        if quantity == 0 {
            return Err(Error::InvalidQuantity);
        }

        self.gate.ensure_open(now).await?;

        let product = self
            .store
            .product(product_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("product {product_id}")))?;

        let variant = product
            .variant(flavor)
            .ok_or_else(|| Error::VariantUnavailable {
                product_id: product_id.to_string(),
                flavor: flavor.to_string(),
            })?;

        let mut cart = self.store.load_cart(customer_id).await?;
        let delta = i64::from(quantity);
        let requested = i64::from(cart.quantity_of(product_id, flavor)) + delta;

        if requested > variant.quantity {
            return Err(Error::InsufficientStock {
                flavor: flavor.to_string(),
                requested,
                available: variant.quantity.max(0),
            });
        }

        let remaining = self
            .store
            .adjust_stock(product_id, flavor, -delta)
            .await?
            .ok_or_else(|| {
                Error::PersistenceFailure(format!(
                    "stock update for {product_id}/{flavor} matched nothing"
                ))
            })?;

        if remaining < 0 {
            tracing::warn!(
                customer_id,
                product_id = %product_id,
                flavor = %flavor,
                remaining,
                "Lost stock race, reverting reservation"
            );
            self.compensate(product_id, flavor, delta).await;
            return Err(Error::InsufficientStock {
                flavor: flavor.to_string(),
                requested: delta,
                available: (remaining + delta).max(0),
            });
        }

        cart.add(
            CartLine::for_product(&product, flavor, quantity),
            now,
            self.cart_ttl_ms,
        );

        if let Err(e) = self.store.save_cart(&cart).await {
            tracing::error!(
                customer_id,
                product_id = %product_id,
                flavor = %flavor,
                error = %e,
                "Cart write failed, reverting reservation"
            );
            self.compensate(product_id, flavor, delta).await;
            return Err(e.into());
        }

        tracing::debug!(
            customer_id,
            product_id = %product_id,
            flavor = %flavor,
            quantity,
            remaining,
            "Reserved stock"
        );
        Ok(cart)
    }

    /// Take one unit of a product off a customer's cart and release it.
    ///
    /// With `flavor` of `None` the first line for the product is used.
    /// Stock is incremented before the cart is written; a failed cart write
    /// does not undo the increment.
    pub async fn remove_line(
        &self,
        customer_id: CustomerId,
        product_id: &str,
        flavor: Option<&str>,
    ) -> Result<Cart> {
        let mut cart = self.store.load_cart(customer_id).await?;
        let index = cart
            .position(product_id, flavor)
            .ok_or_else(|| Error::NotFound(format!("cart line for product {product_id}")))?;

        let flavor = cart.lines[index].flavor.clone();
        self.release(product_id, &flavor, 1).await?;

        cart.decrement_at(index);
        self.store.save_cart(&cart).await.map_err(|e| {
            tracing::warn!(
                customer_id,
                product_id = %product_id,
                error = %e,
                "Released stock ahead of failed cart write"
            );
            e
        })?;

        Ok(cart)
    }

    /// Release every line of a customer's cart and empty it.
    pub async fn clear_cart(&self, customer_id: CustomerId) -> Result<Cart> {
        let mut cart = self.store.load_cart(customer_id).await?;
        if cart.is_empty() {
            if cart.expires_at.is_some() {
                cart.expires_at = None;
                self.store.save_cart(&cart).await?;
            }
            return Ok(cart);
        }

        self.release_lines(&mut cart).await?;
        Ok(cart)
    }

    /// Return `quantity` units of a variant to stock.
    ///
    /// This is the single release path shared by removal, clearing, expiry
    /// and order cancellation. Returns the stock after the increment, or
    /// `None` if the product or variant no longer exists.
    pub async fn release(
        &self,
        product_id: &str,
        flavor: &str,
        quantity: u32,
    ) -> Result<Option<i64>> {
        let after = self
            .store
            .adjust_stock(product_id, flavor, i64::from(quantity))
            .await?;

        if after.is_none() {
            tracing::warn!(
                product_id = %product_id,
                flavor = %flavor,
                quantity,
                "Released stock for a variant that no longer exists"
            );
        }
        Ok(after)
    }

    /// Release every line of `cart` and write it back empty.
    ///
    /// Lines are released one at a time and dropped from the cart as they go.
    /// If a release fails, the lines not yet released stay in the cart, which
    /// is written back best-effort, so a retry never releases a line twice.
    pub async fn release_lines(&self, cart: &mut Cart) -> Result<u32> {
        let mut released = 0;

        while let Some(line) = cart.lines.first().cloned() {
            if let Err(e) = self.release(&line.product_id, &line.flavor, line.quantity).await {
                if released > 0 {
                    if let Err(save_err) = self.store.save_cart(cart).await {
                        tracing::error!(
                            customer_id = cart.customer_id,
                            error = %save_err,
                            "Could not record partially released cart"
                        );
                    }
                }
                return Err(e);
            }
            cart.lines.remove(0);
            released += 1;
        }

        cart.clear();
        self.store.save_cart(cart).await?;
        Ok(released)
    }

    /// Undo a decrement. Failure here leaves stock low, so it is logged loudly.
    async fn compensate(&self, product_id: &str, flavor: &str, delta: i64) {
        match self.store.adjust_stock(product_id, flavor, delta).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                tracing::warn!(
                    product_id = %product_id,
                    flavor = %flavor,
                    "Variant vanished before compensation"
                );
            }
            Err(e) => {
                tracing::error!(
                    product_id = %product_id,
                    flavor = %flavor,
                    delta,
                    error = %e,
                    "Compensating stock increment failed"
                );
            }
        }
    }
}
