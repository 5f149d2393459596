//! Cart types.
//!
//! A cart is owned by exactly one customer. Lines keep insertion order and
//! snapshot the product name and price at the time they were added.

use crate::{CustomerId, Price, Product, ProductId, Timestamp};
use serde::{Deserialize, Serialize};

/// One line in a customer's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Product this line refers to
    pub product_id: ProductId,
    /// Product name at add-time
    pub name: String,
    /// Unit price at add-time
    pub price: Price,
    /// Reserved units, always at least 1
    pub quantity: u32,
    /// Variant name
    pub flavor: String,
}

impl CartLine {
    /// Create a line for a product variant, snapshotting name and price.
    pub fn for_product(product: &Product, flavor: impl Into<String>, quantity: u32) -> Self {
        Self {
            product_id: product.id.clone(),
            name: product.name.clone(),
            price: product.price,
            quantity,
            flavor: flavor.into(),
        }
    }

    /// Check whether this line holds the given product variant.
    pub fn matches(&self, product_id: &str, flavor: &str) -> bool {
        self.product_id == product_id && self.flavor == flavor
    }

    /// Line total (price times quantity).
    pub fn subtotal(&self) -> Price {
        self.price * u64::from(self.quantity)
    }
}

/// A customer's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    /// Owner
    pub customer_id: CustomerId,
    /// Lines in insertion order
    #[serde(rename = "cart")]
    pub lines: Vec<CartLine>,
    /// Set while the cart holds lines, cleared when it becomes empty
    #[serde(rename = "cart_expires_at")]
    pub expires_at: Option<Timestamp>,
}

impl Cart {
    /// Create an empty cart.
    pub fn empty(customer_id: CustomerId) -> Self {
        Self {
            customer_id,
            lines: Vec::new(),
            expires_at: None,
        }
    }

    /// Check if the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Quantity already reserved for a product variant.
    pub fn quantity_of(&self, product_id: &str, flavor: &str) -> u32 {
        self.lines
            .iter()
            .find(|l| l.matches(product_id, flavor))
            .map(|l| l.quantity)
            .unwrap_or(0)
    }

    /// Index of the line for a product, optionally narrowed to one variant.
    pub fn position(&self, product_id: &str, flavor: Option<&str>) -> Option<usize> {
        self.lines.iter().position(|l| {
            l.product_id == product_id && flavor.map_or(true, |f| l.flavor == f)
        })
    }

    /// Add units to the matching line, or append a new one.
    ///
    /// Stamps a fresh expiry when the cart goes from empty to non-empty; an
    /// already active cart keeps its expiry.
    pub fn add(&mut self, line: CartLine, now: Timestamp, ttl_ms: u64) {
        let was_empty = self.is_empty();

        match self
            .lines
            .iter_mut()
            .find(|l| l.matches(&line.product_id, &line.flavor))
        {
            Some(existing) => existing.quantity += line.quantity,
            None => self.lines.push(line),
        }

        if was_empty {
            self.expires_at = Some(now + ttl_ms);
        }
    }

    /// Take one unit off the line at `index`, dropping the line at zero.
    ///
    /// Returns the line as it was before the change.
    pub fn decrement_at(&mut self, index: usize) -> Option<CartLine> {
        let line = self.lines.get_mut(index)?;
        let before = line.clone();

        if line.quantity > 1 {
            line.quantity -= 1;
        } else {
            self.lines.remove(index);
        }

        if self.lines.is_empty() {
            self.expires_at = None;
        }

        Some(before)
    }

    /// Drop every line and clear the expiry.
    pub fn clear(&mut self) -> Vec<CartLine> {
        self.expires_at = None;
        std::mem::take(&mut self.lines)
    }

    /// Total price of all lines.
    pub fn total(&self) -> Price {
        self.lines.iter().map(CartLine::subtotal).sum()
    }

    /// Total number of reserved units.
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Check whether the cart's time-to-live has run out.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expires_at.is_some_and(|at| at < now)
    }
}
