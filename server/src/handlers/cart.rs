//! Cart handlers - reservations and checkout on behalf of one customer.

use serde::{Deserialize, Serialize};
use stockroom_engine::{Cart, CartLine, CustomerId, Order, Price, Shop, Timestamp};

use crate::error::Result;

/// A cart as returned to clients.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub customer_id: CustomerId,
    pub lines: Vec<CartLine>,
    pub total: Price,
    pub item_count: u32,
    /// Milliseconds since epoch at which the reservation lapses
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<Timestamp>,
}

impl From<Cart> for CartView {
    fn from(cart: Cart) -> Self {
        Self {
            total: cart.total(),
            item_count: cart.item_count(),
            customer_id: cart.customer_id,
            lines: cart.lines,
            expires_at: cart.expires_at,
        }
    }
}

/// Request body for adding to a cart.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: String,
    pub flavor: String,
    /// Units to add, 1 when omitted
    #[serde(default)]
    pub quantity: Option<u32>,
}

/// Request body for removing from a cart.
#[derive(Debug, Deserialize)]
pub struct RemoveItemRequest {
    pub product_id: String,
    /// Variant to remove; the first line of the product when omitted
    #[serde(default)]
    pub flavor: Option<String>,
}

pub async fn handle_cart(shop: &Shop, customer_id: CustomerId) -> Result<CartView> {
    Ok(shop.reservations().cart(customer_id).await?.into())
}

pub async fn handle_add(
    shop: &Shop,
    customer_id: CustomerId,
    request: AddItemRequest,
    now: Timestamp,
) -> Result<CartView> {
    let cart = shop
        .reservations()
        .add_line(
            customer_id,
            &request.product_id,
            &request.flavor,
            request.quantity.unwrap_or(1),
            now,
        )
        .await?;
    Ok(cart.into())
}

pub async fn handle_remove(
    shop: &Shop,
    customer_id: CustomerId,
    request: RemoveItemRequest,
) -> Result<CartView> {
    let cart = shop
        .reservations()
        .remove_line(customer_id, &request.product_id, request.flavor.as_deref())
        .await?;
    Ok(cart.into())
}

pub async fn handle_clear(shop: &Shop, customer_id: CustomerId) -> Result<CartView> {
    Ok(shop.reservations().clear_cart(customer_id).await?.into())
}

pub async fn handle_checkout(
    shop: &Shop,
    customer_id: CustomerId,
    now: Timestamp,
) -> Result<Order> {
    Ok(shop.orders().checkout(customer_id, now).await?)
}
