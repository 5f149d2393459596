//! Customer cart and order routes.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use stockroom_engine::{CustomerId, ModeStatus, Order};

use crate::error::Result;
use crate::handlers::{
    handle_add, handle_cart, handle_checkout, handle_clear, handle_remove, now, AddItemRequest,
    CartView, RemoveItemRequest,
};
use crate::AppState;

/// Create customer routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/customers/{id}/cart", get(get_cart).delete(clear_cart))
        .route(
            "/customers/{id}/cart/items",
            post(add_item).delete(remove_item),
        )
        .route("/customers/{id}/checkout", post(checkout))
        .route("/customers/{id}/orders", get(list_orders))
        .route("/shop/status", get(shop_status))
}

/// GET /customers/{id}/cart - Current cart.
async fn get_cart(
    State(state): State<AppState>,
    Path(customer_id): Path<CustomerId>,
) -> Result<Json<CartView>> {
    Ok(Json(handle_cart(&state.shop, customer_id).await?))
}

/// POST /customers/{id}/cart/items - Reserve units of a variant.
async fn add_item(
    State(state): State<AppState>,
    Path(customer_id): Path<CustomerId>,
    Json(request): Json<AddItemRequest>,
) -> Result<Json<CartView>> {
    Ok(Json(handle_add(&state.shop, customer_id, request, now()).await?))
}

/// DELETE /customers/{id}/cart/items - Release one unit.
async fn remove_item(
    State(state): State<AppState>,
    Path(customer_id): Path<CustomerId>,
    Json(request): Json<RemoveItemRequest>,
) -> Result<Json<CartView>> {
    Ok(Json(handle_remove(&state.shop, customer_id, request).await?))
}

/// DELETE /customers/{id}/cart - Release everything.
async fn clear_cart(
    State(state): State<AppState>,
    Path(customer_id): Path<CustomerId>,
) -> Result<Json<CartView>> {
    Ok(Json(handle_clear(&state.shop, customer_id).await?))
}

/// POST /customers/{id}/checkout - Place an order from the cart.
async fn checkout(
    State(state): State<AppState>,
    Path(customer_id): Path<CustomerId>,
) -> Result<Json<Order>> {
    Ok(Json(handle_checkout(&state.shop, customer_id, now()).await?))
}

/// GET /customers/{id}/orders - Order history, newest first.
async fn list_orders(
    State(state): State<AppState>,
    Path(customer_id): Path<CustomerId>,
) -> Result<Json<Vec<Order>>> {
    Ok(Json(state.shop.orders().customer_orders(customer_id).await?))
}

/// GET /shop/status - Whether the shop takes reservations.
async fn shop_status(State(state): State<AppState>) -> Result<Json<ModeStatus>> {
    Ok(Json(state.shop.gate().check(now()).await?))
}
