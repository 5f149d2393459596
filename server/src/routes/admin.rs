//! Admin routes.
//!
//! Each handler authorizes the presented password before doing anything
//! else.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use stockroom_engine::{ModeStatus, Order, Product};

use crate::auth::AdminPassword;
use crate::error::Result;
use crate::handlers::{
    handle_adjust_stock, handle_cancel, handle_confirm, handle_delete_product, handle_inventory,
    handle_mode, handle_orders, handle_upsert_product, now, InventoryItem, ModeRequest,
    OrdersQuery, StockAdjustRequest, StockAdjustResponse,
};
use crate::AppState;

/// Create admin routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/inventory", get(inventory))
        .route("/admin/products", put(upsert_product))
        .route("/admin/products/{id}", delete(delete_product))
        .route("/admin/products/{id}/stock", post(adjust_stock))
        .route("/admin/orders", get(list_orders))
        .route("/admin/orders/{id}/confirm", post(confirm_order))
        .route("/admin/orders/{id}/cancel", post(cancel_order))
        .route("/admin/mode", post(set_mode))
}

/// GET /admin/inventory - Products with stock totals.
async fn inventory(
    State(state): State<AppState>,
    password: AdminPassword,
) -> Result<Json<Vec<InventoryItem>>> {
    let grant = password.authorize(&state.admin, now())?;
    Ok(Json(handle_inventory(&state.shop, &grant).await?))
}

/// PUT /admin/products - Create or edit a product.
async fn upsert_product(
    State(state): State<AppState>,
    password: AdminPassword,
    Json(product): Json<Product>,
) -> Result<Json<Product>> {
    let grant = password.authorize(&state.admin, now())?;
    Ok(Json(handle_upsert_product(&state.shop, &grant, product).await?))
}

/// DELETE /admin/products/{id} - Remove a product.
async fn delete_product(
    State(state): State<AppState>,
    password: AdminPassword,
    Path(product_id): Path<String>,
) -> Result<StatusCode> {
    let grant = password.authorize(&state.admin, now())?;
    handle_delete_product(&state.shop, &grant, &product_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /admin/products/{id}/stock - Restock or write off a variant.
async fn adjust_stock(
    State(state): State<AppState>,
    password: AdminPassword,
    Path(product_id): Path<String>,
    Json(request): Json<StockAdjustRequest>,
) -> Result<Json<StockAdjustResponse>> {
    let grant = password.authorize(&state.admin, now())?;
    Ok(Json(
        handle_adjust_stock(&state.shop, &grant, &product_id, request).await?,
    ))
}

/// GET /admin/orders - Orders, optionally filtered by status.
async fn list_orders(
    State(state): State<AppState>,
    password: AdminPassword,
    Query(query): Query<OrdersQuery>,
) -> Result<Json<Vec<Order>>> {
    let grant = password.authorize(&state.admin, now())?;
    Ok(Json(handle_orders(&state.shop, &grant, &query).await?))
}

/// POST /admin/orders/{id}/confirm - Accept a pending order.
async fn confirm_order(
    State(state): State<AppState>,
    password: AdminPassword,
    Path(order_id): Path<String>,
) -> Result<Json<Order>> {
    let grant = password.authorize(&state.admin, now())?;
    Ok(Json(handle_confirm(&state.shop, &grant, &order_id).await?))
}

/// POST /admin/orders/{id}/cancel - Cancel an order and restore its stock.
async fn cancel_order(
    State(state): State<AppState>,
    password: AdminPassword,
    Path(order_id): Path<String>,
) -> Result<Json<Order>> {
    let grant = password.authorize(&state.admin, now())?;
    Ok(Json(handle_cancel(&state.shop, &grant, &order_id).await?))
}

/// POST /admin/mode - Close or reopen the shop.
async fn set_mode(
    State(state): State<AppState>,
    password: AdminPassword,
    Json(request): Json<ModeRequest>,
) -> Result<Json<ModeStatus>> {
    let grant = password.authorize(&state.admin, now())?;
    Ok(Json(handle_mode(&state.shop, &grant, request).await?))
}
