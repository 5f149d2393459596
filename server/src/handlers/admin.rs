//! Admin handlers - catalog edits, order review and the operational mode.
//!
//! Every handler takes an [`AdminGrant`], so it can only be reached after
//! the caller passed the password check.

use serde::{Deserialize, Serialize};
use stockroom_engine::{AdminGrant, ModeStatus, Order, OrderStatus, Product, Shop};

use crate::error::{AppError, Result};

/// One catalog entry with its stock summary.
#[derive(Debug, Serialize)]
pub struct InventoryItem {
    #[serde(flatten)]
    pub product: Product,
    pub total_stock: i64,
}

/// Request body for a stock adjustment.
#[derive(Debug, Deserialize)]
pub struct StockAdjustRequest {
    pub flavor: String,
    /// Units to add; negative to write off
    pub delta: i64,
}

/// Response for a stock adjustment.
#[derive(Debug, Serialize)]
pub struct StockAdjustResponse {
    pub product_id: String,
    pub flavor: String,
    pub quantity: i64,
}

/// Query string for the order list.
#[derive(Debug, Default, Deserialize)]
pub struct OrdersQuery {
    /// Comma-separated statuses; all orders when omitted
    pub status: Option<String>,
}

impl OrdersQuery {
    /// Parse the status filter.
    pub fn statuses(&self) -> Result<Vec<OrderStatus>> {
        let Some(raw) = self.status.as_deref() else {
            return Ok(Vec::new());
        };

        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.parse().map_err(AppError::BadRequest))
            .collect()
    }
}

/// Request body for switching the operational mode.
#[derive(Debug, Deserialize)]
pub struct ModeRequest {
    /// `true` closes the shop
    pub enabled: bool,
    /// Label shown to customers while closed
    #[serde(default)]
    pub end_time: Option<String>,
}

pub async fn handle_inventory(shop: &Shop, _grant: &AdminGrant) -> Result<Vec<InventoryItem>> {
    let products = shop.catalog().products().await?;
    Ok(products
        .into_iter()
        .map(|product| InventoryItem {
            total_stock: product.total_stock(),
            product,
        })
        .collect())
}

pub async fn handle_upsert_product(
    shop: &Shop,
    grant: &AdminGrant,
    product: Product,
) -> Result<Product> {
    Ok(shop.catalog().upsert_product(grant, product).await?)
}

pub async fn handle_delete_product(
    shop: &Shop,
    grant: &AdminGrant,
    product_id: &str,
) -> Result<()> {
    Ok(shop.catalog().delete_product(grant, product_id).await?)
}

pub async fn handle_adjust_stock(
    shop: &Shop,
    grant: &AdminGrant,
    product_id: &str,
    request: StockAdjustRequest,
) -> Result<StockAdjustResponse> {
    let quantity = shop
        .catalog()
        .restock(grant, product_id, &request.flavor, request.delta)
        .await?;

    Ok(StockAdjustResponse {
        product_id: product_id.to_string(),
        flavor: request.flavor,
        quantity,
    })
}

pub async fn handle_orders(
    shop: &Shop,
    _grant: &AdminGrant,
    query: &OrdersQuery,
) -> Result<Vec<Order>> {
    Ok(shop.orders().orders(&query.statuses()?).await?)
}

pub async fn handle_confirm(shop: &Shop, grant: &AdminGrant, order_id: &str) -> Result<Order> {
    Ok(shop.orders().confirm(grant, order_id).await?)
}

pub async fn handle_cancel(shop: &Shop, grant: &AdminGrant, order_id: &str) -> Result<Order> {
    Ok(shop.orders().cancel(grant, order_id).await?)
}

pub async fn handle_mode(
    shop: &Shop,
    grant: &AdminGrant,
    request: ModeRequest,
) -> Result<ModeStatus> {
    let gate = shop.gate();
    let status = if request.enabled {
        gate.enable(grant, request.end_time).await?
    } else {
        gate.disable(grant).await?
    };
    Ok(status)
}
