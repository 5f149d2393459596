//! Public catalog routes.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use stockroom_engine::Product;

use crate::error::Result;
use crate::AppState;

/// Query string for the product list.
#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    pub category: Option<String>,
}

/// Create catalog routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/catalog", get(list_products))
        .route("/catalog/categories", get(list_categories))
        .route("/catalog/{product_id}", get(get_product))
}

/// GET /catalog - All products, or one category.
async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<Vec<Product>>> {
    let catalog = state.shop.catalog();
    let products = match query.category.as_deref() {
        Some(category) => catalog.products_in_category(category).await?,
        None => catalog.products().await?,
    };
    Ok(Json(products))
}

/// GET /catalog/categories - Distinct categories.
async fn list_categories(State(state): State<AppState>) -> Result<Json<Vec<String>>> {
    Ok(Json(state.shop.catalog().categories().await?))
}

/// GET /catalog/{product_id} - One product with live stock.
async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> Result<Json<Product>> {
    Ok(Json(state.shop.catalog().product(&product_id).await?))
}
