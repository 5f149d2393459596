//! HTTP route definitions.

mod admin;
mod catalog;
mod customer;
mod health;
mod ws;

use crate::AppState;
use axum::Router;

/// Create all application routes.
pub fn create_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(catalog::routes())
        .merge(customer::routes())
        .merge(admin::routes())
        .merge(ws::routes())
}
