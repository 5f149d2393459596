//! WebSocket upgrade routes.

use axum::{
    extract::{Query, State, WebSocketUpgrade},
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Deserialize;
use stockroom_engine::{CustomerId, Recipient};

use crate::auth::AdminPassword;
use crate::error::Result;
use crate::handlers::{handle_websocket_connection, now};
use crate::AppState;

/// Query string for a customer session.
#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    pub customer_id: CustomerId,
}

/// Create WebSocket routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(customer_socket))
        .route("/admin/ws", get(operator_socket))
}

/// GET /ws?customer_id= - Live cart session for one customer.
async fn customer_socket(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let recipient = Recipient::Customer(query.customer_id);
    ws.on_upgrade(move |socket| handle_websocket_connection(socket, state, recipient))
}

/// GET /admin/ws - Operator notification feed.
async fn operator_socket(
    State(state): State<AppState>,
    password: AdminPassword,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse> {
    password.authorize(&state.admin, now())?;
    Ok(ws.on_upgrade(move |socket| {
        handle_websocket_connection(socket, state, Recipient::Operators)
    }))
}
