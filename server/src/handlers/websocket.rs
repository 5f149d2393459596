//! WebSocket handler for live cart sessions.
//!
//! Dispatches customer messages to the cart handlers. Data (cart, order)
//! goes straight back on the socket; the human-readable outcome goes through
//! the notifier, as a notice or an in-place answer depending on whether the
//! message carried a request ID.

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use stockroom_engine::{respond, Interaction, Recipient};
use tokio::sync::mpsc;

use crate::error::AppError;
use crate::websocket::{ClientMessage, ServerMessage, SocketNotifier};
use crate::AppState;

use super::{
    handle_add, handle_cart, handle_checkout, handle_clear, handle_remove, now, AddItemRequest,
    RemoveItemRequest,
};

/// Handle an established WebSocket connection.
///
/// This function:
/// 1. Registers the connection with the manager
/// 2. Spawns a task to forward outgoing messages
/// 3. Processes incoming messages in a loop
/// 4. Cleans up on disconnect
pub async fn handle_websocket_connection(socket: WebSocket, state: AppState, recipient: Recipient) {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    let conn_manager = state.conn_manager.clone();
    let conn_id = conn_manager.register(recipient, tx);

    tracing::info!(conn_id = %conn_id, recipient = ?recipient, "WebSocket client connected");

    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(text) => {
                    if let Err(e) = ws_sender.send(Message::Text(text.into())).await {
                        tracing::warn!("Failed to send WebSocket message: {}", e);
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!("Failed to serialize WebSocket message: {}", e);
                }
            }
        }
    });

    while let Some(result) = ws_receiver.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if let Some(response) = process_message(&text, &state, recipient).await {
                    conn_manager.send_to_connection(&conn_id, response);
                }
            }
            Ok(Message::Binary(_)) => {
                tracing::warn!("Binary messages not supported");
            }
            Ok(Message::Ping(data)) => {
                tracing::trace!("Received ping: {} bytes", data.len());
            }
            Ok(Message::Pong(_)) => {
                tracing::trace!("Received pong");
            }
            Ok(Message::Close(_)) => {
                tracing::info!(conn_id = %conn_id, "WebSocket close frame received");
                break;
            }
            Err(e) => {
                tracing::warn!(conn_id = %conn_id, "WebSocket error: {}", e);
                break;
            }
        }
    }

    conn_manager.unregister(&conn_id);
    send_task.abort();

    tracing::info!(
        conn_id = %conn_id,
        active_connections = conn_manager.connection_count(),
        "WebSocket client disconnected"
    );
}

/// Process a client message and return the direct reply, if any.
pub async fn process_message(
    text: &str,
    state: &AppState,
    recipient: Recipient,
) -> Option<ServerMessage> {
    let client_msg: ClientMessage = match serde_json::from_str(text) {
        Ok(msg) => msg,
        Err(e) => {
            return Some(ServerMessage::error(
                format!("Invalid message format: {}", e),
                None,
            ));
        }
    };

    if matches!(client_msg, ClientMessage::Ping) {
        return Some(ServerMessage::Pong);
    }

    let Recipient::Customer(customer_id) = recipient else {
        return Some(ServerMessage::error(
            "Operator connections only receive notifications",
            client_msg.request_id(),
        ));
    };

    let interaction = client_msg.interaction(customer_id);
    let request_id = client_msg.request_id();
    let shop = &state.shop;

    let outcome = match client_msg {
        ClientMessage::Add {
            product_id,
            flavor,
            quantity,
            ..
        } => {
            let request = AddItemRequest {
                product_id,
                flavor: flavor.clone(),
                quantity,
            };
            handle_add(shop, customer_id, request, now())
                .await
                .map(|cart| {
                    (
                        ServerMessage::Cart {
                            cart,
                            request_id: request_id.clone(),
                        },
                        format!("{flavor} added to your cart."),
                    )
                })
        }
        ClientMessage::Remove {
            product_id, flavor, ..
        } => handle_remove(shop, customer_id, RemoveItemRequest { product_id, flavor })
            .await
            .map(|cart| {
                (
                    ServerMessage::Cart {
                        cart,
                        request_id: request_id.clone(),
                    },
                    "Removed from your cart.".to_string(),
                )
            }),
        ClientMessage::Clear { .. } => handle_clear(shop, customer_id).await.map(|cart| {
            (
                ServerMessage::Cart {
                    cart,
                    request_id: request_id.clone(),
                },
                "Your cart is empty.".to_string(),
            )
        }),
        ClientMessage::Cart { .. } => {
            return match handle_cart(shop, customer_id).await {
                Ok(cart) => Some(ServerMessage::Cart { cart, request_id }),
                Err(e) => Some(ServerMessage::error(e.to_string(), request_id)),
            };
        }
        ClientMessage::Checkout { .. } => {
            handle_checkout(shop, customer_id, now()).await.map(|order| {
                let text = format!("Order {} placed, we will confirm it shortly.", order.id);
                (
                    ServerMessage::Order {
                        order,
                        request_id: request_id.clone(),
                    },
                    text,
                )
            })
        }
        ClientMessage::Ping => return Some(ServerMessage::Pong),
    };

    let notifier = SocketNotifier::new(state.conn_manager.clone());
    match outcome {
        Ok((reply, text)) => {
            respond(&notifier, &interaction, &text).await;
            Some(reply)
        }
        Err(AppError::Engine(e)) => {
            reply_with_error(&notifier, &interaction, &e.user_message()).await;
            None
        }
        Err(e) => Some(ServerMessage::error(e.to_string(), request_id)),
    }
}

async fn reply_with_error(notifier: &SocketNotifier, interaction: &Interaction, text: &str) {
    tracing::debug!(customer_id = interaction.customer_id(), reply = %text, "Request refused");
    respond(notifier, interaction, text).await;
}
