//! WebSocket message protocol definitions.
//!
//! All messages are JSON-encoded and use snake_case for field names.

use serde::{Deserialize, Serialize};
use stockroom_engine::{CustomerId, Interaction, Order};

use crate::handlers::CartView;

/// Messages sent from client to server.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Reserve units of a variant.
    Add {
        product_id: String,
        flavor: String,
        /// Units to add, 1 when omitted
        #[serde(default)]
        quantity: Option<u32>,
        /// Request ID for correlating responses
        #[serde(default)]
        request_id: Option<String>,
    },

    /// Take one unit of a product off the cart.
    Remove {
        product_id: String,
        #[serde(default)]
        flavor: Option<String>,
        #[serde(default)]
        request_id: Option<String>,
    },

    /// Empty the cart.
    Clear {
        #[serde(default)]
        request_id: Option<String>,
    },

    /// Fetch the current cart.
    Cart {
        #[serde(default)]
        request_id: Option<String>,
    },

    /// Turn the cart into an order.
    Checkout {
        #[serde(default)]
        request_id: Option<String>,
    },

    /// Keep-alive ping.
    Ping,
}

impl ClientMessage {
    /// How replies to this message are delivered.
    ///
    /// A message carrying a request ID is answered in place, like a button
    /// press; one without is answered with a standalone notice.
    pub fn interaction(&self, customer_id: CustomerId) -> Interaction {
        let request_id = match self {
            ClientMessage::Add { request_id, .. }
            | ClientMessage::Remove { request_id, .. }
            | ClientMessage::Clear { request_id }
            | ClientMessage::Cart { request_id }
            | ClientMessage::Checkout { request_id } => request_id.clone(),
            ClientMessage::Ping => None,
        };

        match request_id {
            Some(query_id) => Interaction::Callback {
                customer_id,
                query_id,
            },
            None => Interaction::Message { customer_id },
        }
    }

    /// Request ID, if the client sent one.
    pub fn request_id(&self) -> Option<String> {
        match self.interaction(0) {
            Interaction::Callback { query_id, .. } => Some(query_id),
            Interaction::Message { .. } => None,
        }
    }
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Current state of the customer's cart.
    Cart {
        cart: CartView,
        /// Request ID from the original request
        #[serde(skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
    },

    /// An order placed by this customer.
    Order {
        order: Order,
        #[serde(skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
    },

    /// Standalone notification.
    Notice { text: String },

    /// In-place answer to a request.
    Answer { request_id: String, text: String },

    /// Response to ping.
    Pong,

    /// Malformed or unsupported request.
    Error {
        /// Error description
        message: String,
        /// Request ID from the original request (if applicable)
        #[serde(skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
    },
}

impl ServerMessage {
    /// Create an error message.
    pub fn error(message: impl Into<String>, request_id: Option<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
            request_id,
        }
    }

    /// Create a notice.
    pub fn notice(text: impl Into<String>) -> Self {
        ServerMessage::Notice { text: text.into() }
    }
}
