//! WebSocket connection manager.
//!
//! Tracks active WebSocket connections by who is on the other end, so
//! notifications can reach a customer or every operator.

use std::sync::Arc;

use dashmap::DashMap;
use stockroom_engine::Recipient;
use tokio::sync::mpsc;

use super::ServerMessage;

/// Sender for WebSocket messages.
pub type MessageSender = mpsc::UnboundedSender<ServerMessage>;

/// A single WebSocket connection.
#[derive(Debug)]
pub struct Connection {
    /// Who is connected
    pub recipient: Recipient,
    /// Channel to send messages to this connection
    pub sender: MessageSender,
}

/// Manages active WebSocket connections.
///
/// Thread-safe and can be shared across handlers via `Arc`.
#[derive(Debug, Default)]
pub struct ConnectionManager {
    /// All active connections, keyed by connection ID.
    connections: DashMap<String, Connection>,
    /// Index of connection IDs by recipient.
    by_recipient: DashMap<Recipient, Vec<String>>,
}

impl ConnectionManager {
    /// Create a new connection manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new connection manager wrapped in Arc for sharing.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Register a new connection.
    ///
    /// Returns the connection ID.
    pub fn register(&self, recipient: Recipient, sender: MessageSender) -> String {
        let conn_id = uuid::Uuid::new_v4().to_string();

        self.connections
            .insert(conn_id.clone(), Connection { recipient, sender });
        self.by_recipient
            .entry(recipient)
            .or_default()
            .push(conn_id.clone());

        tracing::info!(
            conn_id = %conn_id,
            recipient = ?recipient,
            "WebSocket connection registered"
        );

        conn_id
    }

    /// Unregister a connection.
    pub fn unregister(&self, conn_id: &str) {
        if let Some((_, conn)) = self.connections.remove(conn_id) {
            if let Some(mut conn_ids) = self.by_recipient.get_mut(&conn.recipient) {
                conn_ids.retain(|id| id != conn_id);
                // Clean up empty entries
                if conn_ids.is_empty() {
                    drop(conn_ids);
                    self.by_recipient.remove(&conn.recipient);
                }
            }

            tracing::info!(
                conn_id = %conn_id,
                recipient = ?conn.recipient,
                "WebSocket connection unregistered"
            );
        }
    }

    /// Send a message to every connection of one recipient.
    ///
    /// Returns the number of connections that received the message.
    pub fn send_to(&self, recipient: Recipient, message: ServerMessage) -> usize {
        let conn_ids = match self.by_recipient.get(&recipient) {
            Some(ids) => ids.clone(),
            None => return 0,
        };

        let mut sent_count = 0;
        for conn_id in conn_ids {
            if let Some(conn) = self.connections.get(&conn_id) {
                if conn.sender.send(message.clone()).is_ok() {
                    sent_count += 1;
                }
            }
        }

        tracing::debug!(
            recipient = ?recipient,
            recipients = sent_count,
            "Sent message to connections"
        );

        sent_count
    }

    /// Send a message to one connection (used by the socket handler).
    pub(crate) fn send_to_connection(&self, conn_id: &str, message: ServerMessage) {
        if let Some(conn) = self.connections.get(conn_id) {
            let _ = conn.sender.send(message);
        }
    }

    /// Get the number of active connections.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Get the number of distinct recipients connected.
    pub fn recipient_count(&self) -> usize {
        self.by_recipient.len()
    }
}
