//! Notifier that pushes engine notifications over open sockets.

use std::sync::Arc;

use async_trait::async_trait;
use stockroom_engine::{CustomerId, Notifier, NotifyError, Recipient};

use super::{ConnectionManager, ServerMessage};

/// Delivers notices and answers to connected WebSocket clients.
#[derive(Debug, Clone)]
pub struct SocketNotifier {
    conn_manager: Arc<ConnectionManager>,
}

impl SocketNotifier {
    pub fn new(conn_manager: Arc<ConnectionManager>) -> Self {
        Self { conn_manager }
    }
}

#[async_trait]
impl Notifier for SocketNotifier {
    async fn notify(&self, to: Recipient, text: &str) -> Result<(), NotifyError> {
        match self.conn_manager.send_to(to, ServerMessage::notice(text)) {
            0 => Err(NotifyError(format!("no open connection for {to:?}"))),
            _ => Ok(()),
        }
    }

    async fn answer(
        &self,
        customer_id: CustomerId,
        query_id: &str,
        text: &str,
    ) -> Result<(), NotifyError> {
        let message = ServerMessage::Answer {
            request_id: query_id.to_string(),
            text: text.to_string(),
        };
        match self
            .conn_manager
            .send_to(Recipient::Customer(customer_id), message)
        {
            0 => Err(NotifyError(format!(
                "no open connection for customer {customer_id}"
            ))),
            _ => Ok(()),
        }
    }
}
