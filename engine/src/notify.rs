//! Outbound notifications.
//!
//! The engine only ever says "tell this person this"; the transport decides
//! how. Delivery is fire-and-forget: a failed notification is logged and
//! never blocks or fails a reservation.

use crate::CustomerId;
use async_trait::async_trait;
use parking_lot::Mutex;
use thiserror::Error;

/// Who a notification is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Recipient {
    /// One customer
    Customer(CustomerId),
    /// Every connected operator
    Operators,
}

/// Delivery failure reported by a transport.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("notification not delivered: {0}")]
pub struct NotifyError(pub String);

/// Transport capability for reaching customers and operators.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send a standalone message.
    async fn notify(&self, to: Recipient, text: &str) -> Result<(), NotifyError>;

    /// Answer an interactive query in place (e.g. a button press).
    async fn answer(
        &self,
        customer_id: CustomerId,
        query_id: &str,
        text: &str,
    ) -> Result<(), NotifyError>;
}

/// A customer interaction the engine is responding to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interaction {
    /// A typed command; answered with a new message
    Message { customer_id: CustomerId },
    /// A button press; answered in place
    Callback {
        customer_id: CustomerId,
        query_id: String,
    },
}

impl Interaction {
    /// Customer behind the interaction.
    pub fn customer_id(&self) -> CustomerId {
        match self {
            Interaction::Message { customer_id } => *customer_id,
            Interaction::Callback { customer_id, .. } => *customer_id,
        }
    }
}

/// Reply to an interaction the way its kind expects.
///
/// Failures are logged and swallowed.
pub async fn respond(notifier: &dyn Notifier, interaction: &Interaction, text: &str) {
    let result = match interaction {
        Interaction::Message { customer_id } => {
            notifier.notify(Recipient::Customer(*customer_id), text).await
        }
        Interaction::Callback {
            customer_id,
            query_id,
        } => notifier.answer(*customer_id, query_id, text).await,
    };

    if let Err(e) = result {
        tracing::warn!(customer_id = interaction.customer_id(), error = %e, "Failed to respond");
    }
}

/// Send a notification, logging instead of failing.
pub(crate) async fn deliver(notifier: &dyn Notifier, to: Recipient, text: &str) {
    if let Err(e) = notifier.notify(to, text).await {
        tracing::warn!(recipient = ?to, error = %e, "Failed to deliver notification");
    }
}

/// Notifier that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn notify(&self, _to: Recipient, _text: &str) -> Result<(), NotifyError> {
        Ok(())
    }

    async fn answer(
        &self,
        _customer_id: CustomerId,
        _query_id: &str,
        _text: &str,
    ) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// A delivered notification, as seen by [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Notice { to: Recipient, text: String },
    Answer { query_id: String, text: String },
}

/// Notifier that keeps everything it was asked to send.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Delivery>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything delivered so far.
    pub fn deliveries(&self) -> Vec<Delivery> {
        self.sent.lock().clone()
    }

    /// Notices sent to one recipient.
    pub fn notices_for(&self, to: Recipient) -> Vec<String> {
        self.sent
            .lock()
            .iter()
            .filter_map(|d| match d {
                Delivery::Notice { to: r, text } if *r == to => Some(text.clone()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, to: Recipient, text: &str) -> Result<(), NotifyError> {
        self.sent.lock().push(Delivery::Notice {
            to,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn answer(
        &self,
        _customer_id: CustomerId,
        query_id: &str,
        text: &str,
    ) -> Result<(), NotifyError> {
        self.sent.lock().push(Delivery::Answer {
            query_id: query_id.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }
}
