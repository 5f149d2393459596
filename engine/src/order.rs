//! Order types.

use crate::{CartLine, CustomerId, OrderId, Price, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Placed by the customer, waiting for the operator
    Pending,
    /// Accepted by the operator
    Confirmed,
    /// Rejected or cancelled; stock has been handed back
    Cancelled,
}

impl OrderStatus {
    /// Statuses that count as "open" for the auto-close threshold.
    pub const OPEN: [OrderStatus; 2] = [OrderStatus::Pending, OrderStatus::Confirmed];

    /// Check whether an order may move from this status to `next`.
    ///
    /// `pending -> confirmed`, `pending -> cancelled` and
    /// `confirmed -> cancelled` are allowed; cancelled is terminal.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::Confirmed)
                | (OrderStatus::Pending, OrderStatus::Cancelled)
                | (OrderStatus::Confirmed, OrderStatus::Cancelled)
        )
    }

    /// Lowercase name as persisted.
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

/// A placed order: a snapshot of the cart lines at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    #[serde(rename = "user_id")]
    pub customer_id: CustomerId,
    pub items: Vec<CartLine>,
    pub status: OrderStatus,
    pub created_at: Timestamp,
}

impl Order {
    /// Total price of the order.
    pub fn total(&self) -> Price {
        self.items.iter().map(CartLine::subtotal).sum()
    }

    /// Check whether the order still counts towards the auto-close threshold.
    pub fn is_open(&self) -> bool {
        OrderStatus::OPEN.contains(&self.status)
    }
}
