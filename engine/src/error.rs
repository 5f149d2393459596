//! Error types for the Stockroom engine.

use crate::{OrderStatus, ProductId};
use thiserror::Error;

/// All possible errors from the Stockroom engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // Lookup errors
    #[error("not found: {0}")]
    NotFound(String),

    #[error("variant '{flavor}' is unavailable for product {product_id}")]
    VariantUnavailable {
        product_id: ProductId,
        flavor: String,
    },

    // Reservation errors
    #[error("insufficient stock for '{flavor}': requested {requested}, available {available}")]
    InsufficientStock {
        flavor: String,
        requested: i64,
        available: i64,
    },

    #[error("persistence failure: {0}")]
    PersistenceFailure(String),

    #[error("shop is closed until {}", end_time.as_deref().unwrap_or("further notice"))]
    OperationalModeClosed { end_time: Option<String> },

    // Input errors
    #[error("quantity must be at least 1")]
    InvalidQuantity,

    #[error("cart is empty")]
    EmptyCart,

    #[error("invalid order transition: {from} -> {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),

    // Admin errors
    #[error("unauthorized")]
    Unauthorized,

    #[error("admin access locked, retry in {retry_after_secs}s")]
    LockedOut { retry_after_secs: u64 },
}

impl Error {
    /// Short customer-facing message for this error kind.
    ///
    /// Never includes internal identifiers or backend details.
    pub fn user_message(&self) -> String {
        match self {
            Error::NotFound(_) => "This item could not be found.".to_string(),
            Error::VariantUnavailable { flavor, .. } => {
                format!("{flavor} is no longer available.")
            }
            Error::InsufficientStock { flavor, .. } => {
                format!("Not enough {flavor} left in stock.")
            }
            Error::PersistenceFailure(_) => {
                "Something went wrong, please try again.".to_string()
            }
            Error::OperationalModeClosed { end_time: Some(end) } => {
                format!("The shop is closed until {end}.")
            }
            Error::OperationalModeClosed { end_time: None } => {
                "The shop is closed for now.".to_string()
            }
            Error::InvalidQuantity => "Please choose at least one item.".to_string(),
            Error::EmptyCart => "Your cart is empty.".to_string(),
            Error::InvalidTransition { .. } => {
                "This order can no longer be changed.".to_string()
            }
            Error::InvalidCatalog(_) => "The catalog could not be loaded.".to_string(),
            Error::Unauthorized => "Wrong password.".to_string(),
            Error::LockedOut { .. } => "Too many attempts, try again later.".to_string(),
        }
    }
}

/// Error raised by a store backend.
///
/// Backends normalize their native errors (connectivity, timeouts, decoding)
/// into this type; the engine never sees a raw driver error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("corrupt document: {0}")]
    Corrupt(String),
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        Error::PersistenceFailure(err.to_string())
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = Error::NotFound("product pod-1".into());
        assert_eq!(err.to_string(), "not found: product pod-1");

        let err = Error::InsufficientStock {
            flavor: "Mint".into(),
            requested: 2,
            available: 1,
        };
        assert_eq!(
            err.to_string(),
            "insufficient stock for 'Mint': requested 2, available 1"
        );

        let err = Error::OperationalModeClosed {
            end_time: Some("18:00 01.02.2024".into()),
        };
        assert_eq!(err.to_string(), "shop is closed until 18:00 01.02.2024");

        let err = Error::InvalidTransition {
            from: OrderStatus::Cancelled,
            to: OrderStatus::Confirmed,
        };
        assert_eq!(
            err.to_string(),
            "invalid order transition: cancelled -> confirmed"
        );
    }

    #[test]
    fn store_error_becomes_persistence_failure() {
        let err: Error = StoreError::Unavailable("connection reset".into()).into();
        assert!(matches!(err, Error::PersistenceFailure(_)));
    }

    #[test]
    fn user_messages_are_distinct_and_clean() {
        let errors = [
            Error::NotFound("product secret-id".into()),
            Error::VariantUnavailable {
                product_id: "secret-id".into(),
                flavor: "Mint".into(),
            },
            Error::InsufficientStock {
                flavor: "Mint".into(),
                requested: 1,
                available: 0,
            },
            Error::PersistenceFailure("pool timed out".into()),
            Error::OperationalModeClosed { end_time: None },
        ];

        let messages: Vec<String> = errors.iter().map(Error::user_message).collect();
        for (i, a) in messages.iter().enumerate() {
            assert!(!a.contains("secret-id"));
            assert!(!a.contains("pool"));
            for b in &messages[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
