//! Unified error handling for the server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use stockroom_engine::Error as EngineError;

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Invalid request: {0}")]
    BadRequest(String),
}

/// Error response body.
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

/// Status code for an engine error.
pub fn engine_status(error: &EngineError) -> StatusCode {
    match error {
        EngineError::NotFound(_) => StatusCode::NOT_FOUND,
        EngineError::VariantUnavailable { .. }
        | EngineError::InsufficientStock { .. }
        | EngineError::EmptyCart
        | EngineError::InvalidTransition { .. } => StatusCode::CONFLICT,
        EngineError::OperationalModeClosed { .. } => StatusCode::SERVICE_UNAVAILABLE,
        EngineError::InvalidQuantity | EngineError::InvalidCatalog(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        EngineError::Unauthorized => StatusCode::UNAUTHORIZED,
        EngineError::LockedOut { .. } => StatusCode::LOCKED,
        EngineError::PersistenceFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, details) = match &self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                    None,
                )
            }
            AppError::Engine(e) => {
                let status = engine_status(e);
                if status.is_server_error() && status != StatusCode::SERVICE_UNAVAILABLE {
                    tracing::error!("Engine error: {:?}", e);
                } else {
                    tracing::debug!("Engine error: {:?}", e);
                }
                let details = match e {
                    EngineError::OperationalModeClosed { end_time } => end_time.clone(),
                    EngineError::LockedOut { retry_after_secs } => {
                        Some(format!("retry after {retry_after_secs}s"))
                    }
                    _ => None,
                };
                (status, e.user_message(), details)
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
        };

        let body = Json(ErrorResponse {
            error: error_message,
            details,
        });

        (status, body).into_response()
    }
}

/// Result type alias for handlers.
pub type Result<T> = std::result::Result<T, AppError>;
