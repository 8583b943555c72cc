//! Error types for the order pipeline
//!
//! Provides unified error handling using thiserror.
//!
//! The taxonomy maps directly onto the pipeline's failure policies: decode
//! and validation errors are dropped permanently, storage errors leave the
//! message for redelivery, and NotFound is a normal read-path outcome.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Order Error Enum ==
/// Unified error type for the order pipeline.
#[derive(Error, Debug)]
pub enum OrderError {
    /// Payload is not well-formed JSON
    #[error("invalid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    /// Payload decoded but violates a required-field invariant;
    /// the message names the first violated field
    #[error("{0}")]
    Validation(String),

    /// Transaction or relation-write failure in the storage engine
    #[error("storage error: {0}")]
    Storage(String),

    /// Order absent from both cache and storage
    #[error("order not found: {0}")]
    NotFound(String),

    /// Broker poll or acknowledgment failure
    #[error("broker error: {0}")]
    Broker(String),
}

impl From<sqlx::Error> for OrderError {
    fn from(err: sqlx::Error) -> Self {
        OrderError::Storage(err.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for OrderError {
    fn into_response(self) -> Response {
        let status = match &self {
            OrderError::NotFound(_) => StatusCode::NOT_FOUND,
            OrderError::Decode(_) | OrderError::Validation(_) => StatusCode::BAD_REQUEST,
            OrderError::Storage(_) | OrderError::Broker(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the order pipeline.
pub type Result<T> = std::result::Result<T, OrderError>;
