//! Error types for the caching layer
//!
//! Provides unified error handling using thiserror. None of these reach the
//! caller of a cached lookup: tier and payload failures are downgraded to
//! cache misses, and producer errors pass through untouched in their own type.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the caching layer.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Shared tier could not be reached or rejected the command
    #[error("Shared tier unavailable: {0}")]
    TierUnavailable(String),

    /// A cached payload could not be decoded
    #[error("Failed to decode cached payload: {0}")]
    Deserialization(String),

    /// A value could not be encoded for the shared tier
    #[error("Failed to encode value: {0}")]
    Serialization(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        CacheError::TierUnavailable(err.to_string())
    }
}

impl From<deadpool_redis::PoolError> for CacheError {
    fn from(err: deadpool_redis::PoolError) -> Self {
        CacheError::TierUnavailable(err.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::TierUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::Deserialization(_)
            | CacheError::Serialization(_)
            | CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the caching layer.
pub type Result<T> = std::result::Result<T, CacheError>;
