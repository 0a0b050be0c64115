//! Error types for dealership-api
//!
//! Every handler failure maps onto one of these variants, and every variant
//! renders as the same `{status, message}` JSON envelope. Nothing reaches the
//! transport layer as a bare fault.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::clients::dealer::UpstreamError;
use crate::seeder::SeedError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed request fields, or a review the dealer service refused (400)
    #[error("{0}")]
    Validation(String),

    /// No authenticated principal (401)
    #[error("{0}")]
    Unauthorized(String),

    /// Dealer service has no matching record (404)
    #[error("{0}")]
    NotFound(String),

    /// Wrong HTTP verb for the operation (405)
    #[error("{0}")]
    MethodNotAllowed(String),

    /// Transport or response-shape failure talking to a remote service (500)
    #[error("{0}")]
    Upstream(String),

    /// Catalog seeding could not complete (500)
    #[error("Catalog seeding failed: {0}")]
    SeedConflict(String),

    /// Anything else (500)
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP status carried in both the response line and the envelope
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Upstream(_) | ApiError::SeedConflict(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<UpstreamError> for ApiError {
    fn from(err: UpstreamError) -> Self {
        ApiError::Upstream(err.to_string())
    }
}

impl From<SeedError> for ApiError {
    fn from(err: SeedError) -> Self {
        match err {
            SeedError::Conflict(msg) => ApiError::SeedConflict(msg),
            other => ApiError::SeedConflict(other.to_string()),
        }
    }
}

impl From<dealership_common::Error> for ApiError {
    fn from(err: dealership_common::Error) -> Self {
        use dealership_common::Error as E;
        match err {
            E::NotFound(msg) => ApiError::NotFound(msg),
            E::InvalidInput(msg) | E::Conflict(msg) => ApiError::Validation(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(status = status.as_u16(), "Request failed: {}", self);
        }

        let body = Json(json!({
            "status": status.as_u16(),
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
