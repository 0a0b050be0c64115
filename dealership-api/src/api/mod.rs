//! HTTP API handlers for dealership-api

pub mod auth;
pub mod catalog;
pub mod dealers;
pub mod envelope;
pub mod health;
pub mod reviews;

use axum::{
    routing::{get, post},
    Router,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub use envelope::Envelope;
pub use health::health_routes;

/// Message for a body that is not JSON at all
pub const INVALID_JSON: &str = "Invalid JSON data";

/// Message for a JSON body lacking a required key
pub const MISSING_FIELDS: &str = "Missing required fields";

/// Decode a request body
///
/// Syntax errors and shape errors are reported separately.
pub fn parse_json<T: DeserializeOwned>(body: &[u8]) -> ApiResult<T> {
    let value: Value = serde_json::from_slice(body).map_err(|e| {
        tracing::debug!("Rejecting request body: {}", e);
        ApiError::Validation(INVALID_JSON.to_string())
    })?;

    serde_json::from_value(value).map_err(|e| {
        tracing::debug!("Request body missing fields: {}", e);
        ApiError::Validation(MISSING_FIELDS.to_string())
    })
}

/// Catalog, dealer and review routes
pub fn gateway_routes() -> Router<AppState> {
    Router::new()
        .route("/api/cars", get(catalog::list_cars))
        .route("/api/dealers", get(dealers::list_dealers))
        .route("/api/dealers/region/:region", get(dealers::list_dealers_by_region))
        .route("/api/dealer/:dealer_id", get(dealers::get_dealer))
        .route("/api/dealer/:dealer_id/reviews", get(dealers::list_reviews))
        .route(
            "/api/reviews",
            post(reviews::add_review).fallback(reviews::method_not_allowed),
        )
}

/// Sign-in, sign-out and registration routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/login", post(auth::login))
        .route("/api/logout", get(auth::logout).post(auth::logout))
        .route("/api/register", post(auth::register))
}
