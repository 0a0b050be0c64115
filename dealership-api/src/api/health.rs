//! Health check endpoint

use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub module: &'static str,
    pub version: &'static str,
    pub git_hash: &'static str,
    pub built_at: &'static str,
}

/// GET /health
///
/// Answers without touching the database or the remote services.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        module: "dealership-api",
        version: env!("CARGO_PKG_VERSION"),
        git_hash: env!("GIT_HASH"),
        built_at: env!("BUILD_TIMESTAMP"),
    })
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
