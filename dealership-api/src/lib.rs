//! dealership-api library
//!
//! HTTP gateway in front of the local car catalog, the remote dealer/review
//! service and the sentiment service.

use axum::Router;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod clients;
pub mod config;
pub mod enrichment;
pub mod error;
pub mod seeder;
pub mod session;

use clients::DealerApi;
use enrichment::ReviewEnricher;
use seeder::CatalogSeeder;
use session::SessionStore;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Catalog and identity store
    pub db: SqlitePool,
    pub seeder: CatalogSeeder,
    /// Remote dealer/review service
    pub dealers: Arc<dyn DealerApi>,
    pub enricher: Arc<ReviewEnricher>,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        seeder: CatalogSeeder,
        dealers: Arc<dyn DealerApi>,
        enricher: ReviewEnricher,
        sessions: SessionStore,
    ) -> Self {
        Self {
            db,
            seeder,
            dealers,
            enricher: Arc::new(enricher),
            sessions,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::gateway_routes())
        .merge(api::auth_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
