//! dealership-api - gateway for the dealership web front end
//!
//! Serves the local car catalog, proxies dealer and review lookups to the
//! dealer service, enriches reviews with sentiment labels and manages user
//! sign-in sessions.

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter};

use dealership_api::clients::{DealerClient, SentimentClient};
use dealership_api::config::{Args, ServiceConfig};
use dealership_api::enrichment::ReviewEnricher;
use dealership_api::seeder::{CatalogSeeder, SeedOutcome};
use dealership_api::session::SessionStore;
use dealership_api::{build_router, AppState};
use dealership_common::db::init_database;

#[tokio::main]
async fn main() -> Result<()> {
    // Tracing comes up first so configuration problems are logged
    let env_filter = EnvFilter::try_from_default_env().ok();
    let from_env = env_filter.is_some();
    let (filter, filter_handle) =
        reload::Layer::new(env_filter.unwrap_or_else(|| EnvFilter::new("info,tower_http=info")));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = match ServiceConfig::resolve(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(anyhow::Error::new(e).context("Failed to load configuration"));
        }
    };

    // RUST_LOG wins over the configured level
    if !from_env {
        let directives = format!("{},tower_http=info", config.log_level);
        if let Err(e) = filter_handle.reload(EnvFilter::new(&directives)) {
            error!("Failed to apply log level {}: {}", config.log_level, e);
        }
    }

    // Build identification first, before any slow startup work
    info!(
        "Starting dealership-api v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    info!("Database path: {}", config.database_path.display());

    let pool = match init_database(&config.database_path).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to open database: {}", e);
            return Err(e.into());
        }
    };

    let seeder = CatalogSeeder::new(pool.clone())?;
    match seeder.ensure_populated().await? {
        SeedOutcome::Seeded { makes, models } => info!(
            "Seeded catalog v{}: {} makes, {} models",
            seeder.dataset_version(),
            makes,
            models
        ),
        SeedOutcome::AlreadyPopulated => info!("Catalog already populated"),
    }

    let dealers = DealerClient::new(&config.dealer_service_url, config.request_timeout)?;
    let sentiment = SentimentClient::new(&config.sentiment_service_url, config.request_timeout)?;
    info!("Dealer service: {}", config.dealer_service_url);
    info!("Sentiment service: {}", config.sentiment_service_url);

    let state = AppState::new(
        pool,
        seeder,
        Arc::new(dealers),
        ReviewEnricher::new(Arc::new(sentiment), config.sentiment_concurrency),
        SessionStore::new(config.session_ttl),
    );
    let app = build_router(state);

    let addr = config.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("dealership-api listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received terminate signal, shutting down"),
    }
}
