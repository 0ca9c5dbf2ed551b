/// Fleet telemetry feed service entry point
mod config;
mod domain;
mod errors;
mod feed;
mod handlers;
mod repo;
mod routes;
mod services;
mod sources;
mod utils;

use crate::config::AppConfig;
use crate::feed::TelemetryFeed;
use crate::handlers::AppState;
use crate::routes::build_router;
use crate::services::FeedService;
use crate::sources::{SystemClock, UniformPerturbation};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    // Load configuration
    let config = AppConfig::from_env()?;
    info!("Configuration loaded successfully");

    // Build the feed
    let perturbation =
        UniformPerturbation::new(config.feed.perturbation_span, config.feed.seed)?;
    let feed = TelemetryFeed::seeded(
        config.feed.settings(),
        Box::new(perturbation),
        Arc::new(SystemClock),
    )?;
    let feed_service = Arc::new(FeedService::new(feed));

    // Start background ticking
    feed_service.start(config.feed.tick_period());

    // Initialize application state
    let state = AppState {
        feed_service: feed_service.clone(),
    };

    // Build router
    let app = build_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("fleet_telemetry service listening on {}", config.bind_addr);

    let served = axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await;

    if feed_service.is_running() {
        feed_service.stop().await;
        info!("Telemetry feed stopped");
    }

    served?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {:?}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
