/// Application routes configuration
use crate::handlers::{
    get_metrics, get_satellite, get_satellite_gauges, get_satellite_history, get_satellites,
    get_trend, health, stream_metrics, stream_satellites, stream_trend, AppState,
};
use axum::{routing::get, Router};

/// Build the application router with all routes
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health))
        // Satellite endpoints
        .route("/satellites", get(get_satellites))
        .route("/satellites/history", get(get_satellite_history))
        .route("/satellites/:id", get(get_satellite))
        .route("/satellites/:id/gauges", get(get_satellite_gauges))
        // Fleet aggregates
        .route("/metrics", get(get_metrics))
        .route("/trend", get(get_trend))
        // Live streams
        .route("/stream/satellites", get(stream_satellites))
        .route("/stream/metrics", get(stream_metrics))
        .route("/stream/trend", get(stream_trend))
        .with_state(state)
}
