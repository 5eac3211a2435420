//! HTTP routes for the relay
//!
//! This module defines all HTTP endpoints exposed by the service.

pub mod chat;
pub mod health;
pub mod metrics;
pub mod relay;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::AppState;

/// Create the main application router
///
/// Every path not listed here goes to the relay, which does its own method
/// gating and CORS handling. Listed paths hand methods they do not serve to
/// the relay as well, so preflights and the JSON 405 work everywhere.
pub fn create_router(state: Arc<AppState>) -> Router {
    let max_request_bytes = state.config.max_request_bytes;

    // The prompt chat endpoint answers any origin, like a stock cors() setup
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let chat_routes = Router::new()
        .route(
            "/api/chat",
            post(chat::prompt_chat).fallback(relay::relay_handler),
        )
        .layer(cors);

    // Public routes (health checks, metrics)
    let public_routes = Router::new()
        .route(
            "/health",
            get(health::health_check).fallback(relay::relay_handler),
        )
        .route(
            "/metrics",
            get(metrics::prometheus_metrics).fallback(relay::relay_handler),
        );

    Router::new()
        .merge(public_routes)
        .merge(chat_routes)
        .fallback(relay::relay_handler)
        .layer(DefaultBodyLimit::max(max_request_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
