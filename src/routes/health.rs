//! Health check endpoint
//!
//! Liveness probe. Reports whether each provider has a key without ever
//! exposing the key itself.

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

/// Health status enum
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
    pub timestamp: String,
    pub relay_configured: bool,
    pub chat_configured: bool,
}

/// Health check endpoint
///
/// Degraded when the relay provider has no key, since every relayed
/// request would fail.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let relay_configured = state.config.relay.is_configured();

    Json(HealthResponse {
        status: if relay_configured {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        relay_configured,
        chat_configured: state.config.chat.is_configured(),
    })
}
