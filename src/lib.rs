//! MiMo Relay - thin chat-completion relay for browser apps
//!
//! Forwards chat-completion requests from a single-page application to an
//! LLM provider, keeping the provider API key on the server and answering
//! the browser's cross-origin checks. Buffered JSON answers and live event
//! streams are both relayed.

pub mod config;
pub mod error;
pub mod proxy;
pub mod relay;
pub mod routes;
pub mod streaming;

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;

pub use crate::config::{Config, ProviderConfig};
pub use crate::error::{RelayError, RelayResult};
pub use crate::proxy::{HttpUpstream, UpstreamClient};
pub use crate::relay::{InboundRequest, Relay};

/// Application state shared across all request handlers
pub struct AppState {
    pub config: Config,
    pub start_time: Instant,
    /// Client used for every provider call
    pub upstream: Arc<dyn UpstreamClient>,
    /// Relay bound to the relay provider's configuration
    pub relay: Relay,
}

impl AppState {
    /// Create a new application state
    pub fn new(config: Config) -> Result<Self> {
        // Initialize HTTP client with connection pooling
        let http_client = reqwest::Client::builder()
            .pool_max_idle_per_host(100)
            .build()?;

        let upstream: Arc<dyn UpstreamClient> = Arc::new(HttpUpstream::new(http_client));

        Ok(Self::with_upstream(config, upstream))
    }

    /// Create the application state around a given upstream client
    ///
    /// Lets tests substitute a fake provider.
    pub fn with_upstream(config: Config, upstream: Arc<dyn UpstreamClient>) -> Self {
        let relay = Relay::new(Arc::new(config.relay.clone()), upstream.clone());

        Self {
            config,
            start_time: Instant::now(),
            upstream,
            relay,
        }
    }
}
