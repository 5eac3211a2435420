//! Configuration management for the relay
//!
//! Configuration is loaded from environment variables once at startup and
//! shared read-only with every request handler.

use anyhow::{Context, Result};
use std::env;

/// Default upstream for the relay endpoint
pub const DEFAULT_MIMO_BASE_URL: &str = "https://api.xiaomimimo.com/v1";
/// Default model injected when the caller does not pick one
pub const DEFAULT_MIMO_MODEL: &str = "mimo-v2-flash";
/// Default upstream for the prompt chat endpoint
pub const DEFAULT_DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com";
/// Default model for the prompt chat endpoint
pub const DEFAULT_DEEPSEEK_MODEL: &str = "deepseek-chat";
/// Largest request body accepted before the relay answers 413
pub const DEFAULT_MAX_REQUEST_BYTES: usize = 16 * 1024 * 1024;

/// Settings for a single upstream LLM provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Base URL, `/chat/completions` is appended to it
    pub base_url: String,
    /// Secret API key. Requests are refused while this is unset.
    pub api_key: Option<String>,
    /// Model used when the request does not name one
    pub default_model: String,
}

impl ProviderConfig {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>, default_model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key,
            default_model: default_model.into(),
        }
    }

    /// Check if an API key is present
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Full chat completions URL for this provider
    pub fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Request body size limit in bytes
    pub max_request_bytes: usize,

    /// Provider behind the relay endpoint (Xiaomi MiMo)
    pub relay: ProviderConfig,
    /// Provider behind `/api/chat` (DeepSeek)
    pub chat: ProviderConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    ///
    /// Empty values are treated the same as missing ones.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |keys: &[&str]| {
            keys.iter()
                .filter_map(|key| lookup(key))
                .map(|value| value.trim().to_string())
                .find(|value| !value.is_empty())
        };

        Ok(Self {
            host: get(&["RELAY_HOST"]).unwrap_or_else(|| "0.0.0.0".to_string()),
            port: get(&["PORT"])
                .unwrap_or_else(|| "5174".to_string())
                .parse()
                .context("Invalid PORT")?,
            max_request_bytes: match get(&["RELAY_MAX_REQUEST_BYTES"]) {
                Some(value) => value.parse().context("Invalid RELAY_MAX_REQUEST_BYTES")?,
                None => DEFAULT_MAX_REQUEST_BYTES,
            },

            relay: ProviderConfig::new(
                get(&["MIMO_BASE_URL", "VITE_MIMO_BASE_URL"])
                    .unwrap_or_else(|| DEFAULT_MIMO_BASE_URL.to_string()),
                get(&["MIMO_API_KEY", "VITE_MIMO_KEY"]),
                get(&["MIMO_MODEL", "VITE_MIMO_MODEL"])
                    .unwrap_or_else(|| DEFAULT_MIMO_MODEL.to_string()),
            ),

            chat: ProviderConfig::new(
                get(&["DEEPSEEK_BASE_URL"]).unwrap_or_else(|| DEFAULT_DEEPSEEK_BASE_URL.to_string()),
                get(&["DEEPSEEK_API_KEY"]),
                get(&["DEEPSEEK_MODEL"]).unwrap_or_else(|| DEFAULT_DEEPSEEK_MODEL.to_string()),
            ),
        })
    }
}
