//! Header utilities for relaying
//!
//! Builds the provider-facing headers (the caller's own headers are never
//! forwarded) and the cross-origin headers sent back to the browser.

use axum::http::header::{self, HeaderName};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

use crate::error::{RelayError, RelayResult};

/// Methods the browser is allowed to use against the relay
pub const CORS_ALLOW_METHODS: &str = "POST, OPTIONS";
/// Request headers the browser is allowed to send
pub const CORS_ALLOW_HEADERS: &str = "Content-Type, Authorization";
/// Preflight cache lifetime in seconds
pub const CORS_MAX_AGE: &str = "86400";

/// Build the headers for a provider request
///
/// Only the bearer key and JSON content type are sent. A key that cannot be
/// encoded as a header value is reported rather than panicking.
pub fn build_forward_headers(api_key: &str) -> RelayResult<HeaderMap> {
    let mut headers = HeaderMap::new();

    let auth = HeaderValue::from_str(&format!("Bearer {}", api_key))
        .map_err(|_| RelayError::Internal("API key contains invalid header characters".to_string()))?;
    headers.insert(AUTHORIZATION, auth);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    Ok(headers)
}

/// Add the permissive cross-origin headers
pub fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(CORS_ALLOW_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(CORS_ALLOW_HEADERS),
    );
}

/// Add the cross-origin headers for a preflight answer
pub fn apply_preflight_headers(headers: &mut HeaderMap) {
    apply_cors_headers(headers);
    headers.insert(header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static(CORS_MAX_AGE));
}

/// Add the headers that mark a response as a live event stream
pub fn apply_event_stream_headers(headers: &mut HeaderMap) {
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/event-stream"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    // keeps nginx-style front proxies from buffering the stream
    headers.insert(
        HeaderName::from_static("x-accel-buffering"),
        HeaderValue::from_static("no"),
    );
}
