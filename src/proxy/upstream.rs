//! Upstream client abstraction
//!
//! Defines the trait the relay uses to reach an LLM provider, so the real
//! HTTP client can be swapped for a fake in tests.

use async_trait::async_trait;
use axum::http::{header, HeaderMap, Method, StatusCode};
use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};
use serde_json::Value;
use std::fmt;
use std::pin::Pin;

use crate::error::{RelayError, RelayResult};

/// Lazily consumed sequence of body chunks from the provider.
///
/// Finite and not restartable. Dropping it releases the upstream connection.
pub type ByteStream = Pin<Box<dyn Stream<Item = anyhow::Result<Bytes>> + Send>>;

/// Request as it is sent to the provider
#[derive(Debug, Clone)]
pub struct ForwardRequest {
    pub url: String,
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Value,
}

impl ForwardRequest {
    /// Whether the caller asked for a streamed completion
    pub fn wants_stream(&self) -> bool {
        self.body
            .get("stream")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

/// Response as received from the provider
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    body: Option<ByteStream>,
}

impl UpstreamResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: Option<ByteStream>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Raw `content-type` header, empty when absent
    pub fn content_type(&self) -> &str {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
    }

    /// Whether the provider answered with server-sent events
    pub fn is_event_stream(&self) -> bool {
        self.content_type().contains("text/event-stream")
    }

    /// Take the body as a chunk stream, `None` if the provider sent none
    pub fn into_stream(self) -> Option<ByteStream> {
        self.body
    }

    /// Read the whole body into memory
    pub async fn bytes(self) -> RelayResult<Bytes> {
        let Some(mut stream) = self.body else {
            return Ok(Bytes::new());
        };

        let mut buf = BytesMut::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(RelayError::internal)?;
            buf.extend_from_slice(&chunk);
        }
        Ok(buf.freeze())
    }

    /// Read the whole body and parse it as JSON
    pub async fn json(self) -> RelayResult<Value> {
        let bytes = self.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl fmt::Debug for UpstreamResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("has_body", &self.body.is_some())
            .finish()
    }
}

/// Trait for the component that performs the actual network call
///
/// Implementations do no retries, add no timeout beyond the client default
/// and never transform the response.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    /// Get the client name for logging
    fn name(&self) -> &'static str;

    /// Send the request and return status, headers and the unread body
    async fn forward(&self, request: ForwardRequest) -> RelayResult<UpstreamResponse>;
}
