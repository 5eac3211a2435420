//! reqwest-backed upstream client

use async_trait::async_trait;
use axum::http::StatusCode;
use futures::TryStreamExt;
use tracing::{debug, error, instrument};

use crate::error::RelayResult;
use crate::proxy::upstream::{ByteStream, ForwardRequest, UpstreamClient, UpstreamResponse};

/// Upstream client that talks to the provider over HTTP
pub struct HttpUpstream {
    client: reqwest::Client,
}

impl HttpUpstream {
    /// Create a new client on top of a shared connection pool
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl UpstreamClient for HttpUpstream {
    fn name(&self) -> &'static str {
        "http"
    }

    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    async fn forward(&self, request: ForwardRequest) -> RelayResult<UpstreamResponse> {
        let body = serde_json::to_vec(&request.body)?;

        debug!(body_len = body.len(), "Sending request upstream");

        let response = self
            .client
            .request(request.method, &request.url)
            .headers(request.headers)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                error!(url = %request.url, error = %e, "Failed to send request upstream");
                e
            })?;

        let status = StatusCode::from_u16(response.status().as_u16())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let headers = response.headers().clone();

        debug!(
            status = %status,
            content_length = ?response.content_length(),
            "Received response from upstream"
        );

        // an explicitly empty body leaves nothing to read or stream
        let body: Option<ByteStream> = if response.content_length() == Some(0) {
            None
        } else {
            Some(Box::pin(response.bytes_stream().map_err(anyhow::Error::from)))
        };

        Ok(UpstreamResponse::new(status, headers, body))
    }
}
