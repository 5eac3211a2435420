//! Relay handler
//!
//! Receives a browser request, attaches the provider key and default model,
//! forwards it upstream and hands back either one buffered JSON document or
//! the provider's event stream as it arrives.

pub mod stream;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde_json::{json, Map, Value};
use tracing::Instrument;

use crate::{
    config::ProviderConfig,
    error::{RelayError, RelayResult},
    proxy::{
        headers::{apply_cors_headers, apply_event_stream_headers, apply_preflight_headers, build_forward_headers},
        ForwardRequest, RequestContext, UpstreamClient, UpstreamResponse,
    },
    routes::metrics::record_request,
};

pub use stream::relay_stream;

/// Request as received from the browser
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    /// Raw body, parsed as JSON only once the method has been accepted
    pub body: Bytes,
}

impl InboundRequest {
    pub fn new(method: Method, path: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Caller's `content-type`, empty when absent
    pub fn content_type(&self) -> &str {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
    }
}

/// The relay for one statically configured provider
#[derive(Clone)]
pub struct Relay {
    config: Arc<ProviderConfig>,
    upstream: Arc<dyn UpstreamClient>,
}

impl Relay {
    pub fn new(config: Arc<ProviderConfig>, upstream: Arc<dyn UpstreamClient>) -> Self {
        Self { config, upstream }
    }

    /// Handle one inbound request end to end.
    ///
    /// Never fails: every error is turned into a status code and JSON body
    /// by [`RelayError`]'s `IntoResponse` impl.
    pub async fn handle(&self, request: InboundRequest) -> Response {
        if request.method == Method::OPTIONS {
            return preflight_response();
        }

        let mut ctx = RequestContext::new(self.upstream.name(), &request.path);
        let span = ctx.create_span();
        ctx.log_request_start(request.method.as_str(), request.content_type());

        let result = self.relay(request, &mut ctx).instrument(span).await;

        match result {
            Ok(response) => response,
            Err(err) => {
                match &err {
                    RelayError::MethodNotAllowed => {
                        tracing::debug!(trace_id = %ctx.trace_id, "Rejected non-POST request");
                    }
                    RelayError::UpstreamFailure { status, .. } => {
                        ctx.log_upstream_failure(status.as_u16());
                    }
                    other => ctx.log_error(&other.to_string()),
                }
                record_request(mode_label(&ctx), err.status().as_u16(), ctx.elapsed_secs());
                err.into_response()
            }
        }
    }

    async fn relay(&self, request: InboundRequest, ctx: &mut RequestContext) -> RelayResult<Response> {
        if request.method != Method::POST {
            return Err(RelayError::MethodNotAllowed);
        }

        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(RelayError::ConfigurationMissing)?;

        let forward = self.build_forward_request(&request.body, api_key)?;
        let wants_stream = forward.wants_stream();

        if let Some(model) = forward.body.get("model").and_then(Value::as_str) {
            ctx.model = Some(model.to_string());
        }
        ctx.log_upstream_request(&forward.url);

        let upstream = self.upstream.forward(forward).await?;
        ctx.log_upstream_response(upstream.status.as_u16(), upstream.content_type());

        if !upstream.status.is_success() {
            let status = upstream.status;
            let body = upstream.json().await.unwrap_or_else(|_| json!({}));
            return Err(RelayError::UpstreamFailure { status, body });
        }

        if upstream.is_event_stream() || wants_stream {
            ctx.streaming = true;
            self.streamed_response(upstream, ctx)
        } else {
            self.buffered_response(upstream, ctx).await
        }
    }

    /// Build the provider request from the caller's body
    pub fn build_forward_request(&self, body: &[u8], api_key: &str) -> RelayResult<ForwardRequest> {
        let mut fields = parse_body(body)?;

        let has_model = match fields.get("model") {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.is_empty(),
            Some(_) => true,
        };
        if !has_model {
            fields.insert(
                "model".to_string(),
                Value::String(self.config.default_model.clone()),
            );
        }

        Ok(ForwardRequest {
            url: self.config.chat_completions_url(),
            method: Method::POST,
            headers: build_forward_headers(api_key)?,
            body: Value::Object(fields),
        })
    }

    fn streamed_response(&self, upstream: UpstreamResponse, ctx: &RequestContext) -> RelayResult<Response> {
        let chunks = upstream.into_stream().ok_or(RelayError::StreamUnavailable)?;

        ctx.log_stream_started();
        record_request("streamed", StatusCode::OK.as_u16(), ctx.elapsed_secs());

        let mut response = Response::new(Body::from_stream(relay_stream(chunks, ctx.clone())));
        *response.status_mut() = StatusCode::OK;
        apply_cors_headers(response.headers_mut());
        apply_event_stream_headers(response.headers_mut());

        Ok(response)
    }

    async fn buffered_response(&self, upstream: UpstreamResponse, ctx: &RequestContext) -> RelayResult<Response> {
        let data = upstream.json().await?;

        let mut response = (StatusCode::OK, Json(data)).into_response();
        apply_cors_headers(response.headers_mut());

        ctx.log_request_complete();
        record_request("buffered", StatusCode::OK.as_u16(), ctx.elapsed_secs());

        Ok(response)
    }
}

/// Answer a CORS preflight
pub fn preflight_response() -> Response {
    let mut response = StatusCode::OK.into_response();
    apply_preflight_headers(response.headers_mut());
    response
}

/// Parse the caller's body; an empty body counts as `{}`
fn parse_body(body: &[u8]) -> RelayResult<Map<String, Value>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }

    match serde_json::from_slice::<Value>(body)? {
        Value::Object(fields) => Ok(fields),
        Value::Null => Ok(Map::new()),
        _ => Err(RelayError::Internal(
            "Request body must be a JSON object".to_string(),
        )),
    }
}

fn mode_label(ctx: &RequestContext) -> &'static str {
    if ctx.streaming {
        "streamed"
    } else {
        "buffered"
    }
}
