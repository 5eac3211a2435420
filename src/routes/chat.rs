//! Prompt chat endpoint
//!
//! Simplified contract for callers that only have a prompt: `{prompt}` in,
//! `{reply}` out, always buffered. Uses the second configured provider.

use std::sync::Arc;

use axum::{
    extract::{rejection::BytesRejection, State},
    http::{header, HeaderMap, Method},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::{
    config::ProviderConfig,
    error::{RelayError, RelayResult},
    proxy::{headers::build_forward_headers, ForwardRequest, RequestContext, UpstreamClient},
    routes::metrics::record_request,
    AppState,
};

/// Message returned when the chat provider has no key
pub const PROVIDER_MISSING_MESSAGE: &str = "No model provider configured (set DEEPSEEK_API_KEY)";

/// Prompt chat request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PromptRequest {
    #[serde(default)]
    pub prompt: Option<String>,
}

/// Prompt chat response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PromptReply {
    pub reply: String,
}

/// Handle `POST /api/chat`
pub async fn prompt_chat(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> RelayResult<Json<PromptReply>> {
    let body = body?;
    let request: PromptRequest = if body.is_empty() {
        PromptRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| RelayError::BadRequest(format!("Invalid request body: {}", e)))?
    };

    let prompt = match request.prompt {
        Some(prompt) if !prompt.is_empty() => prompt,
        _ => return Err(RelayError::BadRequest("prompt required".to_string())),
    };

    let ctx = RequestContext::new(state.upstream.name(), "/api/chat")
        .with_model(state.config.chat.default_model.clone());
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    ctx.log_request_start(Method::POST.as_str(), content_type);

    match call_model(state.upstream.as_ref(), &state.config.chat, &prompt).await {
        Ok(reply) => {
            info!(
                trace_id = %ctx.trace_id,
                reply_len = reply.len(),
                elapsed_ms = %ctx.elapsed_ms(),
                "Prompt chat completed"
            );
            record_request("chat", 200, ctx.elapsed_secs());
            Ok(Json(PromptReply { reply }))
        }
        Err(err) => {
            ctx.log_error(&err.to_string());
            record_request("chat", 500, ctx.elapsed_secs());
            Err(RelayError::Provider(err.to_string()))
        }
    }
}

/// Send one user prompt to the provider and pull out the reply text
pub async fn call_model(
    upstream: &dyn UpstreamClient,
    provider: &ProviderConfig,
    prompt: &str,
) -> RelayResult<String> {
    let api_key = provider
        .api_key
        .as_deref()
        .ok_or_else(|| RelayError::Provider(PROVIDER_MISSING_MESSAGE.to_string()))?;

    let request = ForwardRequest {
        url: provider.chat_completions_url(),
        method: Method::POST,
        headers: build_forward_headers(api_key)?,
        body: json!({
            "model": provider.default_model,
            "messages": [{ "role": "user", "content": prompt }],
        }),
    };

    let response = upstream.forward(request).await?;
    let status = response.status;

    if !status.is_success() {
        let body = response.bytes().await.unwrap_or_default();
        warn!(status = %status, "Chat provider returned an error status");
        return Err(RelayError::Provider(format!(
            "{} status code: {}",
            status.as_u16(),
            String::from_utf8_lossy(&body)
        )));
    }

    let completion = response.json().await?;
    Ok(extract_reply(&completion))
}

/// First choice's message content, or the whole completion as text
pub fn extract_reply(completion: &Value) -> String {
    completion
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| completion.to_string())
}
