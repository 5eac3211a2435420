//! Relay endpoint
//!
//! Catch-all handler: adapts the axum request into an [`InboundRequest`]
//! and hands it to the relay.

use std::sync::Arc;

use axum::{
    extract::{rejection::BytesRejection, OriginalUri, State},
    http::{HeaderMap, Method},
    response::{IntoResponse, Response},
};
use bytes::Bytes;

use crate::{error::RelayError, relay::InboundRequest, AppState};

/// Forward any request on an unrouted path to the configured provider
pub async fn relay_handler(
    State(state): State<Arc<AppState>>,
    OriginalUri(uri): OriginalUri,
    method: Method,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            tracing::warn!(
                path = %uri.path(),
                status = %rejection.status(),
                "Request body rejected"
            );
            return RelayError::from(rejection).into_response();
        }
    };

    let request = InboundRequest {
        method,
        path: uri.path().to_string(),
        headers,
        body,
    };

    state.relay.handle(request).await
}
