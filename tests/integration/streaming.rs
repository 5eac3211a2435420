//! Streamed relay integration tests
//!
//! Chunk-level tests call the relay directly so frame boundaries, drop
//! behavior and header timing can be observed without a transport in between.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, StatusCode},
};
use bytes::Bytes;
use futures::stream;
use http_body_util::BodyExt;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use mimo_relay::{proxy::ByteStream, InboundRequest};

use crate::common::{app_state, configured, constants::*, test_server, DropFlagStream, FakeUpstream};

fn post(body: Value) -> InboundRequest {
    InboundRequest::new(Method::POST, RELAY_PATH, body.to_string())
}

/// Read the next data frame as text, `None` once the body has ended
async fn next_chunk(body: &mut Body) -> Option<String> {
    loop {
        let frame = body.frame().await?.expect("body error");
        if let Ok(data) = frame.into_data() {
            return Some(String::from_utf8(data.to_vec()).expect("utf-8 chunk"));
        }
    }
}

#[tokio::test]
async fn test_event_stream_chunks_arrive_in_order() {
    let upstream = FakeUpstream::event_stream(vec!["data: a\n\n", "data: b\n\n"]);
    let state = app_state(configured(), upstream);

    let response = state.relay.handle(post(json!({ "messages": [] }))).await;

    // headers are final before the first byte is read
    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers().clone();
    assert_eq!(headers.get(header::CONTENT_TYPE).unwrap(), "text/event-stream");
    assert_eq!(headers.get(header::CACHE_CONTROL).unwrap(), "no-cache");
    assert_eq!(headers.get(header::CONNECTION).unwrap(), "keep-alive");
    assert_eq!(headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "*");

    let mut body = response.into_body();
    assert_eq!(next_chunk(&mut body).await.as_deref(), Some("data: a\n\n"));
    assert_eq!(next_chunk(&mut body).await.as_deref(), Some("data: b\n\n"));
    assert_eq!(next_chunk(&mut body).await, None);
}

#[tokio::test]
async fn test_stream_flag_selects_streamed_mode() {
    // upstream answers with a non-SSE content type but the caller asked to stream
    let upstream = FakeUpstream::raw(
        StatusCode::OK,
        "application/octet-stream",
        Bytes::from_static(b"data: raw\n\n"),
    );
    let server = test_server(configured(), upstream);

    let response = server
        .post(RELAY_PATH)
        .json(&json!({ "stream": true, "messages": [] }))
        .await;

    response.assert_status_ok();
    assert_eq!(response.header("content-type"), "text/event-stream");
    assert_eq!(response.header("cache-control"), "no-cache");
    assert_eq!(response.text(), "data: raw\n\n");
}

#[tokio::test]
async fn test_event_stream_content_type_selects_streamed_mode() {
    let upstream = FakeUpstream::event_stream(vec![
        "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\n",
        "data: [DONE]\n\n",
    ]);
    let server = test_server(configured(), upstream);

    // no stream flag in the request
    let response = server.post(RELAY_PATH).json(&json!({ "messages": [] })).await;

    response.assert_status_ok();
    assert_eq!(response.header("content-type"), "text/event-stream");
    assert_eq!(
        response.text(),
        concat!(
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\n",
            "data: [DONE]\n\n",
        )
    );
}

#[tokio::test]
async fn test_missing_stream_body_is_an_error() {
    let upstream = FakeUpstream::event_stream_without_body();
    let server = test_server(configured(), upstream);

    let response = server.post(RELAY_PATH).json(&json!({ "stream": true })).await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json::<Value>(), json!({ "error": "Stream not available" }));
    assert!(response.headers().get("cache-control").is_none());
}

#[tokio::test]
async fn test_multibyte_character_split_across_chunks() {
    let upstream = FakeUpstream::event_stream_from(|| {
        let parts: Vec<anyhow::Result<Bytes>> = vec![
            // "数据" is E6 95 B0 E6 8D AE
            Ok(Bytes::from_static(b"data: \xE6\x95")),
            Ok(Bytes::from_static(b"\xB0\xE6\x8D\xAE\n\n")),
        ];
        Box::pin(stream::iter(parts)) as ByteStream
    });
    let state = app_state(configured(), upstream);

    let response = state.relay.handle(post(json!({ "stream": true }))).await;
    let mut body = response.into_body();

    let mut text = String::new();
    while let Some(chunk) = next_chunk(&mut body).await {
        text.push_str(&chunk);
    }
    assert_eq!(text, "data: 数据\n\n");
}

#[tokio::test]
async fn test_mid_stream_error_ends_response_cleanly() {
    let upstream = FakeUpstream::event_stream_from(|| {
        let parts: Vec<anyhow::Result<Bytes>> = vec![
            Ok(Bytes::from_static(b"data: first\n\n")),
            Err(anyhow::anyhow!("upstream connection dropped")),
        ];
        Box::pin(stream::iter(parts)) as ByteStream
    });
    let state = app_state(configured(), upstream);

    let response = state.relay.handle(post(json!({ "stream": true }))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let mut body = response.into_body();
    assert_eq!(next_chunk(&mut body).await.as_deref(), Some("data: first\n\n"));
    // ends, without a body error
    assert_eq!(next_chunk(&mut body).await, None);
}

#[tokio::test]
async fn test_caller_disconnect_drops_upstream_stream() {
    let dropped = Arc::new(AtomicBool::new(false));
    let flag = dropped.clone();

    let upstream = FakeUpstream::event_stream_from(move || {
        let first = stream::iter(vec![Ok::<_, anyhow::Error>(Bytes::from_static(b"data: a\n\n"))]);
        // never finishes on its own
        let endless = futures::StreamExt::chain(first, stream::pending());
        Box::pin(DropFlagStream::new(endless, flag.clone())) as ByteStream
    });
    let state = app_state(configured(), upstream);

    let response = state.relay.handle(post(json!({ "stream": true }))).await;
    let mut body = response.into_body();

    assert_eq!(next_chunk(&mut body).await.as_deref(), Some("data: a\n\n"));
    assert!(!dropped.load(Ordering::SeqCst));

    drop(body);
    assert!(dropped.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_upstream_is_called_once_per_stream() {
    let upstream = FakeUpstream::event_stream(vec!["data: a\n\n"]);
    let state = app_state(configured(), upstream.clone());

    let response = state.relay.handle(post(json!({ "stream": true }))).await;
    let _ = response.into_body().collect().await;

    assert_eq!(upstream.call_count(), 1);
}
