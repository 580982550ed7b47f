use std::convert::Infallible;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::response::{IntoResponse, Response};
use futures_util::StreamExt;
use http::{header, StatusCode};
use llmgw_domain::{OpenRouterCredential, UsageStatus};
use llmgw_usage::UsageEngine;
use serde_json::Value;
use tokio_stream::wrappers::ReceiverStream;
use tracing::warn;

use crate::upstream::{chunk_is_final, parse_sse_data_lines, usage_from_json, UpstreamClient};

/// Wraps [`UpstreamClient`] so the provider hook required by the pending
/// registry fires exactly once per request, on the unary path immediately
/// and on the streaming path when the terminal chunk (or a stream error)
/// is observed. Re-streams the response body via a `tokio::spawn` task
/// feeding a bounded `mpsc::channel`/`ReceiverStream`, calling into the
/// usage engine as each chunk passes through.
pub async fn dispatch(
    upstream: &UpstreamClient,
    engine: Arc<UsageEngine>,
    request_id: &str,
    model_id: &str,
    credential: &OpenRouterCredential,
    body: Value,
    streaming: bool,
    started: Instant,
) -> Response {
    if streaming {
        dispatch_streaming(upstream, engine, request_id, model_id, credential, body, started).await
    } else {
        dispatch_unary(upstream, &engine, request_id, model_id, credential, body, started).await
    }
}

async fn dispatch_unary(
    upstream: &UpstreamClient,
    engine: &UsageEngine,
    request_id: &str,
    model_id: &str,
    credential: &OpenRouterCredential,
    body: Value,
    started: Instant,
) -> Response {
    match upstream.generate(credential, body).await {
        Ok(resp) => {
            let duration_ms = started.elapsed().as_millis() as i64;
            let status = if resp.status.is_success() {
                UsageStatus::Success
            } else {
                UsageStatus::Failed
            };
            engine.update(
                request_id,
                Some(model_id.to_string()),
                resp.usage,
                status,
                duration_ms,
                false,
            );
            (resp.status, [(header::CONTENT_TYPE, "application/json")], resp.body).into_response()
        }
        Err(err) => {
            let duration_ms = started.elapsed().as_millis() as i64;
            engine.update(request_id, Some(model_id.to_string()), None, UsageStatus::Failed, duration_ms, false);
            warn!(request_id, error = %err, "upstream unary dispatch failed");
            (StatusCode::BAD_GATEWAY, "upstream request failed").into_response()
        }
    }
}

async fn dispatch_streaming(
    upstream: &UpstreamClient,
    engine: Arc<UsageEngine>,
    request_id: &str,
    model_id: &str,
    credential: &OpenRouterCredential,
    body: Value,
    started: Instant,
) -> Response {
    let (status, mut upstream_stream) = match upstream.generate_stream(credential, body).await {
        Ok(pair) => pair,
        Err(err) => {
            let duration_ms = started.elapsed().as_millis() as i64;
            engine.update(request_id, Some(model_id.to_string()), None, UsageStatus::Failed, duration_ms, true);
            warn!(request_id, error = %err, "upstream stream dispatch failed");
            return (StatusCode::BAD_GATEWAY, "upstream request failed").into_response();
        }
    };

    if !status.is_success() {
        let duration_ms = started.elapsed().as_millis() as i64;
        engine.update(request_id, Some(model_id.to_string()), None, UsageStatus::Failed, duration_ms, true);
        return (status, "upstream rejected the streamed request").into_response();
    }

    let (tx, rx) = tokio::sync::mpsc::channel::<bytes::Bytes>(32);
    let request_id = request_id.to_string();
    let model_id = model_id.to_string();

    tokio::spawn(async move {
        let mut finished = false;
        while let Some(item) = upstream_stream.next().await {
            let chunk = match item {
                Ok(chunk) => chunk,
                Err(err) => {
                    warn!(request_id, error = %err, "upstream stream read failed");
                    break;
                }
            };
            for value in parse_sse_data_lines(&chunk) {
                if chunk_is_final(&value) {
                    finished = true;
                    let duration_ms = started.elapsed().as_millis() as i64;
                    let tokens = usage_from_json(&value);
                    engine.update(
                        &request_id,
                        Some(model_id.clone()),
                        tokens,
                        UsageStatus::Success,
                        duration_ms,
                        true,
                    );
                }
            }
            if tx.send(chunk).await.is_err() {
                break;
            }
        }

        if !finished {
            let duration_ms = started.elapsed().as_millis() as i64;
            engine.mark_stream_failed(&request_id, Some(model_id.clone()), duration_ms);
        }
    });

    let stream = ReceiverStream::new(rx).map(Ok::<_, Infallible>);
    (status, [(header::CONTENT_TYPE, "text/event-stream")], Body::from_stream(stream)).into_response()
}
