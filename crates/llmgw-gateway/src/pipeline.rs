use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Extension, State};
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use llmgw_common::RepoError;
use llmgw_usage::UsageContext;
use serde_json::Value;

use crate::state::GatewayState;
use crate::tracked_client;

/// The OpenAI-compatible request pipeline. Parses the body, resolves the
/// logical model id to a `(Model, credential)` pair through the caches,
/// rewrites `model` to the upstream reference, and dispatches to the
/// upstream client.
pub async fn chat_completions(
    State(state): State<Arc<GatewayState>>,
    Extension(ctx): Extension<UsageContext>,
    body: Bytes,
) -> Response {
    let mut payload: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(_) => return (StatusCode::BAD_REQUEST, "invalid json body").into_response(),
    };

    let Some(model_id) = payload
        .get("model")
        .and_then(Value::as_str)
        .map(str::to_string)
    else {
        return (StatusCode::BAD_REQUEST, "missing \"model\" field").into_response();
    };

    let model = match state.models.get(&model_id).await {
        Ok(model) if model.enabled => model,
        Ok(_) => return (StatusCode::NOT_FOUND, "unknown model").into_response(),
        Err(RepoError::NotFound) => return (StatusCode::NOT_FOUND, "unknown model").into_response(),
        Err(_) => return (StatusCode::INTERNAL_SERVER_ERROR, "model lookup failed").into_response(),
    };

    let credential = match state.credentials.get(model.credential_id).await {
        Ok(credential) if credential.enabled => credential,
        _ => return (StatusCode::INTERNAL_SERVER_ERROR, "credential unavailable").into_response(),
    };

    let upstream_reference = model
        .upstream_model_reference()
        .unwrap_or(model.id.as_str())
        .to_string();
    if let Some(object) = payload.as_object_mut() {
        object.insert("model".to_string(), Value::String(upstream_reference));
    }
    let streaming = payload
        .get("stream")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    tracked_client::dispatch(
        &state.upstream,
        state.usage.clone(),
        &ctx.request_id,
        &model_id,
        &credential,
        payload,
        streaming,
        ctx.start,
    )
    .await
}
