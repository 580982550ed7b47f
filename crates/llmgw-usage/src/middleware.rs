use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use uuid::Uuid;

use crate::engine::UsageEngine;

/// Stashed in request extensions at entry so the provider handler can
/// recover the request id and start time without re-deriving them.
#[derive(Clone)]
pub struct UsageContext {
    pub request_id: String,
    pub start: Instant,
}

/// Middleware entry + exit for the usage engine, built on axum's
/// `middleware::from_fn_with_state` plus an extension-attachment shape.
/// Must run after the auth middleware so the authenticated user id is
/// already present in extensions.
pub async fn track_usage(
    State(engine): State<Arc<UsageEngine>>,
    mut req: Request,
    next: Next,
) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let user_id = req
        .extensions()
        .get::<llmgw_domain::User>()
        .map(|user| user.id)
        .unwrap_or_default();

    engine.open(&request_id, user_id);
    let start = Instant::now();
    req.extensions_mut().insert(UsageContext {
        request_id: request_id.clone(),
        start,
    });

    let response = next.run(req).await;

    let duration_ms = start.elapsed().as_millis() as i64;
    let status = response.status().as_u16();
    engine.finalize_and_enqueue(&request_id, status, duration_ms);
    response
}
