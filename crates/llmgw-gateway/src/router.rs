use std::sync::Arc;

use axum::extract::Extension;
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::{middleware as axum_middleware, Router};
use llmgw_auth::TokenAuthenticator;
use llmgw_domain::User;
use llmgw_usage::track_usage;
use serde_json::json;

use crate::middleware::authenticate;
use crate::pipeline::chat_completions;
use crate::state::GatewayState;

/// Full middleware chain plus the data-plane routes. Order matters: auth
/// is the outer layer (added last, so it runs first) and usage tracking is
/// the inner layer, so a request is always attributed to an authenticated
/// user before usage tracking opens an entry for it.
pub fn router(state: Arc<GatewayState>, authenticator: Arc<TokenAuthenticator>) -> Router {
    let usage = state.usage.clone();
    Router::new()
        .route("/v1/chat/completions", post(chat_completions))
        .route("/hello", get(hello))
        .route_layer(axum_middleware::from_fn_with_state(usage, track_usage))
        .route_layer(axum_middleware::from_fn_with_state(authenticator, authenticate))
        .with_state(state)
}

/// Authenticated echo endpoint, a development aid for confirming that a
/// token or session resolves to the expected user without dispatching a
/// model request.
async fn hello(Extension(user): Extension<User>) -> impl IntoResponse {
    Json(json!({"user_id": user.id, "email": user.email}))
}
