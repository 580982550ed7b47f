use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use llmgw_auth::extract_bearer_or_api_key;
use llmgw_auth::token_authenticator::TokenAuthenticator;
use llmgw_common::error::AuthFailure;

/// Data-plane authentication: reads `Authorization: Bearer` or
/// `x-api-key`, verifies it via the token authenticator, and attaches the
/// resolved user to the request extensions for both the handler and the
/// usage-tracking middleware that runs after this one.
pub async fn authenticate(
    State(authenticator): State<Arc<TokenAuthenticator>>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(token) = extract_bearer_or_api_key(req.headers()) else {
        return unauthorized(AuthFailure::MissingCredentials);
    };

    match authenticator.authenticate(&token).await {
        Ok(user) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Err(failure) => unauthorized(failure),
    }
}

/// Renders via `AuthFailure`'s uniform `Display` impl rather than an ad
/// hoc literal, so the body never reveals which specific reason applied.
fn unauthorized(failure: AuthFailure) -> Response {
    (StatusCode::UNAUTHORIZED, format!("{failure}\n")).into_response()
}
