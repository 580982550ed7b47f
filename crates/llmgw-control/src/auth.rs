use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::cookie::CookieJar;
use llmgw_auth::extract_bearer_or_api_key;
use llmgw_domain::User;

use crate::error::ApiError;
use crate::state::ControlState;

/// The RPC-layer authenticated principal. Every handler that needs an
/// authenticated caller takes `CurrentUser` as a parameter instead of
/// re-deriving it. A session cookie, when present, takes precedence over
/// a bearer token so a browser session can't be shadowed by a stale
/// `Authorization` header.
pub struct CurrentUser(pub User);

impl FromRequestParts<Arc<ControlState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<ControlState>,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        if let Some(cookie) = jar.get(llmgw_auth::sso::SESSION_COOKIE) {
            let session = state
                .sessions
                .get(cookie.value())
                .map_err(|_| ApiError::Unauthenticated)?;
            return Ok(CurrentUser(session.user));
        }

        let token = extract_bearer_or_api_key(&parts.headers).ok_or(ApiError::Unauthenticated)?;
        let user = state
            .authenticator
            .authenticate(&token)
            .await
            .map_err(|_| ApiError::Unauthenticated)?;
        Ok(CurrentUser(user))
    }
}
