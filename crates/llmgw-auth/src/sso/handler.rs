use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Redirect};
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use http::StatusCode;
use llmgw_domain::{AuthProviderKind, IdentityRepository, Organization, User};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use time::OffsetDateTime;

use crate::session::SessionStore;
use crate::sso::flow_store::AuthCodeFlowStore;
use crate::sso::pkce;
use crate::sso::types::{DevicePollOutcome, SsoError, SsoProvider};

pub const OAUTH_STATE_COOKIE: &str = "oauth_state";
pub const SESSION_COOKIE: &str = "session_id";

/// SSO handler. Owns the per-provider collaborators and the
/// authorization-code flow-state table; the device-code flow needs no
/// local table since the provider's own `device_code` is the continuation
/// token.
pub struct SsoHandler {
    providers: HashMap<String, Arc<dyn SsoProvider>>,
    identities: Arc<dyn IdentityRepository>,
    sessions: Arc<SessionStore>,
    flow_store: AuthCodeFlowStore,
    public_base_url: String,
    tls: bool,
}

impl SsoHandler {
    pub fn new(
        providers: HashMap<String, Arc<dyn SsoProvider>>,
        identities: Arc<dyn IdentityRepository>,
        sessions: Arc<SessionStore>,
        public_base_url: String,
        tls: bool,
    ) -> Self {
        Self {
            providers,
            identities,
            sessions,
            flow_store: AuthCodeFlowStore::new(StdDuration::from_secs(15 * 60)),
            public_base_url,
            tls,
        }
    }

    fn redirect_uri(&self, provider: &str) -> String {
        format!("{}/{}/callback", self.public_base_url, provider)
    }

    fn oauth_state_cookie(&self, value: String) -> Cookie<'static> {
        Cookie::build((OAUTH_STATE_COOKIE, value))
            .http_only(true)
            .same_site(SameSite::Lax)
            .path("/")
            .secure(self.tls)
            .max_age(time::Duration::minutes(15))
            .build()
    }

    fn session_cookie(&self, value: String) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, value))
            .http_only(true)
            .same_site(SameSite::Lax)
            .path("/")
            .secure(self.tls)
            .max_age(time::Duration::hours(24))
            .build()
    }

    /// Resolves or creates the local user for an external identity within
    /// `organization_id` (the system organization when `None`, for
    /// provider-global flows not scoped to `/oidc/{org}`).
    async fn resolve_user(
        &self,
        provider_kind: AuthProviderKind,
        organization_id: Option<i64>,
        identity: crate::sso::types::ExternalIdentity,
    ) -> Result<User, SsoError> {
        if let Ok(user) = self
            .identities
            .get_user_by_external_id(provider_kind, &identity.external_id)
            .await
        {
            return Ok(user);
        }
        let org_id = match organization_id {
            Some(id) => id,
            None => self
                .identities
                .list_organizations()
                .await
                .map_err(|err| SsoError::Upstream(err.to_string()))?
                .into_iter()
                .find(|o| o.is_system)
                .map(|o| o.id)
                .unwrap_or(0),
        };
        let user = User {
            id: 0,
            email: identity.email,
            name: identity.name,
            organization_id: org_id,
            external_id: Some(identity.external_id),
            provider: provider_kind,
            system_admin: false,
            created_at: OffsetDateTime::now_utc(),
            last_login: Some(OffsetDateTime::now_utc()),
        };
        self.identities
            .create_user(user)
            .await
            .map_err(|err| SsoError::Upstream(err.to_string()))
    }
}

pub fn router(handler: Arc<SsoHandler>) -> Router {
    Router::new()
        .route("/{provider}", get(start_authorization_code))
        .route("/{provider}/callback", get(callback))
        .route("/{provider}/device/start", post(device_start))
        .route("/{provider}/device/poll", post(device_poll))
        .route("/oidc/{organization}", get(start_authorization_code_for_org))
        .route("/oidc/{organization}/callback", get(callback_for_org))
        .with_state(handler)
}

async fn start_authorization_code(
    State(handler): State<Arc<SsoHandler>>,
    Path(provider): Path<String>,
    jar: CookieJar,
) -> impl IntoResponse {
    begin_authorization_code(&handler, &provider, None, jar)
}

async fn start_authorization_code_for_org(
    State(handler): State<Arc<SsoHandler>>,
    Path(organization): Path<String>,
    jar: CookieJar,
) -> impl IntoResponse {
    let org = match handler.identities.get_organization_by_name(&organization).await {
        Ok(org) => org,
        Err(_) => return (StatusCode::NOT_FOUND, "organization not found").into_response(),
    };
    let provider = org.sso_type.map(|_| "oidc".to_string()).unwrap_or_default();
    begin_authorization_code(&handler, &provider, Some(org), jar).into_response()
}

fn begin_authorization_code(
    handler: &Arc<SsoHandler>,
    provider_name: &str,
    organization: Option<Organization>,
    jar: CookieJar,
) -> impl IntoResponse + use<> {
    let Some(provider) = handler.providers.get(provider_name).cloned() else {
        return (StatusCode::NOT_FOUND, "unknown provider").into_response();
    };
    let state = pkce::generate_state();
    let pkce = pkce::generate();
    handler
        .flow_store
        .insert(state.clone(), pkce.code_verifier, organization.map(|o| o.id));
    let redirect_uri = handler.redirect_uri(provider_name);
    let authorize_url = provider.authorize_url(&state, &pkce.code_challenge, &redirect_uri);
    let jar = jar.add(handler.oauth_state_cookie(state));
    (jar, Redirect::to(&authorize_url)).into_response()
}

#[derive(Deserialize)]
struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

async fn callback(
    State(handler): State<Arc<SsoHandler>>,
    Path(provider): Path<String>,
    Query(query): Query<CallbackQuery>,
    jar: CookieJar,
) -> impl IntoResponse {
    finish_authorization_code(&handler, &provider, query, jar).await
}

async fn callback_for_org(
    State(handler): State<Arc<SsoHandler>>,
    Path(organization): Path<String>,
    Query(query): Query<CallbackQuery>,
    jar: CookieJar,
) -> impl IntoResponse {
    let provider_name = match handler.identities.get_organization_by_name(&organization).await {
        Ok(org) => org.sso_type.map(|_| "oidc".to_string()).unwrap_or_default(),
        Err(_) => return (StatusCode::NOT_FOUND, "organization not found").into_response(),
    };
    finish_authorization_code(&handler, &provider_name, query, jar)
        .await
        .into_response()
}

async fn finish_authorization_code(
    handler: &Arc<SsoHandler>,
    provider_name: &str,
    query: CallbackQuery,
    jar: CookieJar,
) -> impl IntoResponse {
    if let Some(err) = query.error.as_deref() {
        if err == "access_denied" {
            return (jar.remove(OAUTH_STATE_COOKIE), StatusCode::BAD_REQUEST, "access_denied")
                .into_response();
        }
        return (StatusCode::INTERNAL_SERVER_ERROR, "upstream error").into_response();
    }

    let Some(cookie_state) = jar.get(OAUTH_STATE_COOKIE).map(|c| c.value().to_string()) else {
        return (StatusCode::BAD_REQUEST, "invalid state parameter").into_response();
    };
    let query_state = query.state.unwrap_or_default();
    // Constant-time compare; both are already-decoded strings so subtle's
    // `ConstantTimeEq` over bytes is the natural fit.
    let equal = cookie_state.len() == query_state.len()
        && bool::from(cookie_state.as_bytes().ct_eq(query_state.as_bytes()));
    let jar = jar.remove(OAUTH_STATE_COOKIE);
    if !equal {
        return (jar, StatusCode::BAD_REQUEST, "invalid state parameter").into_response();
    }

    let Some((code_verifier, organization_id)) = handler.flow_store.take(&query_state) else {
        return (jar, StatusCode::BAD_REQUEST, "invalid state parameter").into_response();
    };

    let Some(code) = query.code else {
        return (jar, StatusCode::BAD_REQUEST, "missing code parameter").into_response();
    };

    let Some(provider) = handler.providers.get(provider_name).cloned() else {
        return (jar, StatusCode::NOT_FOUND, "unknown provider").into_response();
    };
    let redirect_uri = handler.redirect_uri(provider_name);
    let identity = match provider.exchange_code(&code, &code_verifier, &redirect_uri).await {
        Ok(identity) => identity,
        Err(err) if err.is_user_visible() => {
            return (jar, StatusCode::BAD_REQUEST, err.to_string()).into_response();
        }
        Err(_) => return (jar, StatusCode::INTERNAL_SERVER_ERROR, "upstream error").into_response(),
    };

    let user = match handler
        .resolve_user(AuthProviderKind::Oidc, organization_id, identity)
        .await
    {
        Ok(user) => user,
        Err(_) => return (jar, StatusCode::INTERNAL_SERVER_ERROR, "upstream error").into_response(),
    };

    let session = handler.sessions.create(user);
    let jar = jar.add(handler.session_cookie(session.id));
    (jar, Redirect::to("/")).into_response()
}

#[derive(Serialize)]
struct DeviceStartResponse {
    device_code: String,
    user_code: String,
    verification_uri: String,
    interval: u64,
    expires_in: u64,
}

async fn device_start(
    State(handler): State<Arc<SsoHandler>>,
    Path(provider): Path<String>,
) -> impl IntoResponse {
    let Some(provider) = handler.providers.get(&provider).cloned() else {
        return (StatusCode::NOT_FOUND, "unknown provider").into_response();
    };
    match provider.device_start().await {
        Ok(start) => Json(DeviceStartResponse {
            device_code: start.device_code,
            user_code: start.user_code,
            verification_uri: start.verification_uri,
            interval: start.interval_secs,
            expires_in: start.expires_in_secs,
        })
        .into_response(),
        Err(err) if err.is_user_visible() => {
            (StatusCode::BAD_REQUEST, err.to_string()).into_response()
        }
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "upstream error").into_response(),
    }
}

#[derive(Deserialize)]
struct DevicePollRequest {
    device_code: String,
}

async fn device_poll(
    State(handler): State<Arc<SsoHandler>>,
    Path(provider): Path<String>,
    jar: CookieJar,
    Json(body): Json<DevicePollRequest>,
) -> impl IntoResponse {
    let Some(provider_impl) = handler.providers.get(&provider).cloned() else {
        return (StatusCode::NOT_FOUND, "unknown provider").into_response();
    };
    match provider_impl.device_poll(&body.device_code).await {
        Ok(DevicePollOutcome::Pending) => StatusCode::ACCEPTED.into_response(),
        Ok(DevicePollOutcome::Authorized(identity)) => {
            let user = match handler.resolve_user(AuthProviderKind::Oidc, None, identity).await {
                Ok(user) => user,
                Err(_) => {
                    return (StatusCode::INTERNAL_SERVER_ERROR, "upstream error").into_response()
                }
            };
            let session = handler.sessions.create(user.clone());
            let jar = jar.add(handler.session_cookie(session.id));
            (jar, Json(user)).into_response()
        }
        Err(err) if err.is_user_visible() => {
            (StatusCode::BAD_REQUEST, err.to_string()).into_response()
        }
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "upstream error").into_response(),
    }
}
