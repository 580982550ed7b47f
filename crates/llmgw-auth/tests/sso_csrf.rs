//! CSRF protection on the OIDC authorization-code callback.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use llmgw_auth::session::SessionStore;
use llmgw_auth::sso::{ExternalIdentity, SsoError, SsoHandler, SsoProvider};
use llmgw_common::RepoError;
use llmgw_domain::{AuthProviderKind, IdentityRepository, Organization, User};
use tower::ServiceExt;

struct NullIdentities;

#[async_trait]
impl IdentityRepository for NullIdentities {
    async fn create_user(&self, _user: User) -> Result<User, RepoError> {
        Err(RepoError::NotFound)
    }
    async fn get_user(&self, _id: i64) -> Result<User, RepoError> {
        Err(RepoError::NotFound)
    }
    async fn get_user_by_email(&self, _email: &str) -> Result<User, RepoError> {
        Err(RepoError::NotFound)
    }
    async fn get_user_by_external_id(
        &self,
        _provider: AuthProviderKind,
        _external_id: &str,
    ) -> Result<User, RepoError> {
        Err(RepoError::NotFound)
    }
    async fn list_users_by_organization(&self, _org_id: i64) -> Result<Vec<User>, RepoError> {
        Ok(vec![])
    }
    async fn update_user(&self, user: User) -> Result<User, RepoError> {
        Ok(user)
    }
    async fn delete_user(&self, _id: i64) -> Result<(), RepoError> {
        Ok(())
    }
    async fn create_organization(&self, org: Organization) -> Result<Organization, RepoError> {
        Ok(org)
    }
    async fn get_organization(&self, _id: i64) -> Result<Organization, RepoError> {
        Err(RepoError::NotFound)
    }
    async fn get_organization_by_name(&self, _name: &str) -> Result<Organization, RepoError> {
        Err(RepoError::NotFound)
    }
    async fn list_organizations(&self) -> Result<Vec<Organization>, RepoError> {
        Ok(vec![])
    }
    async fn update_organization(&self, org: Organization) -> Result<Organization, RepoError> {
        Ok(org)
    }
    async fn delete_organization(&self, _id: i64, _force: bool) -> Result<(), RepoError> {
        Ok(())
    }
    async fn organization_member_count(&self, _id: i64) -> Result<u64, RepoError> {
        Ok(0)
    }
}

/// Always hands back a fixed identity; `exchange_code` would only be
/// reachable if the CSRF check were broken, which is exactly what these
/// tests guard against.
struct FakeProvider;

#[async_trait]
impl SsoProvider for FakeProvider {
    fn name(&self) -> &str {
        "fake"
    }
    fn authorize_url(&self, state: &str, _code_challenge: &str, _redirect_uri: &str) -> String {
        format!("https://idp.example.com/authorize?state={state}")
    }
    async fn exchange_code(
        &self,
        _code: &str,
        _code_verifier: &str,
        _redirect_uri: &str,
    ) -> Result<ExternalIdentity, SsoError> {
        Ok(ExternalIdentity {
            external_id: "ext-1".to_string(),
            email: "u1@example.com".to_string(),
            name: "U1".to_string(),
        })
    }
    async fn device_start(&self) -> Result<llmgw_auth::sso::DeviceStart, SsoError> {
        Err(SsoError::Upstream("not used".to_string()))
    }
    async fn device_poll(
        &self,
        _device_code: &str,
    ) -> Result<llmgw_auth::sso::DevicePollOutcome, SsoError> {
        Err(SsoError::Upstream("not used".to_string()))
    }
}

fn app() -> axum::Router {
    let mut providers: HashMap<String, Arc<dyn SsoProvider>> = HashMap::new();
    providers.insert("fake".to_string(), Arc::new(FakeProvider));
    let handler = Arc::new(SsoHandler::new(
        providers,
        Arc::new(NullIdentities),
        Arc::new(SessionStore::new(std::time::Duration::from_secs(3600))),
        "https://gateway.example.com".to_string(),
        true,
    ));
    llmgw_auth::sso::router(handler)
}

fn extract_cookie(headers: &axum::http::HeaderMap, name: &str) -> Option<String> {
    headers.get_all("set-cookie").iter().find_map(|v| {
        let raw = v.to_str().ok()?;
        let (key, rest) = raw.split_once('=')?;
        if key == name {
            Some(rest.split(';').next().unwrap_or_default().to_string())
        } else {
            None
        }
    })
}

#[tokio::test]
async fn mismatched_state_is_rejected_and_no_session_is_created() {
    let app = app();

    let start = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/fake")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(start.status(), StatusCode::SEE_OTHER);
    let location = start
        .headers()
        .get("location")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    let oauth_state_cookie = extract_cookie(start.headers(), "oauth_state").unwrap();

    let real_state = location.split("state=").nth(1).unwrap().to_string();
    let forged_state = format!("{real_state}-tampered");

    let callback = app
        .oneshot(
            Request::builder()
                .uri(format!("/fake/callback?code=abc&state={forged_state}"))
                .header("cookie", format!("oauth_state={oauth_state_cookie}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(callback.status(), StatusCode::BAD_REQUEST);
    assert!(extract_cookie(callback.headers(), "session_id").is_none());
    let body = callback.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(body.as_ref(), b"invalid state parameter");
}
