//! End-to-end coverage for organization deletion through the control plane.

mod support;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use llmgw_auth::{SessionStore, TokenAuthenticator};
use llmgw_control::ControlState;

use support::InMemoryStorage;
use tower::ServiceExt;

async fn app_as_sysadmin() -> (axum::Router, i64, String) {
    let storage = InMemoryStorage::new();
    let org = storage.seed_organization("Acme");
    let admin = storage.seed_user(org.id, "admin@example.com", true);
    let raw_token = "R_sysadmin_token_for_tests";
    storage.seed_token(admin.id, raw_token);

    let authenticator = Arc::new(TokenAuthenticator::new(storage.clone(), storage.clone(), 8));
    let model_cache = Arc::new(llmgw_gateway::ModelCache::new(
        storage.clone(),
        Duration::from_secs(60),
        Duration::from_secs(60),
    ));
    let credential_cache = Arc::new(llmgw_gateway::CredentialCache::new(storage.clone(), Duration::from_secs(60)));

    let state = Arc::new(ControlState {
        identities: storage.clone(),
        tokens: storage.clone(),
        credentials: storage.clone(),
        models: storage.clone(),
        usage: storage.clone(),
        billing: storage.clone(),
        sessions: Arc::new(SessionStore::new(Duration::from_secs(3600))),
        authenticator,
        model_cache,
        credential_cache,
        token_prefix_length: 8,
    });

    (llmgw_control::router(state), org.id, raw_token.to_string())
}

#[tokio::test]
async fn delete_without_force_is_blocked_by_members() {
    let (app, org_id, raw_token) = app_as_sysadmin().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/organizations/{org_id}"))
                .header("authorization", format!("Bearer {raw_token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PRECONDITION_FAILED);
}

#[tokio::test]
async fn delete_with_force_removes_organization_and_members() {
    let (app, org_id, raw_token) = app_as_sysadmin().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/organizations/{org_id}?force=true"))
                .header("authorization", format!("Bearer {raw_token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    // The admin's own token was cascaded away with the organization, so a
    // second request using the same bearer token is now unauthenticated.
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/organizations/{org_id}"))
                .header("authorization", format!("Bearer {raw_token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
