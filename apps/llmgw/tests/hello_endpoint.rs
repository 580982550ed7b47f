//! End-to-end coverage for the authenticated echo endpoint.

mod support;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use llmgw_auth::TokenAuthenticator;
use llmgw_gateway::{GatewayState, UpstreamClient};
use llmgw_usage::UsageEngine;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use support::InMemoryStorage;

async fn app_with_seeded_token() -> (axum::Router, String) {
    let storage = InMemoryStorage::new();
    let org = storage.seed_organization("Acme");
    let user = storage.seed_user(org.id, "u1@example.com", false);
    let raw_token = "R_abc123_happy_path_token";
    storage.seed_token(user.id, raw_token);

    let authenticator = Arc::new(TokenAuthenticator::new(storage.clone(), storage.clone(), 8));

    let models = Arc::new(llmgw_gateway::ModelCache::new(
        storage.clone(),
        Duration::from_secs(60),
        Duration::from_secs(60),
    ));
    let credentials = Arc::new(llmgw_gateway::CredentialCache::new(storage.clone(), Duration::from_secs(60)));
    let upstream = Arc::new(UpstreamClient::new(Duration::from_secs(30), None).unwrap());
    let shutdown = CancellationToken::new();
    let (usage, _persister) = UsageEngine::spawn(storage.clone(), 16, Duration::from_secs(5), shutdown);

    let state = Arc::new(GatewayState {
        models,
        credentials,
        upstream,
        usage,
    });

    (llmgw_gateway::router(state, authenticator), raw_token.to_string())
}

#[tokio::test]
async fn bearer_token_resolves_authenticated_user() {
    let (app, raw_token) = app_with_seeded_token().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/hello")
                .header("authorization", format!("Bearer {raw_token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(json.get("user_id").is_some());
}

#[tokio::test]
async fn x_api_key_header_resolves_authenticated_user() {
    let (app, raw_token) = app_with_seeded_token().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/hello")
                .header("x-api-key", raw_token)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn tampered_bearer_token_is_rejected() {
    let (app, raw_token) = app_with_seeded_token().await;
    let tampered = format!("{raw_token}x");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/hello")
                .header("authorization", format!("Bearer {tampered}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(body.as_ref(), b"Unauthorized: invalid credentials\n");
}
