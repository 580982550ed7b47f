use std::sync::Arc;

use axum::routing::{delete, get, patch, post, put};
use axum::Router;

use crate::state::ControlState;
use crate::{iam, models, usage};

/// Assembles the control-plane RPC surface as plain JSON-over-HTTP routes
/// (not gRPC/protobuf). Every handler takes the `CurrentUser` extractor
/// rather than a single shared admin gate.
pub fn router(state: Arc<ControlState>) -> Router {
    Router::new()
        .route("/users", post(iam::create_user))
        .route("/users/me", get(iam::get_current_user))
        .route("/users/by-email", get(iam::get_user_by_email))
        .route(
            "/users/by-external-id/{provider}/{external_id}",
            get(iam::get_user_by_external_id),
        )
        .route(
            "/users/{id}",
            get(iam::get_user).patch(iam::update_user).delete(iam::delete_user),
        )
        .route("/users/{id}/tokens", post(iam::create_token).get(iam::list_user_tokens))
        .route("/tokens/{id}", delete(iam::revoke_token))
        .route("/organizations", post(iam::create_organization).get(iam::list_organizations))
        .route(
            "/organizations/{id}",
            get(iam::get_organization)
                .patch(iam::update_organization)
                .delete(iam::delete_organization),
        )
        .route("/organizations/by-name/{name}", get(iam::get_organization_by_name))
        .route("/organizations/{id}/users", get(iam::list_users_by_organization))
        .route(
            "/organizations/{id}/usage/summary",
            get(usage::get_organization_usage_summary),
        )
        .route("/providers", get(models::list_supported_providers))
        .route("/credential-types", get(models::list_supported_credential_types))
        .route(
            "/providers/{provider}/models",
            get(models::list_supported_models_for_provider),
        )
        .route("/credentials", post(models::create_credential).get(models::list_credentials))
        .route(
            "/credentials/{id}",
            get(models::get_credential).patch(models::update_credential),
        )
        .route("/credentials/{id}/enabled", put(models::set_credential_enabled))
        .route("/models", post(models::create_model).get(models::list_models))
        .route("/models/{id}", get(models::get_model))
        .route(
            "/models/{id}/capabilities",
            patch(models::update_model_capabilities),
        )
        .route("/models/{id}/enabled", put(models::set_model_enabled))
        .route("/usage/summary", get(usage::get_usage_summary))
        .route("/usage/details", get(usage::get_usage_details))
        .route("/usage/costs", get(usage::get_usage_costs))
        .with_state(state)
}
