use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use llmgw_auth::hash;
use llmgw_domain::{ApiToken, AuthProviderKind, Organization, User};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::state::ControlState;

/// Token issuance defaults to a year when the caller does not pin a
/// shorter lifetime (see `DESIGN.md`).
const DEFAULT_TOKEN_TTL_DAYS: i64 = 365;

#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub name: String,
    pub organization_id: i64,
}

pub async fn create_user(
    State(state): State<Arc<ControlState>>,
    CurrentUser(caller): CurrentUser,
    Json(req): Json<CreateUserRequest>,
) -> Result<Json<User>, ApiError> {
    if !caller.can_view_organization(req.organization_id) {
        return Err(ApiError::PermissionDenied);
    }
    let user = User {
        id: 0,
        email: req.email,
        name: req.name,
        organization_id: req.organization_id,
        external_id: None,
        provider: AuthProviderKind::None,
        system_admin: false,
        created_at: OffsetDateTime::now_utc(),
        last_login: None,
    };
    Ok(Json(state.identities.create_user(user).await?))
}

pub async fn get_user(
    State(state): State<Arc<ControlState>>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<User>, ApiError> {
    let user = state.identities.get_user(id).await?;
    if !caller.can_view_organization(user.organization_id) {
        return Err(ApiError::PermissionDenied);
    }
    Ok(Json(user))
}

#[derive(Deserialize)]
pub struct EmailQuery {
    pub email: String,
}

pub async fn get_user_by_email(
    State(state): State<Arc<ControlState>>,
    CurrentUser(caller): CurrentUser,
    Query(query): Query<EmailQuery>,
) -> Result<Json<User>, ApiError> {
    let user = state.identities.get_user_by_email(&query.email).await?;
    if !caller.can_view_organization(user.organization_id) {
        return Err(ApiError::PermissionDenied);
    }
    Ok(Json(user))
}

pub async fn get_user_by_external_id(
    State(state): State<Arc<ControlState>>,
    CurrentUser(caller): CurrentUser,
    Path((provider, external_id)): Path<(String, String)>,
) -> Result<Json<User>, ApiError> {
    let provider = parse_provider(&provider)?;
    let user = state
        .identities
        .get_user_by_external_id(provider, &external_id)
        .await?;
    if !caller.can_view_organization(user.organization_id) {
        return Err(ApiError::PermissionDenied);
    }
    Ok(Json(user))
}

pub async fn get_current_user(CurrentUser(caller): CurrentUser) -> Json<User> {
    Json(caller)
}

pub async fn list_users_by_organization(
    State(state): State<Arc<ControlState>>,
    CurrentUser(caller): CurrentUser,
    Path(org_id): Path<i64>,
) -> Result<Json<Vec<User>>, ApiError> {
    if !caller.can_view_organization(org_id) {
        return Err(ApiError::PermissionDenied);
    }
    Ok(Json(state.identities.list_users_by_organization(org_id).await?))
}

#[derive(Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
}

pub async fn update_user(
    State(state): State<Arc<ControlState>>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<User>, ApiError> {
    if !caller.can_act_as(id) {
        return Err(ApiError::PermissionDenied);
    }
    let mut user = state.identities.get_user(id).await?;
    if let Some(name) = req.name {
        user.name = name;
    }
    Ok(Json(state.identities.update_user(user).await?))
}

pub async fn delete_user(
    State(state): State<Arc<ControlState>>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<i64>,
) -> Result<(), ApiError> {
    if !caller.can_act_as(id) {
        return Err(ApiError::PermissionDenied);
    }
    state.identities.delete_user(id).await?;
    Ok(())
}

#[derive(Deserialize)]
pub struct CreateOrganizationRequest {
    pub name: String,
    pub display_name: String,
}

pub async fn create_organization(
    State(state): State<Arc<ControlState>>,
    CurrentUser(caller): CurrentUser,
    Json(req): Json<CreateOrganizationRequest>,
) -> Result<Json<Organization>, ApiError> {
    if !caller.system_admin {
        return Err(ApiError::PermissionDenied);
    }
    let org = Organization {
        id: 0,
        name: req.name,
        display_name: req.display_name,
        is_system: false,
        created_at: OffsetDateTime::now_utc(),
        sso_type: None,
        sso_config: Default::default(),
    };
    Ok(Json(state.identities.create_organization(org).await?))
}

pub async fn get_organization(
    State(state): State<Arc<ControlState>>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Organization>, ApiError> {
    if !caller.can_view_organization(id) {
        return Err(ApiError::PermissionDenied);
    }
    Ok(Json(state.identities.get_organization(id).await?))
}

pub async fn get_organization_by_name(
    State(state): State<Arc<ControlState>>,
    CurrentUser(caller): CurrentUser,
    Path(name): Path<String>,
) -> Result<Json<Organization>, ApiError> {
    let org = state.identities.get_organization_by_name(&name).await?;
    if !caller.can_view_organization(org.id) {
        return Err(ApiError::PermissionDenied);
    }
    Ok(Json(org))
}

pub async fn list_organizations(
    State(state): State<Arc<ControlState>>,
    CurrentUser(caller): CurrentUser,
) -> Result<Json<Vec<Organization>>, ApiError> {
    let orgs = state.identities.list_organizations().await?;
    if caller.system_admin {
        return Ok(Json(orgs));
    }
    Ok(Json(
        orgs.into_iter().filter(|o| o.id == caller.organization_id).collect(),
    ))
}

#[derive(Deserialize)]
pub struct UpdateOrganizationRequest {
    pub display_name: Option<String>,
}

pub async fn update_organization(
    State(state): State<Arc<ControlState>>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdateOrganizationRequest>,
) -> Result<Json<Organization>, ApiError> {
    if !caller.system_admin {
        return Err(ApiError::PermissionDenied);
    }
    let mut org = state.identities.get_organization(id).await?;
    if let Some(display_name) = req.display_name {
        org.display_name = display_name;
    }
    Ok(Json(state.identities.update_organization(org).await?))
}

#[derive(Deserialize)]
pub struct DeleteOrganizationQuery {
    #[serde(default)]
    pub force: bool,
}

pub async fn delete_organization(
    State(state): State<Arc<ControlState>>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<i64>,
    Query(query): Query<DeleteOrganizationQuery>,
) -> Result<(), ApiError> {
    if !caller.system_admin {
        return Err(ApiError::PermissionDenied);
    }
    if !query.force {
        let members = state.identities.organization_member_count(id).await?;
        if members > 0 {
            return Err(ApiError::FailedPrecondition(
                "organization has members; pass force=true to delete anyway".to_string(),
            ));
        }
    }
    state.identities.delete_organization(id, query.force).await?;
    Ok(())
}

#[derive(Deserialize)]
pub struct CreateTokenRequest {
    pub description: Option<String>,
    pub expires_in_days: Option<i64>,
}

#[derive(Serialize)]
pub struct CreateTokenResponse {
    pub token: ApiToken,
    pub raw_token: String,
}

pub async fn create_token(
    State(state): State<Arc<ControlState>>,
    CurrentUser(caller): CurrentUser,
    Path(user_id): Path<i64>,
    Json(req): Json<CreateTokenRequest>,
) -> Result<Json<CreateTokenResponse>, ApiError> {
    if !caller.can_act_as(user_id) {
        return Err(ApiError::PermissionDenied);
    }
    let raw_token = hash::generate_raw_token();
    let prefix_hash = hash::prefix_hash(&raw_token, state.token_prefix_length)
        .ok_or_else(|| ApiError::Internal)?;
    let token_hash = hash::hash_token(&raw_token).map_err(|_| ApiError::Internal)?;
    let ttl_days = req.expires_in_days.unwrap_or(DEFAULT_TOKEN_TTL_DAYS);
    let token = ApiToken {
        id: 0,
        user_id,
        description: req.description,
        prefix_hash,
        token_hash,
        created_at: OffsetDateTime::now_utc(),
        expires_at: OffsetDateTime::now_utc() + Duration::days(ttl_days),
        last_used_at: None,
    };
    let record = state.tokens.create(token).await?;
    Ok(Json(CreateTokenResponse { token: record, raw_token }))
}

pub async fn list_user_tokens(
    State(state): State<Arc<ControlState>>,
    CurrentUser(caller): CurrentUser,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<ApiToken>>, ApiError> {
    if !caller.can_act_as(user_id) {
        return Err(ApiError::PermissionDenied);
    }
    Ok(Json(state.tokens.list_for_user(user_id).await?))
}

pub async fn revoke_token(
    State(state): State<Arc<ControlState>>,
    CurrentUser(caller): CurrentUser,
    Path(token_id): Path<i64>,
) -> Result<(), ApiError> {
    let token = state.tokens.get(token_id).await?;
    if !caller.can_act_as(token.user_id) {
        return Err(ApiError::PermissionDenied);
    }
    state.tokens.revoke(token_id).await?;
    Ok(())
}

fn parse_provider(raw: &str) -> Result<AuthProviderKind, ApiError> {
    match raw {
        "oidc" => Ok(AuthProviderKind::Oidc),
        "saml" => Ok(AuthProviderKind::Saml),
        "github" => Ok(AuthProviderKind::Github),
        "none" => Ok(AuthProviderKind::None),
        _ => Err(ApiError::InvalidArgument(format!("unknown provider {raw}"))),
    }
}
