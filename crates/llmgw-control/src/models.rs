use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use llmgw_domain::{
    CredentialType, Model, ModelCapabilities, ModelCapabilitiesPatch, ModelPricing,
    OpenRouterCredential,
};
use serde::Deserialize;
use serde_json::Value;

use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::state::ControlState;

/// Only OpenRouter-backed credentials exist today; kept as a list rather
/// than a constant so a second provider only needs an entry here plus a
/// new `CredentialType` variant.
pub async fn list_supported_providers(CurrentUser(_): CurrentUser) -> Json<Vec<&'static str>> {
    Json(vec!["openrouter"])
}

pub async fn list_supported_credential_types(
    CurrentUser(_): CurrentUser,
) -> Json<Vec<&'static str>> {
    Json(vec!["openrouter"])
}

pub async fn list_supported_models_for_provider(
    State(state): State<Arc<ControlState>>,
    CurrentUser(_): CurrentUser,
    Path(provider): Path<String>,
) -> Result<Json<Vec<Model>>, ApiError> {
    let models = state.model_cache.list_enabled().await?;
    Ok(Json(
        models.iter().filter(|m| m.provider_id == provider).cloned().collect(),
    ))
}

#[derive(Deserialize)]
pub struct CreateCredentialRequest {
    pub name: String,
    pub description: Option<String>,
    pub api_key: String,
    pub site_name: Option<String>,
    pub http_referer: Option<String>,
}

pub async fn create_credential(
    State(state): State<Arc<ControlState>>,
    CurrentUser(caller): CurrentUser,
    Json(req): Json<CreateCredentialRequest>,
) -> Result<Json<OpenRouterCredential>, ApiError> {
    if !caller.system_admin {
        return Err(ApiError::PermissionDenied);
    }
    let credential = OpenRouterCredential {
        id: 0,
        name: req.name,
        description: req.description,
        api_key: req.api_key,
        site_name: req.site_name,
        http_referer: req.http_referer,
        enabled: true,
    };
    Ok(Json(state.credentials.create(credential).await?))
}

pub async fn get_credential(
    State(state): State<Arc<ControlState>>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<OpenRouterCredential>, ApiError> {
    if !caller.system_admin {
        return Err(ApiError::PermissionDenied);
    }
    Ok(Json(state.credential_cache.get(id).await?))
}

pub async fn list_credentials(
    State(state): State<Arc<ControlState>>,
    CurrentUser(caller): CurrentUser,
) -> Result<Json<Vec<OpenRouterCredential>>, ApiError> {
    if !caller.system_admin {
        return Err(ApiError::PermissionDenied);
    }
    Ok(Json(state.credentials.list_enabled().await?))
}

#[derive(Deserialize)]
pub struct UpdateCredentialRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub api_key: Option<String>,
    pub site_name: Option<String>,
    pub http_referer: Option<String>,
}

pub async fn update_credential(
    State(state): State<Arc<ControlState>>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdateCredentialRequest>,
) -> Result<Json<OpenRouterCredential>, ApiError> {
    if !caller.system_admin {
        return Err(ApiError::PermissionDenied);
    }
    let mut credential = state.credentials.get(id).await?;
    if let Some(name) = req.name {
        credential.name = name;
    }
    if req.description.is_some() {
        credential.description = req.description;
    }
    if let Some(api_key) = req.api_key {
        credential.api_key = api_key;
    }
    if req.site_name.is_some() {
        credential.site_name = req.site_name;
    }
    if req.http_referer.is_some() {
        credential.http_referer = req.http_referer;
    }
    let updated = state.credentials.update(credential).await?;
    state.credential_cache.invalidate(id);
    Ok(Json(updated))
}

#[derive(Deserialize)]
pub struct SetEnabledRequest {
    pub enabled: bool,
}

pub async fn set_credential_enabled(
    State(state): State<Arc<ControlState>>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<i64>,
    Json(req): Json<SetEnabledRequest>,
) -> Result<(), ApiError> {
    if !caller.system_admin {
        return Err(ApiError::PermissionDenied);
    }
    state.credentials.set_enabled(id, req.enabled).await?;
    state.credential_cache.invalidate(id);
    Ok(())
}

#[derive(Deserialize)]
pub struct CreateModelRequest {
    pub id: String,
    pub name: String,
    pub provider_id: String,
    pub credential_id: i64,
    pub pricing: ModelPricing,
    pub capabilities: ModelCapabilities,
    #[serde(default)]
    pub metadata: Value,
}

pub async fn create_model(
    State(state): State<Arc<ControlState>>,
    CurrentUser(caller): CurrentUser,
    Json(req): Json<CreateModelRequest>,
) -> Result<Json<Model>, ApiError> {
    if !caller.system_admin {
        return Err(ApiError::PermissionDenied);
    }
    let credential = state.credentials.get(req.credential_id).await?;
    if !credential.enabled {
        return Err(ApiError::FailedPrecondition(
            "credential is disabled".to_string(),
        ));
    }
    let model = Model {
        id: req.id,
        name: req.name,
        provider_id: req.provider_id,
        credential_id: req.credential_id,
        credential_type: CredentialType::Openrouter,
        pricing: req.pricing,
        capabilities: req.capabilities,
        metadata: req.metadata,
        enabled: true,
    };
    let created = state.models.create(model).await?;
    state.model_cache.invalidate_all();
    Ok(Json(created))
}

pub async fn get_model(
    State(state): State<Arc<ControlState>>,
    CurrentUser(_): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Model>, ApiError> {
    Ok(Json(state.model_cache.get(&id).await?))
}

pub async fn list_models(
    State(state): State<Arc<ControlState>>,
    CurrentUser(_): CurrentUser,
) -> Result<Json<Vec<Model>>, ApiError> {
    let models = state.model_cache.list_enabled().await?;
    Ok(Json(models.as_ref().clone()))
}

pub async fn update_model_capabilities(
    State(state): State<Arc<ControlState>>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<String>,
    Json(patch): Json<ModelCapabilitiesPatch>,
) -> Result<Json<Model>, ApiError> {
    if !caller.system_admin {
        return Err(ApiError::PermissionDenied);
    }
    let updated = state.models.update_capabilities(&id, patch).await?;
    state.model_cache.invalidate(&id);
    Ok(Json(updated))
}

pub async fn set_model_enabled(
    State(state): State<Arc<ControlState>>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<SetEnabledRequest>,
) -> Result<(), ApiError> {
    if !caller.system_admin {
        return Err(ApiError::PermissionDenied);
    }
    state.models.set_enabled(&id, req.enabled).await?;
    state.model_cache.invalidate(&id);
    Ok(())
}
