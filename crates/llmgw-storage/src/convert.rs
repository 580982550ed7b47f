use std::collections::HashMap;

use llmgw_domain::{
    AuthProviderKind, CredentialType, FailureStage, Model as ModelEntity, ModelCapabilities,
    ModelPricing, OpenRouterCredential, Organization, SsoType, UsageDataSource, UsageEvent,
    UsageStatus, User,
};

use crate::entities;

pub fn org_from_row(row: entities::organizations::Model) -> Organization {
    Organization {
        id: row.id,
        name: row.name,
        display_name: row.display_name,
        is_system: row.is_system,
        created_at: row.created_at,
        sso_type: row.sso_type.as_deref().and_then(sso_type_from_str),
        sso_config: serde_json::from_value(row.sso_config_json).unwrap_or_default(),
    }
}

fn sso_type_from_str(s: &str) -> Option<SsoType> {
    match s {
        "oidc" => Some(SsoType::Oidc),
        "saml" => Some(SsoType::Saml),
        _ => None,
    }
}

pub fn sso_type_to_str(t: Option<SsoType>) -> Option<String> {
    t.map(|t| match t {
        SsoType::Oidc => "oidc".to_string(),
        SsoType::Saml => "saml".to_string(),
    })
}

pub fn user_from_row(row: entities::users::Model) -> User {
    User {
        id: row.id,
        email: row.email,
        name: row.name,
        organization_id: row.organization_id,
        external_id: llmgw_common::optional::normalize_empty(row.external_id),
        provider: provider_from_str(&row.provider),
        system_admin: row.system_admin,
        created_at: row.created_at,
        last_login: row.last_login,
    }
}

pub fn provider_from_str(s: &str) -> AuthProviderKind {
    match s {
        "oidc" => AuthProviderKind::Oidc,
        "saml" => AuthProviderKind::Saml,
        "github" => AuthProviderKind::Github,
        _ => AuthProviderKind::None,
    }
}

pub fn provider_to_str(p: AuthProviderKind) -> &'static str {
    match p {
        AuthProviderKind::Oidc => "oidc",
        AuthProviderKind::Saml => "saml",
        AuthProviderKind::Github => "github",
        AuthProviderKind::None => "none",
    }
}

pub fn credential_from_row(row: entities::openrouter_credentials::Model) -> OpenRouterCredential {
    OpenRouterCredential {
        id: row.id,
        name: row.name,
        description: llmgw_common::optional::normalize_empty(row.description),
        api_key: row.api_key,
        site_name: llmgw_common::optional::normalize_empty(row.site_name),
        http_referer: llmgw_common::optional::normalize_empty(row.http_referer),
        enabled: row.enabled,
    }
}

pub fn model_from_row(row: entities::models::Model) -> ModelEntity {
    ModelEntity {
        id: row.id,
        name: row.name,
        provider_id: row.provider_id,
        credential_id: row.credential_id,
        credential_type: credential_type_from_str(&row.credential_type)
            .unwrap_or(CredentialType::Openrouter),
        pricing: ModelPricing {
            input_cost_per_token: row.input_cost_per_token,
            output_cost_per_token: row.output_cost_per_token,
        },
        capabilities: ModelCapabilities {
            streaming: row.cap_streaming,
            json: row.cap_json,
            tools: row.cap_tools,
            vision: row.cap_vision,
            reasoning: row.cap_reasoning,
            max_input_tokens: row.cap_max_input_tokens as u32,
            max_output_tokens: row.cap_max_output_tokens as u32,
        },
        metadata: row.metadata_json,
        enabled: row.enabled,
    }
}

pub fn status_to_str(s: UsageStatus) -> &'static str {
    match s {
        UsageStatus::Success => "success",
        UsageStatus::Failed => "failed",
        UsageStatus::Timeout => "timeout",
        UsageStatus::Cancelled => "cancelled",
    }
}

pub fn status_from_str(s: &str) -> UsageStatus {
    match s {
        "failed" => UsageStatus::Failed,
        "timeout" => UsageStatus::Timeout,
        "cancelled" => UsageStatus::Cancelled,
        _ => UsageStatus::Success,
    }
}

pub fn failure_stage_to_str(s: Option<FailureStage>) -> Option<&'static str> {
    s.map(|s| match s {
        FailureStage::PreGeneration => "pre_generation",
        FailureStage::DuringGeneration => "during_generation",
        FailureStage::PostGeneration => "post_generation",
    })
}

pub fn failure_stage_from_str(s: Option<&str>) -> Option<FailureStage> {
    match s {
        Some("pre_generation") => Some(FailureStage::PreGeneration),
        Some("during_generation") => Some(FailureStage::DuringGeneration),
        Some("post_generation") => Some(FailureStage::PostGeneration),
        _ => None,
    }
}

pub fn usage_source_to_str(s: UsageDataSource) -> &'static str {
    match s {
        UsageDataSource::ProviderResponse => "provider_response",
        UsageDataSource::Unavailable => "unavailable",
        UsageDataSource::StreamingIncomplete => "streaming_incomplete",
    }
}

pub fn usage_source_from_str(s: &str) -> UsageDataSource {
    match s {
        "provider_response" => UsageDataSource::ProviderResponse,
        "streaming_incomplete" => UsageDataSource::StreamingIncomplete,
        _ => UsageDataSource::Unavailable,
    }
}

pub fn usage_event_from_row(row: entities::usage_events::Model) -> UsageEvent {
    UsageEvent {
        id: row.id,
        request_id: row.request_id,
        user_id: row.user_id,
        model_id: row.model_id,
        input_tokens: row.input_tokens,
        output_tokens: row.output_tokens,
        cached_tokens: row.cached_tokens,
        reasoning_tokens: row.reasoning_tokens,
        status: status_from_str(&row.status),
        failure_stage: failure_stage_from_str(row.failure_stage.as_deref()),
        error_type: llmgw_common::optional::normalize_empty(row.error_type),
        error_message: llmgw_common::optional::normalize_empty(row.error_message),
        usage_data_source: usage_source_from_str(&row.usage_data_source),
        data_complete: row.data_complete,
        timestamp: row.timestamp,
        duration_ms: row.duration_ms,
        input_cost_cents: row.input_cost_cents,
        output_cost_cents: row.output_cost_cents,
        total_cost_cents: row.total_cost_cents,
    }
}

pub fn json_map_to_value(map: &HashMap<String, String>) -> serde_json::Value {
    serde_json::to_value(map).unwrap_or(serde_json::Value::Null)
}

/// Kept for symmetry with `provider_from_str`/`sso_type_from_str`; used by
/// call sites that only have a raw credential-type string to validate.
pub fn credential_type_from_str(s: &str) -> Option<CredentialType> {
    match s {
        "openrouter" => Some(CredentialType::Openrouter),
        _ => None,
    }
}
