use async_trait::async_trait;
use llmgw_common::RepoError;
use llmgw_domain::{
    ApiToken, BillingRepository, BillingSummary, CredentialRepository, IdentityRepository, Model,
    ModelCapabilitiesPatch, ModelRepository, OpenRouterCredential, Organization,
    TokenRepository, UsageEvent, UsageRepository, User,
};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, Schema,
};

use crate::convert;
use crate::db::connect_shared;
use crate::entities;

fn db_err(err: DbErr) -> RepoError {
    RepoError::internal(anyhow::anyhow!(err))
}

/// Backs every repository trait in `llmgw-domain` with a single `sea_orm`
/// connection. Each repository trait is implemented directly on this one
/// struct rather than wrapped behind one catch-all `Storage` trait, since
/// `llmgw-domain` already splits the contract per component.
#[derive(Clone)]
pub struct SeaOrmStorage {
    db: DatabaseConnection,
}

impl SeaOrmStorage {
    pub async fn connect(dsn: &str) -> Result<Self, DbErr> {
        let db = connect_shared(dsn).await?;
        Ok(Self { db })
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Creates every table if missing. Runtime reads/writes never attempt
    /// DDL themselves; this is called once at bootstrap.
    pub async fn sync(&self) -> Result<(), DbErr> {
        let backend = self.db.get_database_backend();
        let schema = Schema::new(backend);
        schema
            .builder()
            .register(entities::Organizations)
            .register(entities::Users)
            .register(entities::ApiTokens)
            .register(entities::OpenRouterCredentials)
            .register(entities::Models)
            .register(entities::UsageEvents)
            .register(entities::BillingSummaries)
            .sync(&self.db)
            .await
    }
}

#[async_trait]
impl CredentialRepository for SeaOrmStorage {
    async fn get(&self, id: i64) -> Result<OpenRouterCredential, RepoError> {
        entities::OpenRouterCredentials::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(convert::credential_from_row)
            .ok_or(RepoError::NotFound)
    }

    async fn list_enabled(&self) -> Result<Vec<OpenRouterCredential>, RepoError> {
        use entities::openrouter_credentials::Column;
        entities::OpenRouterCredentials::find()
            .filter(Column::Enabled.eq(true))
            .all(&self.db)
            .await
            .map(|rows| rows.into_iter().map(convert::credential_from_row).collect())
            .map_err(db_err)
    }

    async fn create(&self, credential: OpenRouterCredential) -> Result<OpenRouterCredential, RepoError> {
        let active = entities::openrouter_credentials::ActiveModel {
            id: if credential.id == 0 {
                Default::default()
            } else {
                Set(credential.id)
            },
            name: Set(credential.name),
            description: Set(credential.description),
            api_key: Set(credential.api_key),
            site_name: Set(credential.site_name),
            http_referer: Set(credential.http_referer),
            enabled: Set(credential.enabled),
        };
        let row = active.insert(&self.db).await.map_err(db_err)?;
        Ok(convert::credential_from_row(row))
    }

    async fn update(&self, credential: OpenRouterCredential) -> Result<OpenRouterCredential, RepoError> {
        let active = entities::openrouter_credentials::ActiveModel {
            id: Set(credential.id),
            name: Set(credential.name),
            description: Set(credential.description),
            api_key: Set(credential.api_key),
            site_name: Set(credential.site_name),
            http_referer: Set(credential.http_referer),
            enabled: Set(credential.enabled),
        };
        let row = active.update(&self.db).await.map_err(db_err)?;
        Ok(convert::credential_from_row(row))
    }

    async fn set_enabled(&self, id: i64, enabled: bool) -> Result<(), RepoError> {
        let mut active = entities::openrouter_credentials::ActiveModel {
            id: Set(id),
            ..Default::default()
        };
        active.enabled = Set(enabled);
        entities::OpenRouterCredentials::update_many()
            .set(active)
            .filter(entities::openrouter_credentials::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}

#[async_trait]
impl TokenRepository for SeaOrmStorage {
    async fn create(&self, token: ApiToken) -> Result<ApiToken, RepoError> {
        let active = entities::api_tokens::ActiveModel {
            id: Default::default(),
            user_id: Set(token.user_id),
            description: Set(token.description),
            prefix_hash: Set(token.prefix_hash),
            token_hash: Set(token.token_hash),
            created_at: Set(token.created_at),
            expires_at: Set(token.expires_at),
            last_used_at: Set(token.last_used_at),
        };
        let row = active.insert(&self.db).await.map_err(db_err)?;
        Ok(token_from_row(row))
    }

    async fn get_by_prefix_hash(&self, prefix_hash: &str) -> Result<ApiToken, RepoError> {
        use entities::api_tokens::Column;
        entities::ApiTokens::find()
            .filter(Column::PrefixHash.eq(prefix_hash))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(token_from_row)
            .ok_or(RepoError::NotFound)
    }

    async fn get(&self, id: i64) -> Result<ApiToken, RepoError> {
        entities::ApiTokens::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(token_from_row)
            .ok_or(RepoError::NotFound)
    }

    async fn list_for_user(&self, user_id: i64) -> Result<Vec<ApiToken>, RepoError> {
        use entities::api_tokens::Column;
        entities::ApiTokens::find()
            .filter(Column::UserId.eq(user_id))
            .all(&self.db)
            .await
            .map(|rows| rows.into_iter().map(token_from_row).collect())
            .map_err(db_err)
    }

    async fn touch_last_used(&self, id: i64, at: time::OffsetDateTime) -> Result<(), RepoError> {
        let active = entities::api_tokens::ActiveModel {
            id: Set(id),
            last_used_at: Set(Some(at)),
            ..Default::default()
        };
        entities::ApiTokens::update_many()
            .set(active)
            .filter(entities::api_tokens::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn revoke(&self, id: i64) -> Result<(), RepoError> {
        entities::ApiTokens::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}

fn token_from_row(row: entities::api_tokens::Model) -> ApiToken {
    ApiToken {
        id: row.id,
        user_id: row.user_id,
        description: llmgw_common::optional::normalize_empty(row.description),
        prefix_hash: row.prefix_hash,
        token_hash: row.token_hash,
        created_at: row.created_at,
        expires_at: row.expires_at,
        last_used_at: row.last_used_at,
    }
}

#[async_trait]
impl IdentityRepository for SeaOrmStorage {
    async fn create_user(&self, user: User) -> Result<User, RepoError> {
        let active = entities::users::ActiveModel {
            id: Default::default(),
            email: Set(user.email),
            name: Set(user.name),
            organization_id: Set(user.organization_id),
            external_id: Set(user.external_id),
            provider: Set(convert::provider_to_str(user.provider).to_string()),
            system_admin: Set(user.system_admin),
            created_at: Set(user.created_at),
            last_login: Set(user.last_login),
        };
        let row = active.insert(&self.db).await.map_err(db_err)?;
        Ok(convert::user_from_row(row))
    }

    async fn get_user(&self, id: i64) -> Result<User, RepoError> {
        entities::Users::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(convert::user_from_row)
            .ok_or(RepoError::NotFound)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<User, RepoError> {
        use entities::users::Column;
        entities::Users::find()
            .filter(Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(convert::user_from_row)
            .ok_or(RepoError::NotFound)
    }

    async fn get_user_by_external_id(
        &self,
        provider: llmgw_domain::AuthProviderKind,
        external_id: &str,
    ) -> Result<User, RepoError> {
        use entities::users::Column;
        entities::Users::find()
            .filter(Column::Provider.eq(convert::provider_to_str(provider)))
            .filter(Column::ExternalId.eq(external_id))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(convert::user_from_row)
            .ok_or(RepoError::NotFound)
    }

    async fn list_users_by_organization(&self, org_id: i64) -> Result<Vec<User>, RepoError> {
        use entities::users::Column;
        entities::Users::find()
            .filter(Column::OrganizationId.eq(org_id))
            .all(&self.db)
            .await
            .map(|rows| rows.into_iter().map(convert::user_from_row).collect())
            .map_err(db_err)
    }

    async fn update_user(&self, user: User) -> Result<User, RepoError> {
        let active = entities::users::ActiveModel {
            id: Set(user.id),
            email: Set(user.email),
            name: Set(user.name),
            organization_id: Set(user.organization_id),
            external_id: Set(user.external_id),
            provider: Set(convert::provider_to_str(user.provider).to_string()),
            system_admin: Set(user.system_admin),
            created_at: Set(user.created_at),
            last_login: Set(user.last_login),
        };
        let row = active.update(&self.db).await.map_err(db_err)?;
        Ok(convert::user_from_row(row))
    }

    async fn delete_user(&self, id: i64) -> Result<(), RepoError> {
        // api_tokens.user_id carries on_delete = Cascade at the schema
        // level; deleting the user row is sufficient.
        entities::Users::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn create_organization(&self, org: Organization) -> Result<Organization, RepoError> {
        let active = entities::organizations::ActiveModel {
            id: Default::default(),
            name: Set(org.name),
            display_name: Set(org.display_name),
            is_system: Set(org.is_system),
            created_at: Set(org.created_at),
            sso_type: Set(convert::sso_type_to_str(org.sso_type)),
            sso_config_json: Set(convert::json_map_to_value(&org.sso_config)),
        };
        let row = active.insert(&self.db).await.map_err(db_err)?;
        Ok(convert::org_from_row(row))
    }

    async fn get_organization(&self, id: i64) -> Result<Organization, RepoError> {
        entities::Organizations::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(convert::org_from_row)
            .ok_or(RepoError::NotFound)
    }

    async fn get_organization_by_name(&self, name: &str) -> Result<Organization, RepoError> {
        use entities::organizations::Column;
        entities::Organizations::find()
            .filter(Column::Name.eq(name))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(convert::org_from_row)
            .ok_or(RepoError::NotFound)
    }

    async fn list_organizations(&self) -> Result<Vec<Organization>, RepoError> {
        entities::Organizations::find()
            .all(&self.db)
            .await
            .map(|rows| rows.into_iter().map(convert::org_from_row).collect())
            .map_err(db_err)
    }

    async fn update_organization(&self, org: Organization) -> Result<Organization, RepoError> {
        let active = entities::organizations::ActiveModel {
            id: Set(org.id),
            name: Set(org.name),
            display_name: Set(org.display_name),
            is_system: Set(org.is_system),
            created_at: Set(org.created_at),
            sso_type: Set(convert::sso_type_to_str(org.sso_type)),
            sso_config_json: Set(convert::json_map_to_value(&org.sso_config)),
        };
        let row = active.update(&self.db).await.map_err(db_err)?;
        Ok(convert::org_from_row(row))
    }

    async fn delete_organization(&self, id: i64, force: bool) -> Result<(), RepoError> {
        if !force {
            let members = self.organization_member_count(id).await?;
            if members > 0 {
                return Err(RepoError::FailedPrecondition(
                    "organization has members; pass force=true".to_string(),
                ));
            }
        }
        // Users cascade-delete their tokens at the schema level; deleting
        // users first then the organization keeps the cascade explicit and
        // portable across backends whose FK cascade support differs.
        use entities::users::Column;
        let member_ids: Vec<i64> = entities::Users::find()
            .filter(Column::OrganizationId.eq(id))
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(|u| u.id)
            .collect();
        for user_id in member_ids {
            self.delete_user(user_id).await?;
        }
        entities::Organizations::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn organization_member_count(&self, id: i64) -> Result<u64, RepoError> {
        use entities::users::Column;
        entities::Users::find()
            .filter(Column::OrganizationId.eq(id))
            .count(&self.db)
            .await
            .map_err(db_err)
    }
}

#[async_trait]
impl ModelRepository for SeaOrmStorage {
    async fn get(&self, id: &str) -> Result<Model, RepoError> {
        entities::Models::find_by_id(id.to_string())
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(convert::model_from_row)
            .ok_or(RepoError::NotFound)
    }

    async fn list_enabled(&self) -> Result<Vec<Model>, RepoError> {
        use entities::models::Column;
        entities::Models::find()
            .filter(Column::Enabled.eq(true))
            .all(&self.db)
            .await
            .map(|rows| rows.into_iter().map(convert::model_from_row).collect())
            .map_err(db_err)
    }

    async fn create(&self, model: Model) -> Result<Model, RepoError> {
        self.validate_credential_reference(&model).await?;
        let active = model_to_active(&model);
        let row = active.insert(&self.db).await.map_err(db_err)?;
        Ok(convert::model_from_row(row))
    }

    async fn update_capabilities(
        &self,
        id: &str,
        patch: ModelCapabilitiesPatch,
    ) -> Result<Model, RepoError> {
        let current = ModelRepository::get(self, id).await?;
        let capabilities = patch.apply(current.capabilities);
        let active = entities::models::ActiveModel {
            id: Set(id.to_string()),
            cap_streaming: Set(capabilities.streaming),
            cap_json: Set(capabilities.json),
            cap_tools: Set(capabilities.tools),
            cap_vision: Set(capabilities.vision),
            cap_reasoning: Set(capabilities.reasoning),
            cap_max_input_tokens: Set(capabilities.max_input_tokens as i32),
            cap_max_output_tokens: Set(capabilities.max_output_tokens as i32),
            ..Default::default()
        };
        entities::Models::update_many()
            .set(active)
            .filter(entities::models::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        ModelRepository::get(self, id).await
    }

    async fn set_enabled(&self, id: &str, enabled: bool) -> Result<(), RepoError> {
        let active = entities::models::ActiveModel {
            id: Set(id.to_string()),
            enabled: Set(enabled),
            ..Default::default()
        };
        entities::Models::update_many()
            .set(active)
            .filter(entities::models::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}

impl SeaOrmStorage {
    /// Enforces referential integrity: a model with
    /// `credentialType="openrouter"` must reference an enabled credential.
    async fn validate_credential_reference(&self, model: &Model) -> Result<(), RepoError> {
        let credential = CredentialRepository::get(self, model.credential_id)
            .await
            .map_err(|err| match err {
                RepoError::NotFound => RepoError::FailedPrecondition(
                    "referenced credential does not exist".to_string(),
                ),
                other => other,
            })?;
        if !credential.enabled {
            return Err(RepoError::FailedPrecondition(
                "referenced credential is disabled".to_string(),
            ));
        }
        Ok(())
    }
}

fn model_to_active(model: &Model) -> entities::models::ActiveModel {
    entities::models::ActiveModel {
        id: Set(model.id.clone()),
        name: Set(model.name.clone()),
        provider_id: Set(model.provider_id.clone()),
        credential_id: Set(model.credential_id),
        credential_type: Set("openrouter".to_string()),
        input_cost_per_token: Set(model.pricing.input_cost_per_token),
        output_cost_per_token: Set(model.pricing.output_cost_per_token),
        cap_streaming: Set(model.capabilities.streaming),
        cap_json: Set(model.capabilities.json),
        cap_tools: Set(model.capabilities.tools),
        cap_vision: Set(model.capabilities.vision),
        cap_reasoning: Set(model.capabilities.reasoning),
        cap_max_input_tokens: Set(model.capabilities.max_input_tokens as i32),
        cap_max_output_tokens: Set(model.capabilities.max_output_tokens as i32),
        metadata_json: Set(model.metadata.clone()),
        enabled: Set(model.enabled),
    }
}

#[async_trait]
impl UsageRepository for SeaOrmStorage {
    async fn append(&self, event: UsageEvent) -> Result<UsageEvent, RepoError> {
        let active = entities::usage_events::ActiveModel {
            id: Default::default(),
            request_id: Set(event.request_id),
            user_id: Set(event.user_id),
            model_id: Set(event.model_id),
            input_tokens: Set(event.input_tokens),
            output_tokens: Set(event.output_tokens),
            cached_tokens: Set(event.cached_tokens),
            reasoning_tokens: Set(event.reasoning_tokens),
            status: Set(convert::status_to_str(event.status).to_string()),
            failure_stage: Set(convert::failure_stage_to_str(event.failure_stage)
                .map(|s| s.to_string())),
            error_type: Set(event.error_type),
            error_message: Set(event.error_message),
            usage_data_source: Set(convert::usage_source_to_str(event.usage_data_source)
                .to_string()),
            data_complete: Set(event.data_complete),
            timestamp: Set(event.timestamp),
            duration_ms: Set(event.duration_ms),
            input_cost_cents: Set(event.input_cost_cents),
            output_cost_cents: Set(event.output_cost_cents),
            total_cost_cents: Set(event.total_cost_cents),
        };
        let row = active.insert(&self.db).await.map_err(db_err)?;
        Ok(convert::usage_event_from_row(row))
    }

    async fn query(
        &self,
        filter: llmgw_domain::repo::UsageQueryFilter,
    ) -> Result<Vec<UsageEvent>, RepoError> {
        use entities::usage_events::Column;
        let mut query = entities::UsageEvents::find();
        if let Some(user_id) = filter.user_id {
            query = query.filter(Column::UserId.eq(user_id));
        }
        if let Some(model_id) = filter.model_id {
            query = query.filter(Column::ModelId.eq(model_id));
        }
        if let Some(start) = filter.start {
            query = query.filter(Column::Timestamp.gte(start));
        }
        if let Some(end) = filter.end {
            query = query.filter(Column::Timestamp.lt(end));
        }
        if let Some(offset) = filter.offset {
            query = query.offset(offset);
        }
        if let Some(limit) = filter.limit {
            query = query.limit(limit);
        }
        query
            .all(&self.db)
            .await
            .map(|rows| rows.into_iter().map(convert::usage_event_from_row).collect())
            .map_err(db_err)
    }

    async fn update_cost_fields(
        &self,
        id: i64,
        input_cost_cents: llmgw_common::money::Cents,
        output_cost_cents: llmgw_common::money::Cents,
        total_cost_cents: llmgw_common::money::Cents,
    ) -> Result<(), RepoError> {
        let active = entities::usage_events::ActiveModel {
            id: Set(id),
            input_cost_cents: Set(Some(input_cost_cents)),
            output_cost_cents: Set(Some(output_cost_cents)),
            total_cost_cents: Set(Some(total_cost_cents)),
            ..Default::default()
        };
        entities::UsageEvents::update_many()
            .set(active)
            .filter(entities::usage_events::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}

#[async_trait]
impl BillingRepository for SeaOrmStorage {
    async fn get_for_period(
        &self,
        user_id: i64,
        period_start: time::OffsetDateTime,
        period_end: time::OffsetDateTime,
    ) -> Result<Option<BillingSummary>, RepoError> {
        use entities::billing_summaries::Column;
        entities::BillingSummaries::find()
            .filter(Column::UserId.eq(user_id))
            .filter(Column::PeriodStart.eq(period_start))
            .filter(Column::PeriodEnd.eq(period_end))
            .one(&self.db)
            .await
            .map(|row| row.map(summary_from_row))
            .map_err(db_err)
    }

    async fn upsert(&self, summary: BillingSummary) -> Result<BillingSummary, RepoError> {
        let active = entities::billing_summaries::ActiveModel {
            id: if summary.id == 0 {
                Default::default()
            } else {
                Set(summary.id)
            },
            user_id: Set(summary.user_id),
            period_start: Set(summary.period_start),
            period_end: Set(summary.period_end),
            total_requests: Set(summary.total_requests),
            total_input_tokens: Set(summary.total_input_tokens),
            total_output_tokens: Set(summary.total_output_tokens),
            total_cost_cents: Set(summary.total_cost_cents),
            created_at: Set(summary.created_at),
        };
        let row = if summary.id == 0 {
            active.insert(&self.db).await.map_err(db_err)?
        } else {
            active.update(&self.db).await.map_err(db_err)?
        };
        Ok(summary_from_row(row))
    }
}

fn summary_from_row(row: entities::billing_summaries::Model) -> BillingSummary {
    BillingSummary {
        id: row.id,
        user_id: row.user_id,
        period_start: row.period_start,
        period_end: row.period_end,
        total_requests: row.total_requests,
        total_input_tokens: row.total_input_tokens,
        total_output_tokens: row.total_output_tokens,
        total_cost_cents: row.total_cost_cents,
        created_at: row.created_at,
    }
}
