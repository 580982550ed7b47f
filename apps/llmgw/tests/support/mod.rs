use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use llmgw_common::money::Cents;
use llmgw_common::RepoError;
use llmgw_domain::{
    ApiToken, AuthProviderKind, BillingRepository, BillingSummary, CredentialRepository,
    CredentialType, IdentityRepository, Model, ModelCapabilities, ModelCapabilitiesPatch,
    ModelPricing, ModelRepository, OpenRouterCredential, Organization, TokenRepository, UsageEvent,
    UsageQueryFilter, UsageRepository, User,
};
use parking_lot::Mutex;
use time::OffsetDateTime;

/// An in-memory stand-in for every repository trait, grounded on the
/// single-struct shape `llmgw-storage::SeaOrmStorage` uses for the real
/// backend. Exists only under `tests/`; production code never sees it.
#[derive(Default)]
pub struct InMemoryStorage {
    users: Mutex<HashMap<i64, User>>,
    organizations: Mutex<HashMap<i64, Organization>>,
    tokens: Mutex<HashMap<i64, ApiToken>>,
    credentials: Mutex<HashMap<i64, OpenRouterCredential>>,
    models: Mutex<HashMap<String, Model>>,
    usage_events: Mutex<Vec<UsageEvent>>,
    billing: Mutex<Vec<BillingSummary>>,
    next_id: AtomicI64,
}

impl InMemoryStorage {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn seed_organization(&self, display_name: &str) -> Organization {
        let org = Organization {
            id: self.next_id(),
            name: display_name.to_lowercase(),
            display_name: display_name.to_string(),
            is_system: false,
            created_at: OffsetDateTime::now_utc(),
            sso_type: None,
            sso_config: HashMap::new(),
        };
        self.organizations.lock().insert(org.id, org.clone());
        org
    }

    pub fn seed_user(&self, organization_id: i64, email: &str, system_admin: bool) -> User {
        let user = User {
            id: self.next_id(),
            email: email.to_string(),
            name: email.to_string(),
            organization_id,
            external_id: None,
            provider: AuthProviderKind::None,
            system_admin,
            created_at: OffsetDateTime::now_utc(),
            last_login: None,
        };
        self.users.lock().insert(user.id, user.clone());
        user
    }

    /// Seeds a token record for `raw_token`, hashing it exactly the way
    /// the real bootstrap path does.
    pub fn seed_token(&self, user_id: i64, raw_token: &str) -> ApiToken {
        let prefix_hash = llmgw_auth::hash::prefix_hash(raw_token, 8).expect("token long enough");
        let token_hash = llmgw_auth::hash::hash_token(raw_token).expect("hash token");
        let token = ApiToken {
            id: self.next_id(),
            user_id,
            description: None,
            prefix_hash,
            token_hash,
            created_at: OffsetDateTime::now_utc(),
            expires_at: OffsetDateTime::now_utc() + time::Duration::days(365),
            last_used_at: None,
        };
        self.tokens.lock().insert(token.id, token.clone());
        token
    }
}

#[async_trait]
impl IdentityRepository for InMemoryStorage {
    async fn create_user(&self, mut user: User) -> Result<User, RepoError> {
        user.id = self.next_id();
        self.users.lock().insert(user.id, user.clone());
        Ok(user)
    }
    async fn get_user(&self, id: i64) -> Result<User, RepoError> {
        self.users.lock().get(&id).cloned().ok_or(RepoError::NotFound)
    }
    async fn get_user_by_email(&self, email: &str) -> Result<User, RepoError> {
        self.users
            .lock()
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(RepoError::NotFound)
    }
    async fn get_user_by_external_id(
        &self,
        provider: AuthProviderKind,
        external_id: &str,
    ) -> Result<User, RepoError> {
        self.users
            .lock()
            .values()
            .find(|u| u.provider == provider && u.external_id.as_deref() == Some(external_id))
            .cloned()
            .ok_or(RepoError::NotFound)
    }
    async fn list_users_by_organization(&self, org_id: i64) -> Result<Vec<User>, RepoError> {
        Ok(self
            .users
            .lock()
            .values()
            .filter(|u| u.organization_id == org_id)
            .cloned()
            .collect())
    }
    async fn update_user(&self, user: User) -> Result<User, RepoError> {
        self.users.lock().insert(user.id, user.clone());
        Ok(user)
    }
    async fn delete_user(&self, id: i64) -> Result<(), RepoError> {
        self.users.lock().remove(&id);
        self.tokens.lock().retain(|_, t| t.user_id != id);
        Ok(())
    }
    async fn create_organization(&self, mut org: Organization) -> Result<Organization, RepoError> {
        org.id = self.next_id();
        self.organizations.lock().insert(org.id, org.clone());
        Ok(org)
    }
    async fn get_organization(&self, id: i64) -> Result<Organization, RepoError> {
        self.organizations.lock().get(&id).cloned().ok_or(RepoError::NotFound)
    }
    async fn get_organization_by_name(&self, name: &str) -> Result<Organization, RepoError> {
        self.organizations
            .lock()
            .values()
            .find(|o| o.name == name)
            .cloned()
            .ok_or(RepoError::NotFound)
    }
    async fn list_organizations(&self) -> Result<Vec<Organization>, RepoError> {
        Ok(self.organizations.lock().values().cloned().collect())
    }
    async fn update_organization(&self, org: Organization) -> Result<Organization, RepoError> {
        self.organizations.lock().insert(org.id, org.clone());
        Ok(org)
    }
    async fn delete_organization(&self, id: i64, force: bool) -> Result<(), RepoError> {
        let member_count = self.organization_member_count(id).await?;
        if member_count > 0 && !force {
            return Err(RepoError::FailedPrecondition("organization has members".to_string()));
        }
        let removed_user_ids: Vec<i64> = self
            .users
            .lock()
            .values()
            .filter(|u| u.organization_id == id)
            .map(|u| u.id)
            .collect();
        self.users.lock().retain(|_, u| u.organization_id != id);
        self.tokens.lock().retain(|_, t| !removed_user_ids.contains(&t.user_id));
        self.organizations.lock().remove(&id);
        Ok(())
    }
    async fn organization_member_count(&self, id: i64) -> Result<u64, RepoError> {
        Ok(self.users.lock().values().filter(|u| u.organization_id == id).count() as u64)
    }
}

#[async_trait]
impl TokenRepository for InMemoryStorage {
    async fn create(&self, mut token: ApiToken) -> Result<ApiToken, RepoError> {
        token.id = self.next_id();
        self.tokens.lock().insert(token.id, token.clone());
        Ok(token)
    }
    async fn get_by_prefix_hash(&self, prefix_hash: &str) -> Result<ApiToken, RepoError> {
        self.tokens
            .lock()
            .values()
            .find(|t| t.prefix_hash == prefix_hash)
            .cloned()
            .ok_or(RepoError::NotFound)
    }
    async fn get(&self, id: i64) -> Result<ApiToken, RepoError> {
        self.tokens.lock().get(&id).cloned().ok_or(RepoError::NotFound)
    }
    async fn list_for_user(&self, user_id: i64) -> Result<Vec<ApiToken>, RepoError> {
        Ok(self.tokens.lock().values().filter(|t| t.user_id == user_id).cloned().collect())
    }
    async fn touch_last_used(&self, id: i64, at: OffsetDateTime) -> Result<(), RepoError> {
        if let Some(token) = self.tokens.lock().get_mut(&id) {
            token.last_used_at = Some(at);
        }
        Ok(())
    }
    async fn revoke(&self, id: i64) -> Result<(), RepoError> {
        self.tokens.lock().remove(&id);
        Ok(())
    }
}

#[async_trait]
impl CredentialRepository for InMemoryStorage {
    async fn get(&self, id: i64) -> Result<OpenRouterCredential, RepoError> {
        self.credentials.lock().get(&id).cloned().ok_or(RepoError::NotFound)
    }
    async fn list_enabled(&self) -> Result<Vec<OpenRouterCredential>, RepoError> {
        Ok(self.credentials.lock().values().filter(|c| c.enabled).cloned().collect())
    }
    async fn create(&self, mut credential: OpenRouterCredential) -> Result<OpenRouterCredential, RepoError> {
        credential.id = self.next_id();
        self.credentials.lock().insert(credential.id, credential.clone());
        Ok(credential)
    }
    async fn update(&self, credential: OpenRouterCredential) -> Result<OpenRouterCredential, RepoError> {
        self.credentials.lock().insert(credential.id, credential.clone());
        Ok(credential)
    }
    async fn set_enabled(&self, id: i64, enabled: bool) -> Result<(), RepoError> {
        if let Some(c) = self.credentials.lock().get_mut(&id) {
            c.enabled = enabled;
        }
        Ok(())
    }
}

#[async_trait]
impl ModelRepository for InMemoryStorage {
    async fn get(&self, id: &str) -> Result<Model, RepoError> {
        self.models.lock().get(id).cloned().ok_or(RepoError::NotFound)
    }
    async fn list_enabled(&self) -> Result<Vec<Model>, RepoError> {
        Ok(self.models.lock().values().filter(|m| m.enabled).cloned().collect())
    }
    async fn create(&self, model: Model) -> Result<Model, RepoError> {
        self.models.lock().insert(model.id.clone(), model.clone());
        Ok(model)
    }
    async fn update_capabilities(
        &self,
        id: &str,
        patch: ModelCapabilitiesPatch,
    ) -> Result<Model, RepoError> {
        let mut guard = self.models.lock();
        let model = guard.get_mut(id).ok_or(RepoError::NotFound)?;
        model.capabilities = patch.apply(model.capabilities);
        Ok(model.clone())
    }
    async fn set_enabled(&self, id: &str, enabled: bool) -> Result<(), RepoError> {
        if let Some(m) = self.models.lock().get_mut(id) {
            m.enabled = enabled;
        }
        Ok(())
    }
}

#[async_trait]
impl UsageRepository for InMemoryStorage {
    async fn append(&self, mut event: UsageEvent) -> Result<UsageEvent, RepoError> {
        event.id = self.next_id();
        self.usage_events.lock().push(event.clone());
        Ok(event)
    }
    async fn query(&self, filter: UsageQueryFilter) -> Result<Vec<UsageEvent>, RepoError> {
        Ok(self
            .usage_events
            .lock()
            .iter()
            .filter(|e| match filter.user_id {
                Some(uid) => e.user_id == uid,
                None => true,
            })
            .cloned()
            .collect())
    }
    async fn update_cost_fields(
        &self,
        id: i64,
        input_cost_cents: Cents,
        output_cost_cents: Cents,
        total_cost_cents: Cents,
    ) -> Result<(), RepoError> {
        if let Some(event) = self.usage_events.lock().iter_mut().find(|e| e.id == id) {
            event.input_cost_cents = Some(input_cost_cents);
            event.output_cost_cents = Some(output_cost_cents);
            event.total_cost_cents = Some(total_cost_cents);
        }
        Ok(())
    }
}

#[async_trait]
impl BillingRepository for InMemoryStorage {
    async fn get_for_period(
        &self,
        user_id: i64,
        period_start: OffsetDateTime,
        period_end: OffsetDateTime,
    ) -> Result<Option<BillingSummary>, RepoError> {
        Ok(self
            .billing
            .lock()
            .iter()
            .find(|b| b.user_id == user_id && b.period_start == period_start && b.period_end == period_end)
            .cloned())
    }
    async fn upsert(&self, summary: BillingSummary) -> Result<BillingSummary, RepoError> {
        self.billing.lock().push(summary.clone());
        Ok(summary)
    }
}

pub fn sample_model(id: &str, credential_id: i64) -> Model {
    Model {
        id: id.to_string(),
        name: id.to_string(),
        provider_id: "openrouter".to_string(),
        credential_id,
        credential_type: CredentialType::Openrouter,
        pricing: ModelPricing {
            input_cost_per_token: Cents::new(1, 6),
            output_cost_per_token: Cents::new(2, 6),
        },
        capabilities: ModelCapabilities {
            streaming: true,
            json: true,
            tools: true,
            vision: false,
            reasoning: false,
            max_input_tokens: 128_000,
            max_output_tokens: 4_096,
        },
        metadata: serde_json::json!({"model_reference": format!("openai/{id}")}),
        enabled: true,
    }
}
