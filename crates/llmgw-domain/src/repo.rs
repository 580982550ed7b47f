use async_trait::async_trait;
use llmgw_common::RepoError;
use time::OffsetDateTime;

use crate::{
    ApiToken, BillingSummary, Model, ModelCapabilitiesPatch, OpenRouterCredential, Organization,
    UsageEvent, User,
};

/// Credential store. Persist and retrieve long-lived provider API keys.
/// Deletions are soft (`enabled` flipped to `false`).
#[async_trait]
pub trait CredentialRepository: Send + Sync {
    async fn get(&self, id: i64) -> Result<OpenRouterCredential, RepoError>;
    async fn list_enabled(&self) -> Result<Vec<OpenRouterCredential>, RepoError>;
    async fn create(&self, credential: OpenRouterCredential) -> Result<OpenRouterCredential, RepoError>;
    async fn update(&self, credential: OpenRouterCredential) -> Result<OpenRouterCredential, RepoError>;
    async fn set_enabled(&self, id: i64, enabled: bool) -> Result<(), RepoError>;
}

/// Token store. Tokens are immutable after creation except
/// `last_used_at`; revocation is a hard delete.
#[async_trait]
pub trait TokenRepository: Send + Sync {
    async fn create(&self, token: ApiToken) -> Result<ApiToken, RepoError>;
    async fn get_by_prefix_hash(&self, prefix_hash: &str) -> Result<ApiToken, RepoError>;
    async fn get(&self, id: i64) -> Result<ApiToken, RepoError>;
    async fn list_for_user(&self, user_id: i64) -> Result<Vec<ApiToken>, RepoError>;
    /// Best-effort; failure to update must not affect the caller's outcome.
    /// Implementations still return a `Result` so callers can log, but
    /// callers must not propagate the error upward.
    async fn touch_last_used(&self, id: i64, at: OffsetDateTime) -> Result<(), RepoError>;
    async fn revoke(&self, id: i64) -> Result<(), RepoError>;
}

/// Identity store (users + organizations), authorization-aware listing
/// left to the service layer (the repository itself is scope-agnostic; the
/// service layer enforces `llmgw-control`'s authorization policy before
/// calling into these methods, or passes an already-scoped org id).
#[async_trait]
pub trait IdentityRepository: Send + Sync {
    async fn create_user(&self, user: User) -> Result<User, RepoError>;
    async fn get_user(&self, id: i64) -> Result<User, RepoError>;
    async fn get_user_by_email(&self, email: &str) -> Result<User, RepoError>;
    async fn get_user_by_external_id(
        &self,
        provider: crate::AuthProviderKind,
        external_id: &str,
    ) -> Result<User, RepoError>;
    async fn list_users_by_organization(&self, org_id: i64) -> Result<Vec<User>, RepoError>;
    async fn update_user(&self, user: User) -> Result<User, RepoError>;
    /// Cascades to the user's tokens.
    async fn delete_user(&self, id: i64) -> Result<(), RepoError>;

    async fn create_organization(&self, org: Organization) -> Result<Organization, RepoError>;
    async fn get_organization(&self, id: i64) -> Result<Organization, RepoError>;
    async fn get_organization_by_name(&self, name: &str) -> Result<Organization, RepoError>;
    async fn list_organizations(&self) -> Result<Vec<Organization>, RepoError>;
    async fn update_organization(&self, org: Organization) -> Result<Organization, RepoError>;
    /// Fails `FailedPrecondition` if the organization has members and
    /// `force` is false.
    async fn delete_organization(&self, id: i64, force: bool) -> Result<(), RepoError>;
    async fn organization_member_count(&self, id: i64) -> Result<u64, RepoError>;
}

/// Model registry backing store. The cached decorator in `llmgw-gateway`
/// wraps this with TTL'd item/list caches; this trait itself is a thin,
/// uncached contract.
#[async_trait]
pub trait ModelRepository: Send + Sync {
    async fn get(&self, id: &str) -> Result<Model, RepoError>;
    async fn list_enabled(&self) -> Result<Vec<Model>, RepoError>;
    async fn create(&self, model: Model) -> Result<Model, RepoError>;
    async fn update_capabilities(
        &self,
        id: &str,
        patch: ModelCapabilitiesPatch,
    ) -> Result<Model, RepoError>;
    async fn set_enabled(&self, id: &str, enabled: bool) -> Result<(), RepoError>;
}

#[derive(Clone, Debug, Default)]
pub struct UsageQueryFilter {
    pub user_id: Option<i64>,
    pub model_id: Option<String>,
    pub start: Option<OffsetDateTime>,
    pub end: Option<OffsetDateTime>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Usage repository. `UsageEvent`s are append-only; cost columns may be
/// filled in by a later pass (`update_cost_fields`), never by the capture
/// path itself.
#[async_trait]
pub trait UsageRepository: Send + Sync {
    async fn append(&self, event: UsageEvent) -> Result<UsageEvent, RepoError>;
    async fn query(&self, filter: UsageQueryFilter) -> Result<Vec<UsageEvent>, RepoError>;
    async fn update_cost_fields(
        &self,
        id: i64,
        input_cost_cents: llmgw_common::money::Cents,
        output_cost_cents: llmgw_common::money::Cents,
        total_cost_cents: llmgw_common::money::Cents,
    ) -> Result<(), RepoError>;
}

/// Billing repository. Pre-aggregated per-period totals, derived only
/// from `dataComplete=true` events.
#[async_trait]
pub trait BillingRepository: Send + Sync {
    async fn get_for_period(
        &self,
        user_id: i64,
        period_start: OffsetDateTime,
        period_end: OffsetDateTime,
    ) -> Result<Option<BillingSummary>, RepoError>;
    async fn upsert(&self, summary: BillingSummary) -> Result<BillingSummary, RepoError>;
}
