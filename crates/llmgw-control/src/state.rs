use std::sync::Arc;

use llmgw_auth::{SessionStore, TokenAuthenticator};
use llmgw_domain::{
    BillingRepository, CredentialRepository, IdentityRepository, ModelRepository, TokenRepository,
    UsageRepository,
};
use llmgw_gateway::{CredentialCache, ModelCache};

/// Shared state for every control-plane handler: repository handles plus
/// a shared auth collaborator, all behind `Arc`.
pub struct ControlState {
    pub identities: Arc<dyn IdentityRepository>,
    pub tokens: Arc<dyn TokenRepository>,
    pub credentials: Arc<dyn CredentialRepository>,
    pub models: Arc<dyn ModelRepository>,
    pub usage: Arc<dyn UsageRepository>,
    pub billing: Arc<dyn BillingRepository>,
    pub sessions: Arc<SessionStore>,
    pub authenticator: Arc<TokenAuthenticator>,
    /// Shared with the data plane so a write RPC (create/update/disable a
    /// model or credential) can invalidate the running cache instead of
    /// waiting out its TTL.
    pub model_cache: Arc<ModelCache>,
    pub credential_cache: Arc<CredentialCache>,
    pub token_prefix_length: usize,
}
