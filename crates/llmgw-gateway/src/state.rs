use std::sync::Arc;

use llmgw_usage::UsageEngine;

use crate::credential_cache::CredentialCache;
use crate::model_cache::ModelCache;
use crate::upstream::UpstreamClient;

/// Shared data-plane state: the request pipeline reads models and
/// credentials through their TTL'd caches and dispatches through the
/// tracked upstream client, which in turn reports into the usage engine.
pub struct GatewayState {
    pub models: Arc<ModelCache>,
    pub credentials: Arc<CredentialCache>,
    pub upstream: Arc<UpstreamClient>,
    pub usage: Arc<UsageEngine>,
}
