use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use llmgw_auth::sso::{OidcProvider, OidcProviderConfig, SsoHandler};
use llmgw_auth::{hash, spawn_cleanup_task, SessionStore, SsoProvider, TokenAuthenticator};
use llmgw_common::GatewayConfig;
use llmgw_control::ControlState;
use llmgw_domain::{ApiToken, AuthProviderKind, IdentityRepository, Organization, User};
use llmgw_gateway::{CredentialCache, GatewayState, ModelCache, UpstreamClient};
use llmgw_storage::SeaOrmStorage;
use llmgw_usage::UsageEngine;
use time::{Duration as TimeDuration, OffsetDateTime};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::cli::CliArgs;

const BOOTSTRAP_TOKEN_TTL_DAYS: i64 = 365;

/// Everything `main` needs to wire up and run the three HTTP surfaces plus
/// their background tasks.
pub struct Bootstrap {
    pub config: GatewayConfig,
    pub gateway_state: Arc<GatewayState>,
    pub control_state: Arc<ControlState>,
    pub sso_handler: Arc<SsoHandler>,
    pub authenticator: Arc<TokenAuthenticator>,
    pub usage_shutdown: CancellationToken,
    pub usage_persister: JoinHandle<()>,
    pub session_cleanup: JoinHandle<()>,
}

pub async fn bootstrap(args: CliArgs) -> Result<Bootstrap> {
    let public_base_url = args.public_base_url.clone().unwrap_or_else(|| "http://127.0.0.1:8081/sso".to_string());
    let tls = args.tls;
    let oidc_provider = build_oidc_provider(&args);
    let config = args
        .into_config_patch()
        .into_config()
        .context("finalize gateway config")?;

    let storage = Arc::new(
        SeaOrmStorage::connect(&config.dsn)
            .await
            .context("connect storage")?,
    );
    storage.sync().await.context("schema sync")?;

    let identities: Arc<dyn IdentityRepository> = storage.clone();
    let tokens: Arc<dyn llmgw_domain::TokenRepository> = storage.clone();
    let credentials: Arc<dyn llmgw_domain::CredentialRepository> = storage.clone();
    let models: Arc<dyn llmgw_domain::ModelRepository> = storage.clone();
    let usage: Arc<dyn llmgw_domain::UsageRepository> = storage.clone();
    let billing: Arc<dyn llmgw_domain::BillingRepository> = storage.clone();

    let system_org = ensure_system_organization(identities.as_ref()).await?;
    ensure_bootstrap_sysadmin(identities.as_ref(), tokens.as_ref(), &config, system_org.id).await?;

    let sessions = Arc::new(SessionStore::new(config.session_ttl()));
    let session_cleanup = spawn_cleanup_task(sessions.clone(), config.session_cleanup_interval());

    let authenticator = Arc::new(TokenAuthenticator::new(
        tokens.clone(),
        identities.clone(),
        config.auth_token_prefix_length,
    ));

    let model_cache = Arc::new(ModelCache::new(
        models.clone(),
        config.cache_model_ttl(),
        config.cache_model_ttl(),
    ));
    let credential_cache = Arc::new(CredentialCache::new(credentials.clone(), config.cache_credential_ttl()));

    let usage_shutdown = CancellationToken::new();
    let (usage_engine, usage_persister) = UsageEngine::spawn(
        usage.clone(),
        config.usage_queue_capacity,
        config.usage_persist_timeout(),
        usage_shutdown.clone(),
    );

    let upstream = Arc::new(
        UpstreamClient::new(
            Duration::from_secs(config.data_plane_write_timeout_secs),
            config.outbound_proxy.as_deref(),
        )
        .context("build upstream client")?,
    );

    let gateway_state = Arc::new(GatewayState {
        models: model_cache.clone(),
        credentials: credential_cache.clone(),
        upstream,
        usage: usage_engine,
    });

    let control_state = Arc::new(ControlState {
        identities: identities.clone(),
        tokens,
        credentials,
        models,
        usage,
        billing,
        sessions: sessions.clone(),
        authenticator: authenticator.clone(),
        model_cache,
        credential_cache,
        token_prefix_length: config.auth_token_prefix_length,
    });

    let mut providers: HashMap<String, Arc<dyn SsoProvider>> = HashMap::new();
    if let Some((name, provider)) = oidc_provider {
        providers.insert(name, provider);
    }
    let sso_handler = Arc::new(SsoHandler::new(
        providers,
        identities,
        sessions,
        public_base_url,
        tls,
    ));

    Ok(Bootstrap {
        config,
        gateway_state,
        control_state,
        sso_handler,
        authenticator,
        usage_shutdown,
        usage_persister,
        session_cleanup,
    })
}

fn build_oidc_provider(args: &CliArgs) -> Option<(String, Arc<dyn SsoProvider>)> {
    let name = args.oidc_provider_name.clone()?;
    let client_id = args.oidc_client_id.clone()?;
    let client_secret = args.oidc_client_secret.clone()?;
    let authorize_endpoint = args.oidc_authorize_endpoint.clone()?;
    let token_endpoint = args.oidc_token_endpoint.clone()?;
    let provider = OidcProvider::new(OidcProviderConfig {
        name: name.clone(),
        client_id,
        client_secret,
        authorize_endpoint,
        token_endpoint,
        device_authorization_endpoint: args.oidc_device_authorization_endpoint.clone(),
        scope: args.oidc_scope.clone(),
    });
    Some((name, Arc::new(provider)))
}

/// Every deployment needs a home for users that don't belong to a
/// customer organization yet; created once on first boot.
async fn ensure_system_organization(identities: &dyn IdentityRepository) -> Result<Organization> {
    match identities.get_organization_by_name("system").await {
        Ok(org) => Ok(org),
        Err(_) => {
            let org = Organization::system_placeholder("System");
            identities
                .create_organization(org)
                .await
                .context("create system organization")
        }
    }
}

/// Seeds the first sysadmin user and an initial API token the first time
/// the gateway boots against an empty database. The raw token is printed
/// once and never persisted in plaintext.
async fn ensure_bootstrap_sysadmin(
    identities: &dyn IdentityRepository,
    tokens: &dyn llmgw_domain::TokenRepository,
    config: &GatewayConfig,
    system_org_id: i64,
) -> Result<()> {
    let existing = identities
        .list_users_by_organization(system_org_id)
        .await
        .context("list system organization users")?;
    if existing.iter().any(|user| user.system_admin) {
        return Ok(());
    }

    let admin = User {
        id: 0,
        email: config.bootstrap_admin_email.clone(),
        name: "System Administrator".to_string(),
        organization_id: system_org_id,
        external_id: None,
        provider: AuthProviderKind::None,
        system_admin: true,
        created_at: OffsetDateTime::now_utc(),
        last_login: None,
    };
    let admin = identities.create_user(admin).await.context("create bootstrap sysadmin")?;

    let raw_token = hash::generate_raw_token();
    let prefix_hash = hash::prefix_hash(&raw_token, config.auth_token_prefix_length)
        .context("prefix-hash bootstrap token")?;
    let token_hash = hash::hash_token(&raw_token).context("hash bootstrap token")?;
    let token = ApiToken {
        id: 0,
        user_id: admin.id,
        description: Some("bootstrap".to_string()),
        prefix_hash,
        token_hash,
        created_at: OffsetDateTime::now_utc(),
        expires_at: OffsetDateTime::now_utc() + TimeDuration::days(BOOTSTRAP_TOKEN_TTL_DAYS),
        last_used_at: None,
    };
    tokens.create(token).await.context("persist bootstrap token")?;

    info!(email = %admin.email, "seeded bootstrap sysadmin");
    eprintln!("generated bootstrap sysadmin API token (shown once): {raw_token}");
    Ok(())
}
