use clap::Parser;
use llmgw_common::config::GatewayConfigPatch;

/// Command-line and environment-variable configuration surface. Every
/// field is optional so the overlay in `GatewayConfigPatch::into_config`
/// can fall back to a built-in default; `clap`'s own `env` attribute
/// already gives CLI flags precedence over the matching environment
/// variable for each field.
#[derive(Debug, Clone, Parser)]
#[command(name = "llmgw", version, about = "Multi-tenant LLM gateway")]
pub struct CliArgs {
    /// Data-plane bind address.
    #[arg(long, env = "LLMGW_DATA_PLANE_ADDR")]
    pub data_plane_addr: Option<String>,

    #[arg(long, env = "LLMGW_DATA_PLANE_READ_TIMEOUT_SECS")]
    pub data_plane_read_timeout_secs: Option<u64>,

    #[arg(long, env = "LLMGW_DATA_PLANE_WRITE_TIMEOUT_SECS")]
    pub data_plane_write_timeout_secs: Option<u64>,

    #[arg(long, env = "LLMGW_DATA_PLANE_IDLE_TIMEOUT_SECS")]
    pub data_plane_idle_timeout_secs: Option<u64>,

    /// Control-plane bind address.
    #[arg(long, env = "LLMGW_CONTROL_PLANE_ADDR")]
    pub control_plane_addr: Option<String>,

    /// Database DSN. Required, either here or via `LLMGW_DSN`.
    #[arg(long, env = "LLMGW_DSN")]
    pub dsn: Option<String>,

    /// Email assigned to the sysadmin user seeded at first boot.
    #[arg(long, env = "LLMGW_BOOTSTRAP_ADMIN_EMAIL")]
    pub bootstrap_admin_email: Option<String>,

    #[arg(long, env = "LLMGW_SESSION_TTL_SECS")]
    pub session_ttl_secs: Option<u64>,

    #[arg(long, env = "LLMGW_SESSION_CLEANUP_INTERVAL_SECS")]
    pub session_cleanup_interval_secs: Option<u64>,

    #[arg(long, env = "LLMGW_USAGE_QUEUE_CAPACITY")]
    pub usage_queue_capacity: Option<usize>,

    #[arg(long, env = "LLMGW_USAGE_PERSIST_TIMEOUT_SECS")]
    pub usage_persist_timeout_secs: Option<u64>,

    #[arg(long, env = "LLMGW_CACHE_MODEL_TTL_SECS")]
    pub cache_model_ttl_secs: Option<u64>,

    #[arg(long, env = "LLMGW_CACHE_CREDENTIAL_TTL_SECS")]
    pub cache_credential_ttl_secs: Option<u64>,

    #[arg(long, env = "LLMGW_AUTH_TOKEN_PREFIX_LENGTH")]
    pub auth_token_prefix_length: Option<usize>,

    /// Outbound proxy for upstream OpenRouter requests.
    #[arg(long, env = "LLMGW_OUTBOUND_PROXY")]
    pub outbound_proxy: Option<String>,

    /// Externally visible base URL the SSO callback redirect is built
    /// against, e.g. `https://gw.example.com/sso`.
    #[arg(long, env = "LLMGW_PUBLIC_BASE_URL")]
    pub public_base_url: Option<String>,

    /// Whether the gateway is reachable over TLS, controlling the
    /// `Secure` flag on session and OAuth-state cookies.
    #[arg(long, env = "LLMGW_TLS")]
    pub tls: bool,

    /// Name this OIDC provider is registered under, e.g. `okta`. Leave
    /// unset to boot with no configured SSO provider.
    #[arg(long, env = "LLMGW_OIDC_PROVIDER_NAME")]
    pub oidc_provider_name: Option<String>,

    #[arg(long, env = "LLMGW_OIDC_CLIENT_ID")]
    pub oidc_client_id: Option<String>,

    #[arg(long, env = "LLMGW_OIDC_CLIENT_SECRET")]
    pub oidc_client_secret: Option<String>,

    #[arg(long, env = "LLMGW_OIDC_AUTHORIZE_ENDPOINT")]
    pub oidc_authorize_endpoint: Option<String>,

    #[arg(long, env = "LLMGW_OIDC_TOKEN_ENDPOINT")]
    pub oidc_token_endpoint: Option<String>,

    #[arg(long, env = "LLMGW_OIDC_DEVICE_AUTHORIZATION_ENDPOINT")]
    pub oidc_device_authorization_endpoint: Option<String>,

    #[arg(long, env = "LLMGW_OIDC_SCOPE", default_value = "openid email profile")]
    pub oidc_scope: String,
}

impl CliArgs {
    pub fn into_config_patch(self) -> GatewayConfigPatch {
        GatewayConfigPatch {
            data_plane_addr: self.data_plane_addr,
            data_plane_read_timeout_secs: self.data_plane_read_timeout_secs,
            data_plane_write_timeout_secs: self.data_plane_write_timeout_secs,
            data_plane_idle_timeout_secs: self.data_plane_idle_timeout_secs,
            control_plane_addr: self.control_plane_addr,
            dsn: self.dsn,
            bootstrap_admin_email: self.bootstrap_admin_email,
            session_ttl_secs: self.session_ttl_secs,
            session_cleanup_interval_secs: self.session_cleanup_interval_secs,
            usage_queue_capacity: self.usage_queue_capacity,
            usage_persist_timeout_secs: self.usage_persist_timeout_secs,
            cache_model_ttl_secs: self.cache_model_ttl_secs,
            cache_credential_ttl_secs: self.cache_credential_ttl_secs,
            auth_token_prefix_length: self.auth_token_prefix_length,
            outbound_proxy: self.outbound_proxy,
        }
    }
}
