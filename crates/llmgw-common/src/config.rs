use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum GatewayConfigError {
    #[error("missing required config field: {0}")]
    MissingField(&'static str),
}

/// Explicit, immutable snapshot of the gateway's runtime configuration.
/// Constructed once at bootstrap via [`GatewayConfigPatch::into_config`] and
/// never mutated in place afterwards; a reconfiguration produces a fresh
/// `GatewayConfig` that replaces the one held behind an `ArcSwap`.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct GatewayConfig {
    pub data_plane_addr: String,
    pub data_plane_read_timeout_secs: u64,
    pub data_plane_write_timeout_secs: u64,
    pub data_plane_idle_timeout_secs: u64,
    pub control_plane_addr: String,
    pub dsn: String,
    /// Email assigned to the sysadmin user seeded at first boot when no
    /// sysadmin exists yet.
    pub bootstrap_admin_email: String,
    pub session_ttl_secs: u64,
    pub session_cleanup_interval_secs: u64,
    pub usage_queue_capacity: usize,
    pub usage_persist_timeout_secs: u64,
    pub cache_model_ttl_secs: u64,
    pub cache_credential_ttl_secs: u64,
    pub auth_token_prefix_length: usize,
    #[serde(default)]
    pub outbound_proxy: Option<String>,
}

impl GatewayConfig {
    pub fn session_ttl(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.session_ttl_secs)
    }

    pub fn session_cleanup_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.session_cleanup_interval_secs)
    }

    pub fn usage_persist_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.usage_persist_timeout_secs)
    }

    pub fn cache_model_ttl(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.cache_model_ttl_secs)
    }

    pub fn cache_credential_ttl(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.cache_credential_ttl_secs)
    }
}

/// All-`Option` mirror of [`GatewayConfig`], used to overlay CLI args, env
/// vars, and a persisted default in strictly that precedence order before
/// finalizing into a `GatewayConfig`.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct GatewayConfigPatch {
    pub data_plane_addr: Option<String>,
    pub data_plane_read_timeout_secs: Option<u64>,
    pub data_plane_write_timeout_secs: Option<u64>,
    pub data_plane_idle_timeout_secs: Option<u64>,
    pub control_plane_addr: Option<String>,
    pub dsn: Option<String>,
    pub bootstrap_admin_email: Option<String>,
    pub session_ttl_secs: Option<u64>,
    pub session_cleanup_interval_secs: Option<u64>,
    pub usage_queue_capacity: Option<usize>,
    pub usage_persist_timeout_secs: Option<u64>,
    pub cache_model_ttl_secs: Option<u64>,
    pub cache_credential_ttl_secs: Option<u64>,
    pub auth_token_prefix_length: Option<usize>,
    pub outbound_proxy: Option<String>,
}

impl GatewayConfigPatch {
    /// Merge `other` onto `self`: only fields that are `Some` in `other`
    /// overwrite the corresponding field in `self`.
    pub fn overlay(&mut self, other: GatewayConfigPatch) {
        macro_rules! take {
            ($field:ident) => {
                if other.$field.is_some() {
                    self.$field = other.$field;
                }
            };
        }
        take!(data_plane_addr);
        take!(data_plane_read_timeout_secs);
        take!(data_plane_write_timeout_secs);
        take!(data_plane_idle_timeout_secs);
        take!(control_plane_addr);
        take!(dsn);
        take!(bootstrap_admin_email);
        take!(session_ttl_secs);
        take!(session_cleanup_interval_secs);
        take!(usage_queue_capacity);
        take!(usage_persist_timeout_secs);
        take!(cache_model_ttl_secs);
        take!(cache_credential_ttl_secs);
        take!(auth_token_prefix_length);
        take!(outbound_proxy);
    }

    pub fn into_config(self) -> Result<GatewayConfig, GatewayConfigError> {
        Ok(GatewayConfig {
            data_plane_addr: self
                .data_plane_addr
                .unwrap_or_else(|| "127.0.0.1:8080".to_string()),
            data_plane_read_timeout_secs: self.data_plane_read_timeout_secs.unwrap_or(30),
            data_plane_write_timeout_secs: self.data_plane_write_timeout_secs.unwrap_or(30),
            data_plane_idle_timeout_secs: self.data_plane_idle_timeout_secs.unwrap_or(120),
            control_plane_addr: self
                .control_plane_addr
                .unwrap_or_else(|| "127.0.0.1:8081".to_string()),
            dsn: self
                .dsn
                .ok_or(GatewayConfigError::MissingField("dsn"))?,
            bootstrap_admin_email: self
                .bootstrap_admin_email
                .unwrap_or_else(|| "admin@system.local".to_string()),
            session_ttl_secs: self.session_ttl_secs.unwrap_or(24 * 60 * 60),
            session_cleanup_interval_secs: self
                .session_cleanup_interval_secs
                .unwrap_or(10 * 60),
            usage_queue_capacity: self.usage_queue_capacity.unwrap_or(1024),
            usage_persist_timeout_secs: self.usage_persist_timeout_secs.unwrap_or(5),
            cache_model_ttl_secs: self.cache_model_ttl_secs.unwrap_or(60),
            cache_credential_ttl_secs: self.cache_credential_ttl_secs.unwrap_or(60),
            auth_token_prefix_length: self.auth_token_prefix_length.unwrap_or(8),
            outbound_proxy: self.outbound_proxy,
        })
    }
}

impl From<GatewayConfig> for GatewayConfigPatch {
    fn from(cfg: GatewayConfig) -> Self {
        GatewayConfigPatch {
            data_plane_addr: Some(cfg.data_plane_addr),
            data_plane_read_timeout_secs: Some(cfg.data_plane_read_timeout_secs),
            data_plane_write_timeout_secs: Some(cfg.data_plane_write_timeout_secs),
            data_plane_idle_timeout_secs: Some(cfg.data_plane_idle_timeout_secs),
            control_plane_addr: Some(cfg.control_plane_addr),
            dsn: Some(cfg.dsn),
            bootstrap_admin_email: Some(cfg.bootstrap_admin_email),
            session_ttl_secs: Some(cfg.session_ttl_secs),
            session_cleanup_interval_secs: Some(cfg.session_cleanup_interval_secs),
            usage_queue_capacity: Some(cfg.usage_queue_capacity),
            usage_persist_timeout_secs: Some(cfg.usage_persist_timeout_secs),
            cache_model_ttl_secs: Some(cfg.cache_model_ttl_secs),
            cache_credential_ttl_secs: Some(cfg.cache_credential_ttl_secs),
            auth_token_prefix_length: Some(cfg.auth_token_prefix_length),
            outbound_proxy: cfg.outbound_proxy,
        }
    }
}
