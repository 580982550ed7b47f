use async_trait::async_trait;

#[derive(Debug, Clone)]
pub struct ExternalIdentity {
    pub external_id: String,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct DeviceStart {
    pub device_code: String,
    pub user_code: String,
    pub verification_uri: String,
    pub interval_secs: u64,
    pub expires_in_secs: u64,
}

#[derive(Debug, Clone)]
pub enum DevicePollOutcome {
    Pending,
    Authorized(ExternalIdentity),
}

/// Surfaced as 500 unless explicitly a user-visible policy error
/// (`AccessDenied`, `InvalidState`), which surface as 400.
#[derive(Debug, Clone)]
pub enum SsoError {
    AccessDenied,
    InvalidState,
    MissingCode,
    Upstream(String),
}

impl std::fmt::Display for SsoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SsoError::AccessDenied => write!(f, "access_denied"),
            SsoError::InvalidState => write!(f, "invalid state parameter"),
            SsoError::MissingCode => write!(f, "missing code parameter"),
            SsoError::Upstream(msg) => write!(f, "upstream error: {msg}"),
        }
    }
}

impl std::error::Error for SsoError {}

impl SsoError {
    pub fn is_user_visible(&self) -> bool {
        matches!(self, SsoError::AccessDenied | SsoError::InvalidState | SsoError::MissingCode)
    }
}

/// An OIDC-style identity provider collaborator. One production
/// implementation (hand-rolled authorization-code + device-code HTTP calls
/// via `reqwest`) plus test doubles satisfy this trait.
#[async_trait]
pub trait SsoProvider: Send + Sync {
    fn name(&self) -> &str;
    fn authorize_url(&self, state: &str, code_challenge: &str, redirect_uri: &str) -> String;
    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
        redirect_uri: &str,
    ) -> Result<ExternalIdentity, SsoError>;
    async fn device_start(&self) -> Result<DeviceStart, SsoError>;
    async fn device_poll(&self, device_code: &str) -> Result<DevicePollOutcome, SsoError>;
}
