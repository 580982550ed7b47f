pub mod flow_store;
pub mod handler;
pub mod oidc_provider;
pub mod pkce;
pub mod types;

pub use handler::{router, SsoHandler, SESSION_COOKIE};
pub use oidc_provider::{poll_until_authorized, OidcProvider, OidcProviderConfig};
pub use types::{DevicePollOutcome, DeviceStart, ExternalIdentity, SsoError, SsoProvider};
