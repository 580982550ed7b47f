pub mod extract;
pub mod hash;
pub mod session;
pub mod sso;
pub mod token_authenticator;

pub use extract::extract_bearer_or_api_key;
pub use session::{spawn_cleanup_task, SessionLookupError, SessionStore};
pub use sso::{router as sso_router, SsoHandler, SsoProvider};
pub use token_authenticator::TokenAuthenticator;
