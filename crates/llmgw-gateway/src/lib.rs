pub mod cache;
pub mod credential_cache;
pub mod middleware;
pub mod model_cache;
pub mod pipeline;
pub mod router;
pub mod state;
pub mod tracked_client;
pub mod upstream;

pub use credential_cache::CredentialCache;
pub use model_cache::ModelCache;
pub use router::router;
pub use state::GatewayState;
pub use upstream::{UpstreamClient, UpstreamError};
