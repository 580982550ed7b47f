pub mod config;
pub mod error;
pub mod money;
pub mod optional;

pub use config::{GatewayConfig, GatewayConfigError, GatewayConfigPatch};
pub use error::RepoError;
pub use money::Cents;
