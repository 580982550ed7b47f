pub mod auth;
pub mod error;
pub mod iam;
pub mod models;
pub mod router;
pub mod state;
pub mod usage;

pub use error::ApiError;
pub use router::router;
pub use state::ControlState;
