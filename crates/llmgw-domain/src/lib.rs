pub mod billing_summary;
pub mod credential;
pub mod model;
pub mod organization;
pub mod repo;
pub mod session;
pub mod token;
pub mod usage_event;
pub mod user;

pub use billing_summary::BillingSummary;
pub use credential::OpenRouterCredential;
pub use model::{CredentialType, Model, ModelCapabilities, ModelCapabilitiesPatch, ModelPricing};
pub use organization::{Organization, SsoType};
pub use repo::{
    BillingRepository, CredentialRepository, IdentityRepository, ModelRepository,
    TokenRepository, UsageQueryFilter, UsageRepository,
};
pub use session::Session;
pub use token::ApiToken;
pub use usage_event::{FailureStage, UsageDataSource, UsageEvent, UsageStatus};
pub use user::{AuthProviderKind, User};
