pub mod api_tokens;
pub mod billing_summaries;
pub mod models;
pub mod openrouter_credentials;
pub mod organizations;
pub mod usage_events;
pub mod users;

pub use api_tokens::Entity as ApiTokens;
pub use billing_summaries::Entity as BillingSummaries;
pub use models::Entity as Models;
pub use openrouter_credentials::Entity as OpenRouterCredentials;
pub use organizations::Entity as Organizations;
pub use usage_events::Entity as UsageEvents;
pub use users::Entity as Users;
