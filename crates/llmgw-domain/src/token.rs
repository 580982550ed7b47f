use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Persisted API token record. `token_hash` is a self-describing encoded
/// password hash (parameters embedded in the string itself, per Design
/// Note "Password-hash encoding") — never compared or stored in any other
/// form. The raw token is never persisted anywhere.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiToken {
    pub id: i64,
    pub user_id: i64,
    pub description: Option<String>,
    pub prefix_hash: String,
    pub token_hash: String,
    pub created_at: OffsetDateTime,
    pub expires_at: OffsetDateTime,
    pub last_used_at: Option<OffsetDateTime>,
}

/// Returned exactly once, at issuance. `raw_token` is never retrievable
/// again once this value is discarded.
#[derive(Clone, Debug, Serialize)]
pub struct IssuedToken {
    pub record: ApiToken,
    pub raw_token: String,
}
