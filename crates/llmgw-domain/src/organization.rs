use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use time::OffsetDateTime;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SsoType {
    Oidc,
    Saml,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: i64,
    pub name: String,
    pub display_name: String,
    pub is_system: bool,
    pub created_at: OffsetDateTime,
    pub sso_type: Option<SsoType>,
    pub sso_config: HashMap<String, String>,
}

impl Organization {
    pub fn system_placeholder(display_name: impl Into<String>) -> Self {
        Organization {
            id: 0,
            name: "system".to_string(),
            display_name: display_name.into(),
            is_system: true,
            created_at: OffsetDateTime::UNIX_EPOCH,
            sso_type: None,
            sso_config: HashMap::new(),
        }
    }
}
