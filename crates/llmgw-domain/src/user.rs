use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthProviderKind {
    Oidc,
    Saml,
    Github,
    None,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub organization_id: i64,
    pub external_id: Option<String>,
    pub provider: AuthProviderKind,
    pub system_admin: bool,
    pub created_at: OffsetDateTime,
    pub last_login: Option<OffsetDateTime>,
}

impl User {
    /// Authorization helper: can `self` view resources scoped to
    /// organization `org_id`? Sysadmins can view any organization; everyone
    /// else only their own. Shared across the several operations that
    /// apply this rule.
    pub fn can_view_organization(&self, org_id: i64) -> bool {
        self.system_admin || self.organization_id == org_id
    }

    /// Can `self` act on behalf of user `target_id`? Sysadmins, or the user
    /// acting on themselves.
    pub fn can_act_as(&self, target_id: i64) -> bool {
        self.system_admin || self.id == target_id
    }
}
