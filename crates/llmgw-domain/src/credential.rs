use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OpenRouterCredential {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub api_key: String,
    pub site_name: Option<String>,
    pub http_referer: Option<String>,
    pub enabled: bool,
}
