use llmgw_common::money::Cents;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialType {
    Openrouter,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelPricing {
    pub input_cost_per_token: Cents,
    pub output_cost_per_token: Cents,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelCapabilities {
    pub streaming: bool,
    pub json: bool,
    pub tools: bool,
    pub vision: bool,
    pub reasoning: bool,
    pub max_input_tokens: u32,
    pub max_output_tokens: u32,
}

/// Field-mask-style partial update for [`ModelCapabilities`]: every field
/// is independently optional. A field that is absent from the patch
/// leaves the corresponding capability unchanged, since field presence is
/// already distinguishable from field value over this JSON transport.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ModelCapabilitiesPatch {
    pub streaming: Option<bool>,
    pub json: Option<bool>,
    pub tools: Option<bool>,
    pub vision: Option<bool>,
    pub reasoning: Option<bool>,
    pub max_input_tokens: Option<u32>,
    pub max_output_tokens: Option<u32>,
}

impl ModelCapabilitiesPatch {
    pub fn apply(&self, base: ModelCapabilities) -> ModelCapabilities {
        ModelCapabilities {
            streaming: self.streaming.unwrap_or(base.streaming),
            json: self.json.unwrap_or(base.json),
            tools: self.tools.unwrap_or(base.tools),
            vision: self.vision.unwrap_or(base.vision),
            reasoning: self.reasoning.unwrap_or(base.reasoning),
            max_input_tokens: self.max_input_tokens.unwrap_or(base.max_input_tokens),
            max_output_tokens: self.max_output_tokens.unwrap_or(base.max_output_tokens),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub id: String,
    pub name: String,
    pub provider_id: String,
    pub credential_id: i64,
    pub credential_type: CredentialType,
    pub pricing: ModelPricing,
    pub capabilities: ModelCapabilities,
    /// Carries the upstream model reference under `metadata["model_reference"]`.
    pub metadata: Value,
    pub enabled: bool,
}

impl Model {
    /// The provider-side identifier to send upstream, distinct from `id`
    /// (the gateway's logical model id).
    pub fn upstream_model_reference(&self) -> Option<&str> {
        self.metadata.get("model_reference")?.as_str()
    }
}
