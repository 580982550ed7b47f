use llmgw_common::money::Cents;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageStatus {
    Success,
    Failed,
    Timeout,
    Cancelled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    PreGeneration,
    DuringGeneration,
    PostGeneration,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageDataSource {
    ProviderResponse,
    Unavailable,
    StreamingIncomplete,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UsageEvent {
    pub id: i64,
    pub request_id: String,
    pub user_id: i64,
    pub model_id: Option<String>,
    pub input_tokens: Option<i64>,
    pub output_tokens: Option<i64>,
    pub cached_tokens: Option<i64>,
    pub reasoning_tokens: Option<i64>,
    pub status: UsageStatus,
    pub failure_stage: Option<FailureStage>,
    pub error_type: Option<String>,
    pub error_message: Option<String>,
    pub usage_data_source: UsageDataSource,
    pub data_complete: bool,
    pub timestamp: OffsetDateTime,
    pub duration_ms: Option<i64>,
    pub input_cost_cents: Option<Cents>,
    pub output_cost_cents: Option<Cents>,
    pub total_cost_cents: Option<Cents>,
}
