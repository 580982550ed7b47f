use llmgw_common::money::Cents;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BillingSummary {
    pub id: i64,
    pub user_id: i64,
    pub period_start: OffsetDateTime,
    pub period_end: OffsetDateTime,
    pub total_requests: i64,
    pub total_input_tokens: i64,
    pub total_output_tokens: i64,
    pub total_cost_cents: Cents,
    pub created_at: OffsetDateTime,
}
