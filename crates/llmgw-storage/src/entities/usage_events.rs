use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use time::OffsetDateTime;

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "usage_events")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub request_id: String,
    pub user_id: i64,
    pub model_id: Option<String>,
    pub input_tokens: Option<i64>,
    pub output_tokens: Option<i64>,
    pub cached_tokens: Option<i64>,
    pub reasoning_tokens: Option<i64>,
    pub status: String,
    pub failure_stage: Option<String>,
    pub error_type: Option<String>,
    pub error_message: Option<String>,
    pub usage_data_source: String,
    pub data_complete: bool,
    pub timestamp: OffsetDateTime,
    pub duration_ms: Option<i64>,
    pub input_cost_cents: Option<Decimal>,
    pub output_cost_cents: Option<Decimal>,
    pub total_cost_cents: Option<Decimal>,
}

impl ActiveModelBehavior for ActiveModel {}
