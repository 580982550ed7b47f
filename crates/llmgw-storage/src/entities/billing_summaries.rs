use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use time::OffsetDateTime;

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "billing_summaries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub period_start: OffsetDateTime,
    pub period_end: OffsetDateTime,
    pub total_requests: i64,
    pub total_input_tokens: i64,
    pub total_output_tokens: i64,
    pub total_cost_cents: Decimal,
    pub created_at: OffsetDateTime,
}

impl ActiveModelBehavior for ActiveModel {}
