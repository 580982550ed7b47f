use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "models")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub provider_id: String,
    pub credential_id: i64,
    pub credential_type: String,
    pub input_cost_per_token: Decimal,
    pub output_cost_per_token: Decimal,
    pub cap_streaming: bool,
    pub cap_json: bool,
    pub cap_tools: bool,
    pub cap_vision: bool,
    pub cap_reasoning: bool,
    pub cap_max_input_tokens: i32,
    pub cap_max_output_tokens: i32,
    pub metadata_json: Json,
    pub enabled: bool,
    #[sea_orm(belongs_to, from = "credential_id", to = "id")]
    pub credential: HasOne<super::openrouter_credentials::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
