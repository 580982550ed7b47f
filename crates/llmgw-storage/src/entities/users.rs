use sea_orm::entity::prelude::*;
use time::OffsetDateTime;

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique_key = "user_email")]
    pub email: String,
    pub name: String,
    pub organization_id: i64,
    #[sea_orm(unique_key = "user_provider_external")]
    pub external_id: Option<String>,
    #[sea_orm(unique_key = "user_provider_external")]
    pub provider: String,
    pub system_admin: bool,
    pub created_at: OffsetDateTime,
    pub last_login: Option<OffsetDateTime>,
    #[sea_orm(belongs_to, from = "organization_id", to = "id", on_delete = "Cascade")]
    pub organization: HasOne<super::organizations::Entity>,
    #[sea_orm(has_many)]
    pub tokens: HasMany<super::api_tokens::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
