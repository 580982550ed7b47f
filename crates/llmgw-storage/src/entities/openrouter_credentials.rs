use sea_orm::entity::prelude::*;

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "openrouter_credentials")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub api_key: String,
    pub site_name: Option<String>,
    pub http_referer: Option<String>,
    pub enabled: bool,
    #[sea_orm(has_many)]
    pub models: HasMany<super::models::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
