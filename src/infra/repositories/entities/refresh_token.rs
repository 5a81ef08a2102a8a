use sea_orm::entity::prelude::*;

use crate::domain::RefreshToken;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "refresh_tokens")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique, column_type = "Text")]
    pub token: String,
    pub user_id: Uuid,
    pub revoked: bool,
    pub expires_at: DateTimeUtc,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for RefreshToken {
    fn from(model: Model) -> Self {
        RefreshToken {
            id: model.id,
            token: model.token,
            user_id: model.user_id,
            revoked: model.revoked,
            expires_at: model.expires_at,
        }
    }
}
