use sea_orm::entity::prelude::*;

use crate::domain::PasswordResetToken;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "password_reset_tokens")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    #[sea_orm(unique)]
    pub token: String,
    pub expires_at: DateTimeUtc,
    pub used: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for PasswordResetToken {
    fn from(model: Model) -> Self {
        PasswordResetToken {
            id: model.id,
            user_id: model.user_id,
            token: model.token,
            expires_at: model.expires_at,
            used: model.used,
        }
    }
}
