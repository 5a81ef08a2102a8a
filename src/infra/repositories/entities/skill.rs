use sea_orm::entity::prelude::*;

use crate::domain::Skill;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "skills")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub name: String,
    pub created_by: Uuid,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Skill {
    fn from(model: Model) -> Self {
        Skill {
            id: model.id,
            name: model.name,
            created_by: model.created_by,
            created_at: model.created_at,
        }
    }
}
