use sea_orm::entity::prelude::*;

use crate::domain::{Activity, LifecycleStatus};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "activities")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub date: Date,
    pub project_id: Uuid,
    pub created_by: Uuid,
    pub status: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::project::Entity",
        from = "Column::ProjectId",
        to = "super::project::Column::Id",
        on_delete = "Cascade"
    )]
    Project,
}

impl Related<super::project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Activity {
    fn from(model: Model) -> Self {
        Activity {
            id: model.id,
            title: model.title,
            description: model.description,
            date: model.date,
            project_id: model.project_id,
            created_by: model.created_by,
            status: LifecycleStatus::from_db(&model.status),
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
