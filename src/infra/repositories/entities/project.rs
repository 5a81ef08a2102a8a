//! Project entity. `status` holds the lowercase lifecycle name.

use sea_orm::entity::prelude::*;

use crate::domain::{LifecycleStatus, Project};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "projects")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub manager_id: Option<Uuid>,
    pub created_by: Uuid,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub status: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::project_volunteer::Entity")]
    Volunteers,
    #[sea_orm(has_many = "super::activity::Entity")]
    Activities,
}

impl Related<super::project_volunteer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Volunteers.def()
    }
}

impl Related<super::activity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Activities.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Project {
    fn from(model: Model) -> Self {
        Project {
            id: model.id,
            name: model.name,
            description: model.description,
            manager_id: model.manager_id,
            created_by: model.created_by,
            start_date: model.start_date,
            end_date: model.end_date,
            status: LifecycleStatus::from_db(&model.status),
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
