//! Work-log entity. Durations are whole minutes in `minutes`.

use sea_orm::entity::prelude::*;

use crate::domain::{WorkDuration, WorkLog, WorkLogStatus};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "work_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub activity_id: Option<Uuid>,
    pub week_start: Date,
    pub minutes: i32,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub status: String,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for WorkLog {
    fn from(model: Model) -> Self {
        WorkLog {
            id: model.id,
            user_id: model.user_id,
            activity_id: model.activity_id,
            week_start: model.week_start,
            hours: WorkDuration::from_stored(model.minutes),
            notes: model.notes,
            status: WorkLogStatus::from_db(&model.status),
            approved_by: model.approved_by,
            approved_at: model.approved_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
