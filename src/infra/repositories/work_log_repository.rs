//! Work-log repository.

use async_trait::async_trait;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set,
};
use uuid::Uuid;

use super::entities::work_log::{self, ActiveModel, Entity as WorkLogEntity};
use crate::domain::{NewWorkLog, WorkLog, WorkLogQuery, WorkLogStatus};
use crate::errors::AppResult;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait WorkLogRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<WorkLog>>;

    /// Read and lock the row until the transaction ends.
    async fn find_by_id_for_update(&self, id: Uuid) -> AppResult<Option<WorkLog>>;

    async fn create(&self, log: NewWorkLog) -> AppResult<WorkLog>;

    async fn update(&self, log: WorkLog) -> AppResult<WorkLog>;

    async fn delete(&self, id: Uuid) -> AppResult<bool>;

    /// Newest week first.
    async fn find(&self, query: WorkLogQuery) -> AppResult<Vec<WorkLog>>;

    async fn count(&self, query: WorkLogQuery) -> AppResult<u64>;

    /// Logged minutes per user over non-cancelled logs.
    async fn minutes_by_user(&self, user_ids: &[Uuid]) -> AppResult<Vec<(Uuid, i64)>>;
}

pub struct WorkLogStore<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> WorkLogStore<'a> {
    pub fn new(txn: &'a DatabaseTransaction) -> Self {
        Self { txn }
    }
}

/// `None` when a list filter is present but empty: nothing can match.
fn filtered(query: WorkLogQuery) -> Option<Select<WorkLogEntity>> {
    let mut select = WorkLogEntity::find();
    if let Some(ids) = query.user_ids {
        if ids.is_empty() {
            return None;
        }
        select = select.filter(work_log::Column::UserId.is_in(ids));
    }
    if let Some(ids) = query.activity_ids {
        if ids.is_empty() {
            return None;
        }
        select = select.filter(work_log::Column::ActivityId.is_in(ids));
    }
    if let Some(status) = query.status {
        select = select.filter(work_log::Column::Status.eq(status.as_str()));
    }
    if let Some(from) = query.week_from {
        select = select.filter(work_log::Column::WeekStart.gte(from));
    }
    if let Some(to) = query.week_to {
        select = select.filter(work_log::Column::WeekStart.lt(to));
    }
    Some(select)
}

fn active_model(log: &WorkLog) -> ActiveModel {
    ActiveModel {
        id: Set(log.id),
        user_id: Set(log.user_id),
        activity_id: Set(log.activity_id),
        week_start: Set(log.week_start),
        minutes: Set(log.hours.minutes() as i32),
        notes: Set(log.notes.clone()),
        status: Set(log.status.as_str().to_string()),
        approved_by: Set(log.approved_by),
        approved_at: Set(log.approved_at),
        created_at: Set(log.created_at),
        updated_at: Set(log.updated_at),
    }
}

#[async_trait]
impl WorkLogRepository for WorkLogStore<'_> {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<WorkLog>> {
        let model = WorkLogEntity::find_by_id(id).one(self.txn).await?;
        Ok(model.map(WorkLog::from))
    }

    async fn find_by_id_for_update(&self, id: Uuid) -> AppResult<Option<WorkLog>> {
        let model = WorkLogEntity::find_by_id(id)
            .lock_exclusive()
            .one(self.txn)
            .await?;
        Ok(model.map(WorkLog::from))
    }

    async fn create(&self, new_log: NewWorkLog) -> AppResult<WorkLog> {
        let now = chrono::Utc::now();
        let model = ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(new_log.user_id),
            activity_id: Set(new_log.activity_id),
            week_start: Set(new_log.week_start),
            minutes: Set(new_log.hours.minutes() as i32),
            notes: Set(new_log.notes),
            status: Set(WorkLogStatus::Pending.as_str().to_string()),
            approved_by: Set(None),
            approved_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.txn)
        .await?;
        Ok(WorkLog::from(model))
    }

    async fn update(&self, mut log: WorkLog) -> AppResult<WorkLog> {
        log.updated_at = chrono::Utc::now();
        let model = active_model(&log).update(self.txn).await?;
        Ok(WorkLog::from(model))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = WorkLogEntity::delete_by_id(id).exec(self.txn).await?;
        Ok(result.rows_affected > 0)
    }

    async fn find(&self, query: WorkLogQuery) -> AppResult<Vec<WorkLog>> {
        let Some(select) = filtered(query) else {
            return Ok(Vec::new());
        };
        let models = select
            .order_by_desc(work_log::Column::WeekStart)
            .order_by_desc(work_log::Column::CreatedAt)
            .all(self.txn)
            .await?;
        Ok(models.into_iter().map(WorkLog::from).collect())
    }

    async fn count(&self, query: WorkLogQuery) -> AppResult<u64> {
        match filtered(query) {
            Some(select) => Ok(select.count(self.txn).await?),
            None => Ok(0),
        }
    }

    async fn minutes_by_user(&self, user_ids: &[Uuid]) -> AppResult<Vec<(Uuid, i64)>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = WorkLogEntity::find()
            .select_only()
            .column(work_log::Column::UserId)
            .column_as(Expr::col(work_log::Column::Minutes).sum(), "total_minutes")
            .filter(work_log::Column::UserId.is_in(user_ids.iter().copied()))
            .filter(work_log::Column::Status.ne(WorkLogStatus::Cancelled.as_str()))
            .group_by(work_log::Column::UserId)
            .into_tuple::<(Uuid, Option<i64>)>()
            .all(self.txn)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(user_id, total)| (user_id, total.unwrap_or(0)))
            .collect())
    }
}
