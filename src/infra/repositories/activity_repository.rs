//! Activity repository.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use super::entities::activity::{self, ActiveModel, Entity as ActivityEntity};
use crate::domain::{Activity, ActivityQuery, NewActivity};
use crate::errors::AppResult;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ActivityRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Activity>>;

    async fn find_by_title(&self, project_id: Uuid, title: &str) -> AppResult<Option<Activity>>;

    async fn create(&self, activity: NewActivity) -> AppResult<Activity>;

    async fn update(&self, activity: Activity) -> AppResult<Activity>;

    async fn delete(&self, id: Uuid) -> AppResult<bool>;

    /// Activities matching every set filter, soonest first.
    async fn list(&self, query: ActivityQuery) -> AppResult<Vec<Activity>>;
}

pub struct ActivityStore<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> ActivityStore<'a> {
    pub fn new(txn: &'a DatabaseTransaction) -> Self {
        Self { txn }
    }
}

#[async_trait]
impl ActivityRepository for ActivityStore<'_> {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Activity>> {
        let model = ActivityEntity::find_by_id(id).one(self.txn).await?;
        Ok(model.map(Activity::from))
    }

    async fn find_by_title(&self, project_id: Uuid, title: &str) -> AppResult<Option<Activity>> {
        let model = ActivityEntity::find()
            .filter(activity::Column::ProjectId.eq(project_id))
            .filter(activity::Column::Title.eq(title))
            .one(self.txn)
            .await?;
        Ok(model.map(Activity::from))
    }

    async fn create(&self, new_activity: NewActivity) -> AppResult<Activity> {
        let now = chrono::Utc::now();
        let model = ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(new_activity.title),
            description: Set(new_activity.description),
            date: Set(new_activity.date),
            project_id: Set(new_activity.project_id),
            created_by: Set(new_activity.created_by),
            status: Set(new_activity.status.as_str().to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.txn)
        .await?;
        Ok(Activity::from(model))
    }

    async fn update(&self, activity: Activity) -> AppResult<Activity> {
        let model = ActiveModel {
            id: Set(activity.id),
            title: Set(activity.title),
            description: Set(activity.description),
            date: Set(activity.date),
            project_id: Set(activity.project_id),
            created_by: Set(activity.created_by),
            status: Set(activity.status.as_str().to_string()),
            created_at: Set(activity.created_at),
            updated_at: Set(chrono::Utc::now()),
        }
        .update(self.txn)
        .await?;
        Ok(Activity::from(model))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = ActivityEntity::delete_by_id(id).exec(self.txn).await?;
        Ok(result.rows_affected > 0)
    }

    async fn list(&self, query: ActivityQuery) -> AppResult<Vec<Activity>> {
        let mut select = ActivityEntity::find().order_by_asc(activity::Column::Date);
        if let Some(ids) = query.project_ids {
            if ids.is_empty() {
                return Ok(Vec::new());
            }
            select = select.filter(activity::Column::ProjectId.is_in(ids));
        }
        if let Some(status) = query.status {
            select = select.filter(activity::Column::Status.eq(status.as_str()));
        }
        if let Some(from) = query.from {
            select = select.filter(activity::Column::Date.gte(from));
        }
        if let Some(to) = query.to {
            select = select.filter(activity::Column::Date.lte(to));
        }
        let models = select.all(self.txn).await?;
        Ok(models.into_iter().map(Activity::from).collect())
    }
}
