//! Notification repository.

use async_trait::async_trait;
use sea_orm::{
    sea_query::Expr, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use super::entities::notification::{self, ActiveModel, Entity as NotificationEntity};
use crate::domain::{NewNotification, Notification};
use crate::errors::AppResult;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Insert all rows, returning how many were written.
    async fn create_many(&self, notifications: Vec<NewNotification>) -> AppResult<u64>;

    /// Newest first.
    async fn list_for_receiver(&self, receiver_id: Uuid) -> AppResult<Vec<Notification>>;

    /// `false` when no such notification belongs to `receiver_id`.
    async fn mark_read(&self, id: Uuid, receiver_id: Uuid) -> AppResult<bool>;
}

pub struct NotificationStore<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> NotificationStore<'a> {
    pub fn new(txn: &'a DatabaseTransaction) -> Self {
        Self { txn }
    }
}

#[async_trait]
impl NotificationRepository for NotificationStore<'_> {
    async fn create_many(&self, notifications: Vec<NewNotification>) -> AppResult<u64> {
        if notifications.is_empty() {
            return Ok(0);
        }
        let now = chrono::Utc::now();
        let count = notifications.len() as u64;
        let rows = notifications.into_iter().map(|n| ActiveModel {
            id: Set(Uuid::new_v4()),
            sender_id: Set(n.sender_id),
            receiver_id: Set(n.receiver_id),
            message: Set(n.message),
            is_read: Set(false),
            created_at: Set(now),
        });
        NotificationEntity::insert_many(rows)
            .exec_without_returning(self.txn)
            .await?;
        Ok(count)
    }

    async fn list_for_receiver(&self, receiver_id: Uuid) -> AppResult<Vec<Notification>> {
        let models = NotificationEntity::find()
            .filter(notification::Column::ReceiverId.eq(receiver_id))
            .order_by_desc(notification::Column::CreatedAt)
            .all(self.txn)
            .await?;
        Ok(models.into_iter().map(Notification::from).collect())
    }

    async fn mark_read(&self, id: Uuid, receiver_id: Uuid) -> AppResult<bool> {
        let result = NotificationEntity::update_many()
            .col_expr(notification::Column::IsRead, Expr::value(true))
            .filter(notification::Column::Id.eq(id))
            .filter(notification::Column::ReceiverId.eq(receiver_id))
            .exec(self.txn)
            .await?;
        Ok(result.rows_affected > 0)
    }
}
