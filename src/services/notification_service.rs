use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::policy::require_role;
use crate::domain::{
    Actor, NewNotification, NotificationView, Role, SendNotification, SendOutcome,
};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UnitOfWork;

#[async_trait]
pub trait NotificationService: Send + Sync {
    /// Message one user, or broadcast to every active volunteer when no
    /// receiver is given (coordinators only).
    async fn send(&self, actor: Actor, input: SendNotification) -> AppResult<SendOutcome>;

    /// The actor's notifications, newest first.
    async fn list(&self, actor: Actor) -> AppResult<Vec<NotificationView>>;

    async fn mark_read(&self, actor: Actor, id: Uuid) -> AppResult<()>;
}

pub struct NotificationCenter<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> NotificationCenter<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl<U: UnitOfWork> NotificationService for NotificationCenter<U> {
    async fn send(&self, actor: Actor, input: SendNotification) -> AppResult<SendOutcome> {
        if input.receiver_id.is_none() {
            require_role(&actor, &[Role::Coordinator])?;
        }

        let broadcast = input.receiver_id.is_none();
        let sent = self
            .uow
            .transaction(move |tx| {
                Box::pin(async move {
                    let receivers = match input.receiver_id {
                        Some(receiver_id) => {
                            tx.users()
                                .find_by_id(receiver_id)
                                .await?
                                .ok_or_not_found("Receiver")?;
                            vec![receiver_id]
                        }
                        None => tx.users().active_ids_by_role(Role::Volunteer).await?,
                    };
                    let rows = receivers
                        .into_iter()
                        .map(|receiver_id| NewNotification {
                            sender_id: actor.id,
                            receiver_id,
                            message: input.message.clone(),
                        })
                        .collect();
                    tx.notifications().create_many(rows).await
                })
            })
            .await?;

        tracing::info!(sender_id = %actor.id, sent, broadcast, "Notification sent");
        Ok(SendOutcome { sent })
    }

    async fn list(&self, actor: Actor) -> AppResult<Vec<NotificationView>> {
        self.uow
            .read(move |tx| {
                Box::pin(async move {
                    let notifications = tx.notifications().list_for_receiver(actor.id).await?;

                    let mut sender_ids: Vec<Uuid> =
                        notifications.iter().map(|n| n.sender_id).collect();
                    sender_ids.sort();
                    sender_ids.dedup();
                    let names: HashMap<Uuid, String> = tx
                        .users()
                        .find_by_ids(&sender_ids)
                        .await?
                        .into_iter()
                        .map(|u| (u.id, u.name))
                        .collect();

                    Ok(notifications
                        .into_iter()
                        .map(|n| NotificationView {
                            sender_name: names.get(&n.sender_id).cloned(),
                            id: n.id,
                            message: n.message,
                            is_read: n.is_read,
                            created_at: n.created_at,
                            sender_id: n.sender_id,
                        })
                        .collect())
                })
            })
            .await
    }

    async fn mark_read(&self, actor: Actor, id: Uuid) -> AppResult<()> {
        let marked = self
            .uow
            .transaction(move |tx| {
                Box::pin(async move { tx.notifications().mark_read(id, actor.id).await })
            })
            .await?;

        if !marked {
            return Err(AppError::not_found("Notification not found"));
        }
        Ok(())
    }
}
