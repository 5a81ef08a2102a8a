//! Work logs and their approval workflow.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::policy::{authorize, require_role};
use crate::domain::{
    Action, ActivityQuery, Actor, CreateWorkLog, NewNotification, NewWorkLog, Role, Target,
    UpdateWorkLog, WorkLog, WorkLogQuery, WorkLogStatus,
};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::{TransactionContext, UnitOfWork};

#[async_trait]
pub trait WorkLogService: Send + Sync {
    /// Record time for the actor.
    async fn create(&self, actor: Actor, input: CreateWorkLog) -> AppResult<WorkLog>;

    async fn mine(&self, actor: Actor) -> AppResult<Vec<WorkLog>>;

    /// Pending logs the actor may review.
    async fn pending(&self, actor: Actor) -> AppResult<Vec<WorkLog>>;

    async fn for_user(&self, actor: Actor, user_id: Uuid) -> AppResult<Vec<WorkLog>>;

    async fn update(&self, actor: Actor, id: Uuid, input: UpdateWorkLog) -> AppResult<WorkLog>;

    async fn delete(&self, actor: Actor, id: Uuid) -> AppResult<()>;

    async fn approve(&self, actor: Actor, id: Uuid) -> AppResult<WorkLog>;

    async fn unapprove(&self, actor: Actor, id: Uuid) -> AppResult<WorkLog>;
}

async fn lock_log(tx: TransactionContext<'_>, id: Uuid) -> AppResult<WorkLog> {
    tx.work_logs()
        .find_by_id_for_update(id)
        .await?
        .ok_or_not_found("Work log")
}

/// Logging time against an activity requires belonging to (or managing) its
/// project, except for coordinators.
async fn check_activity_access(
    tx: TransactionContext<'_>,
    actor: &Actor,
    activity_id: Uuid,
) -> AppResult<()> {
    let activity = tx
        .activities()
        .find_by_id(activity_id)
        .await?
        .ok_or_not_found("Activity")?;
    if actor.is_coordinator() {
        return Ok(());
    }
    let project = tx
        .projects()
        .find_by_id(activity.project_id)
        .await?
        .ok_or_not_found("Project")?;
    if project.is_managed_by(actor.id) || tx.projects().is_volunteer(project.id, actor.id).await? {
        Ok(())
    } else {
        Err(AppError::forbidden(
            "You can only log time for activities of projects you belong to",
        ))
    }
}

/// The manager who may review `log`: the manager of its activity's project.
/// Logs without an activity are coordinator territory.
async fn review_target(tx: TransactionContext<'_>, log: &WorkLog) -> AppResult<Target> {
    let Some(activity_id) = log.activity_id else {
        return Ok(Target::unmanaged());
    };
    let Some(activity) = tx.activities().find_by_id(activity_id).await? else {
        return Ok(Target::unmanaged());
    };
    let manager_id = tx
        .projects()
        .find_by_id(activity.project_id)
        .await?
        .and_then(|project| project.manager_id);
    Ok(Target::managed_by(manager_id))
}

pub struct WorkLogLedger<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> WorkLogLedger<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl<U: UnitOfWork> WorkLogService for WorkLogLedger<U> {
    async fn create(&self, actor: Actor, input: CreateWorkLog) -> AppResult<WorkLog> {
        let log = self
            .uow
            .transaction(move |tx| {
                Box::pin(async move {
                    if let Some(activity_id) = input.activity_id {
                        check_activity_access(tx, &actor, activity_id).await?;
                    }
                    tx.work_logs()
                        .create(NewWorkLog {
                            user_id: actor.id,
                            activity_id: input.activity_id,
                            week_start: input.week_start,
                            hours: input.hours,
                            notes: input.notes,
                        })
                        .await
                })
            })
            .await?;

        tracing::info!(work_log_id = %log.id, user_id = %actor.id, minutes = log.hours.minutes(), "Work log recorded");
        Ok(log)
    }

    async fn mine(&self, actor: Actor) -> AppResult<Vec<WorkLog>> {
        self.uow
            .read(move |tx| {
                Box::pin(async move {
                    tx.work_logs()
                        .find(WorkLogQuery {
                            user_ids: Some(vec![actor.id]),
                            ..Default::default()
                        })
                        .await
                })
            })
            .await
    }

    async fn pending(&self, actor: Actor) -> AppResult<Vec<WorkLog>> {
        require_role(&actor, &[Role::Coordinator, Role::ProjectManager])?;

        self.uow
            .read(move |tx| {
                Box::pin(async move {
                    let activity_ids = if actor.is_coordinator() {
                        None
                    } else {
                        let managed = tx.projects().ids_managed_by(actor.id).await?;
                        let activities = tx
                            .activities()
                            .list(ActivityQuery {
                                project_ids: Some(managed),
                                ..Default::default()
                            })
                            .await?;
                        Some(activities.into_iter().map(|a| a.id).collect())
                    };
                    tx.work_logs()
                        .find(WorkLogQuery {
                            activity_ids,
                            status: Some(WorkLogStatus::Pending),
                            ..Default::default()
                        })
                        .await
                })
            })
            .await
    }

    async fn for_user(&self, actor: Actor, user_id: Uuid) -> AppResult<Vec<WorkLog>> {
        require_role(&actor, &[Role::Coordinator])?;

        self.uow
            .read(move |tx| {
                Box::pin(async move {
                    tx.users().find_by_id(user_id).await?.ok_or_not_found("User")?;
                    tx.work_logs()
                        .find(WorkLogQuery {
                            user_ids: Some(vec![user_id]),
                            ..Default::default()
                        })
                        .await
                })
            })
            .await
    }

    async fn update(&self, actor: Actor, id: Uuid, input: UpdateWorkLog) -> AppResult<WorkLog> {
        let log = self
            .uow
            .transaction(move |tx| {
                Box::pin(async move {
                    let mut log = lock_log(tx, id).await?;
                    log.ensure_editable_by(&actor)?;

                    if let Some(Some(activity_id)) = input.activity_id {
                        if Some(activity_id) != log.activity_id {
                            check_activity_access(tx, &actor, activity_id).await?;
                        }
                    }
                    input.apply_to(&mut log);
                    tx.work_logs().update(log).await
                })
            })
            .await?;

        tracing::info!(work_log_id = %log.id, updated_by = %actor.id, "Work log updated");
        Ok(log)
    }

    async fn delete(&self, actor: Actor, id: Uuid) -> AppResult<()> {
        self.uow
            .transaction(move |tx| {
                Box::pin(async move {
                    let log = lock_log(tx, id).await?;
                    log.ensure_editable_by(&actor)?;
                    tx.work_logs().delete(id).await?;
                    Ok(())
                })
            })
            .await?;

        tracing::info!(work_log_id = %id, deleted_by = %actor.id, "Work log deleted");
        Ok(())
    }

    async fn approve(&self, actor: Actor, id: Uuid) -> AppResult<WorkLog> {
        let log = self
            .uow
            .transaction(move |tx| {
                Box::pin(async move {
                    let mut log = lock_log(tx, id).await?;
                    let target = review_target(tx, &log).await?;
                    authorize(&actor, Action::ApproveWorkLog, &target)?;

                    log.approve(actor.id, Utc::now())?;
                    let log = tx.work_logs().update(log).await?;
                    tx.notifications()
                        .create_many(vec![NewNotification {
                            sender_id: actor.id,
                            receiver_id: log.user_id,
                            message: format!(
                                "Your work log for the week of {} was approved",
                                log.week_start
                            ),
                        }])
                        .await?;
                    Ok(log)
                })
            })
            .await?;

        tracing::info!(work_log_id = %log.id, approved_by = %actor.id, "Work log approved");
        Ok(log)
    }

    async fn unapprove(&self, actor: Actor, id: Uuid) -> AppResult<WorkLog> {
        let log = self
            .uow
            .transaction(move |tx| {
                Box::pin(async move {
                    let mut log = lock_log(tx, id).await?;
                    let target = review_target(tx, &log).await?;
                    authorize(&actor, Action::UnapproveWorkLog, &target)?;

                    log.unapprove(Utc::now())?;
                    tx.work_logs().update(log).await
                })
            })
            .await?;

        tracing::info!(work_log_id = %log.id, unapproved_by = %actor.id, "Work log approval withdrawn");
        Ok(log)
    }
}
