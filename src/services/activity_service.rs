//! Activities and their (project-level) volunteers.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use super::project_service::{add_member, lock_project, remove_member};
use super::scope::visibility_for;
use crate::domain::activity::check_date_against_project;
use crate::domain::policy::authorize;
use crate::domain::stats::activity_stats;
use crate::domain::{
    Action, Activity, ActivityFilter, ActivityListItem, ActivityQuery, ActivityStats, Actor,
    CreateActivity, NewActivity, ProjectVolunteer, Target, UpdateActivity, Visibility,
    WorkLogQuery, WorkLogStatus,
};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::{TransactionContext, UnitOfWork};

#[async_trait]
pub trait ActivityService: Send + Sync {
    async fn create(&self, actor: Actor, input: CreateActivity) -> AppResult<Activity>;

    /// Visible activities, earliest first.
    async fn list(&self, actor: Actor, filter: ActivityFilter) -> AppResult<Vec<ActivityListItem>>;

    async fn stats(&self, actor: Actor, filter: ActivityFilter) -> AppResult<ActivityStats>;

    async fn get(&self, actor: Actor, id: Uuid) -> AppResult<Activity>;

    /// Update an activity. A new `project_id` moves it (coordinators only).
    async fn update(&self, actor: Actor, id: Uuid, input: UpdateActivity) -> AppResult<Activity>;

    async fn delete(&self, actor: Actor, id: Uuid) -> AppResult<()>;

    /// Add a volunteer to the activity's project.
    async fn assign(
        &self,
        actor: Actor,
        id: Uuid,
        volunteer_id: Uuid,
    ) -> AppResult<Vec<ProjectVolunteer>>;

    /// Remove a volunteer from the activity's project.
    async fn unassign(
        &self,
        actor: Actor,
        id: Uuid,
        volunteer_id: Uuid,
    ) -> AppResult<Vec<ProjectVolunteer>>;

    async fn volunteers(&self, actor: Actor, id: Uuid) -> AppResult<Vec<ProjectVolunteer>>;
}

async fn find_activity(tx: TransactionContext<'_>, id: Uuid) -> AppResult<Activity> {
    tx.activities().find_by_id(id).await?.ok_or_not_found("Activity")
}

async fn ensure_unique_title(
    tx: TransactionContext<'_>,
    project_id: Uuid,
    title: &str,
    except: Option<Uuid>,
) -> AppResult<()> {
    match tx.activities().find_by_title(project_id, title).await? {
        Some(existing) if Some(existing.id) != except => Err(AppError::conflict(
            "An activity with this title already exists in this project",
        )),
        _ => Ok(()),
    }
}

/// Fetch an activity the actor is allowed to see.
async fn visible_activity(
    tx: TransactionContext<'_>,
    actor: &Actor,
    id: Uuid,
) -> AppResult<Activity> {
    let activity = find_activity(tx, id).await?;
    if !visibility_for(tx, actor).await?.allows(activity.project_id) {
        return Err(AppError::forbidden("You do not have access to this activity"));
    }
    Ok(activity)
}

async fn scoped_activities(
    tx: TransactionContext<'_>,
    actor: &Actor,
    filter: ActivityFilter,
) -> AppResult<Vec<Activity>> {
    let scope: Visibility = visibility_for(tx, actor).await?.narrow(filter.project_id)?;
    tx.activities()
        .list(ActivityQuery {
            project_ids: scope.project_ids(),
            status: filter.status,
            from: filter.from,
            to: filter.to,
        })
        .await
}

/// Move `activity` to `destination`, revalidating the date and title there.
pub(crate) async fn relocate_activity(
    tx: TransactionContext<'_>,
    mut activity: Activity,
    destination: Uuid,
) -> AppResult<Activity> {
    let project = lock_project(tx, destination).await?;
    check_date_against_project(activity.date, &project)?;
    ensure_unique_title(tx, destination, &activity.title, Some(activity.id)).await?;

    activity.project_id = destination;
    tx.activities().update(activity).await
}

pub struct ActivityPlanner<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> ActivityPlanner<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl<U: UnitOfWork> ActivityService for ActivityPlanner<U> {
    async fn create(&self, actor: Actor, input: CreateActivity) -> AppResult<Activity> {
        let activity = self
            .uow
            .transaction(move |tx| {
                Box::pin(async move {
                    let project = lock_project(tx, input.project_id).await?;
                    authorize(
                        &actor,
                        Action::CreateActivity,
                        &Target::managed_by(project.manager_id),
                    )?;
                    check_date_against_project(input.date, &project)?;
                    ensure_unique_title(tx, project.id, &input.title, None).await?;

                    tx.activities()
                        .create(NewActivity {
                            title: input.title,
                            description: input.description,
                            date: input.date,
                            project_id: project.id,
                            created_by: actor.id,
                            status: input.status.unwrap_or_default(),
                        })
                        .await
                })
            })
            .await?;

        tracing::info!(activity_id = %activity.id, project_id = %activity.project_id, created_by = %actor.id, "Activity created");
        Ok(activity)
    }

    async fn list(&self, actor: Actor, filter: ActivityFilter) -> AppResult<Vec<ActivityListItem>> {
        self.uow
            .read(move |tx| {
                Box::pin(async move {
                    let activities = scoped_activities(tx, &actor, filter).await?;

                    let mut project_ids: Vec<Uuid> =
                        activities.iter().map(|a| a.project_id).collect();
                    project_ids.sort();
                    project_ids.dedup();

                    let names: HashMap<Uuid, String> = tx
                        .projects()
                        .find_many(&project_ids)
                        .await?
                        .into_iter()
                        .map(|p| (p.id, p.name))
                        .collect();
                    let mut volunteers: HashMap<Uuid, u64> = HashMap::new();
                    for membership in tx.projects().volunteer_memberships(Some(project_ids)).await? {
                        *volunteers.entry(membership.project_id).or_default() += 1;
                    }

                    Ok(activities
                        .into_iter()
                        .map(|activity| ActivityListItem {
                            project_name: names.get(&activity.project_id).cloned().unwrap_or_default(),
                            total_volunteers: volunteers
                                .get(&activity.project_id)
                                .copied()
                                .unwrap_or(0),
                            activity,
                        })
                        .collect())
                })
            })
            .await
    }

    async fn stats(&self, actor: Actor, filter: ActivityFilter) -> AppResult<ActivityStats> {
        self.uow
            .read(move |tx| {
                Box::pin(async move {
                    let activities = scoped_activities(tx, &actor, filter).await?;

                    let activity_ids: Vec<Uuid> = activities.iter().map(|a| a.id).collect();
                    let mut project_ids: Vec<Uuid> =
                        activities.iter().map(|a| a.project_id).collect();
                    project_ids.sort();
                    project_ids.dedup();

                    let logs = tx
                        .work_logs()
                        .find(WorkLogQuery {
                            activity_ids: Some(activity_ids),
                            status: Some(WorkLogStatus::Approved),
                            ..Default::default()
                        })
                        .await?;
                    let memberships = tx.projects().volunteer_memberships(Some(project_ids)).await?;

                    Ok(activity_stats(
                        &activities,
                        &logs,
                        &memberships,
                        Utc::now().date_naive(),
                    ))
                })
            })
            .await
    }

    async fn get(&self, actor: Actor, id: Uuid) -> AppResult<Activity> {
        self.uow
            .read(move |tx| Box::pin(async move { visible_activity(tx, &actor, id).await }))
            .await
    }

    async fn update(&self, actor: Actor, id: Uuid, input: UpdateActivity) -> AppResult<Activity> {
        let activity = self
            .uow
            .transaction(move |tx| {
                Box::pin(async move {
                    let mut activity = find_activity(tx, id).await?;
                    let project = lock_project(tx, activity.project_id).await?;
                    authorize(
                        &actor,
                        Action::UpdateActivity,
                        &Target::managed_by(project.manager_id),
                    )?;

                    let destination = input.project_id.filter(|p| *p != activity.project_id);
                    if destination.is_some() {
                        authorize(&actor, Action::MoveActivity, &Target::unmanaged())?;
                    }

                    input.apply_to(&mut activity);
                    match destination {
                        Some(destination) => relocate_activity(tx, activity, destination).await,
                        None => {
                            check_date_against_project(activity.date, &project)?;
                            ensure_unique_title(tx, project.id, &activity.title, Some(activity.id))
                                .await?;
                            tx.activities().update(activity).await
                        }
                    }
                })
            })
            .await?;

        tracing::info!(activity_id = %activity.id, updated_by = %actor.id, "Activity updated");
        Ok(activity)
    }

    async fn delete(&self, actor: Actor, id: Uuid) -> AppResult<()> {
        self.uow
            .transaction(move |tx| {
                Box::pin(async move {
                    let activity = find_activity(tx, id).await?;
                    let project = lock_project(tx, activity.project_id).await?;
                    authorize(
                        &actor,
                        Action::DeleteActivity,
                        &Target::managed_by(project.manager_id),
                    )?;
                    tx.activities().delete(id).await?;
                    Ok(())
                })
            })
            .await?;

        tracing::info!(activity_id = %id, deleted_by = %actor.id, "Activity deleted");
        Ok(())
    }

    async fn assign(
        &self,
        actor: Actor,
        id: Uuid,
        volunteer_id: Uuid,
    ) -> AppResult<Vec<ProjectVolunteer>> {
        let volunteers = self
            .uow
            .transaction(move |tx| {
                Box::pin(async move {
                    let activity = find_activity(tx, id).await?;
                    add_member(
                        tx,
                        &actor,
                        Action::AssignActivityVolunteer,
                        activity.project_id,
                        volunteer_id,
                    )
                    .await?;
                    tx.projects().volunteers(activity.project_id).await
                })
            })
            .await?;

        tracing::info!(activity_id = %id, user_id = %volunteer_id, assigned_by = %actor.id, "Volunteer assigned");
        Ok(volunteers)
    }

    async fn unassign(
        &self,
        actor: Actor,
        id: Uuid,
        volunteer_id: Uuid,
    ) -> AppResult<Vec<ProjectVolunteer>> {
        let volunteers = self
            .uow
            .transaction(move |tx| {
                Box::pin(async move {
                    let activity = find_activity(tx, id).await?;
                    remove_member(
                        tx,
                        &actor,
                        Action::UnassignActivityVolunteer,
                        activity.project_id,
                        volunteer_id,
                    )
                    .await?;
                    tx.projects().volunteers(activity.project_id).await
                })
            })
            .await?;

        tracing::info!(activity_id = %id, user_id = %volunteer_id, removed_by = %actor.id, "Volunteer unassigned");
        Ok(volunteers)
    }

    async fn volunteers(&self, actor: Actor, id: Uuid) -> AppResult<Vec<ProjectVolunteer>> {
        self.uow
            .read(move |tx| {
                Box::pin(async move {
                    let activity = visible_activity(tx, &actor, id).await?;
                    tx.projects().volunteers(activity.project_id).await
                })
            })
            .await
    }
}
