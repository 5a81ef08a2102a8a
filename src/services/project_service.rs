//! Projects and their volunteer set.
//!
//! Every mutation fetches the project (locked for update), evaluates the
//! policy and only then writes, inside a single transaction.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use super::activity_service::relocate_activity;
use super::scope::visibility_for;
use crate::domain::policy::{authorize, ensure_volunteer_removable};
use crate::domain::project::{check_date_range, ensure_manager_eligible};
use crate::domain::{
    Action, Activity, ActivityQuery, Actor, CreateProject, MoveActivity, NewNotification,
    NewProject, Project, ProjectDetails, ProjectVolunteer, Target, UpdateProject,
};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::{TransactionContext, UnitOfWork};

#[async_trait]
pub trait ProjectService: Send + Sync {
    async fn create(&self, actor: Actor, input: CreateProject) -> AppResult<Project>;

    /// Projects visible to the actor, newest first.
    async fn list(&self, actor: Actor) -> AppResult<Vec<Project>>;

    async fn get(&self, actor: Actor, id: Uuid) -> AppResult<ProjectDetails>;

    async fn update(&self, actor: Actor, id: Uuid, input: UpdateProject) -> AppResult<Project>;

    /// Delete a project together with its activities and memberships.
    async fn delete(&self, actor: Actor, id: Uuid) -> AppResult<()>;

    async fn add_volunteer(
        &self,
        actor: Actor,
        project_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<Vec<ProjectVolunteer>>;

    async fn remove_volunteer(
        &self,
        actor: Actor,
        project_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<Vec<ProjectVolunteer>>;

    /// Move an activity to another project (coordinators only).
    async fn move_activity(
        &self,
        actor: Actor,
        activity_id: Uuid,
        input: MoveActivity,
    ) -> AppResult<Activity>;
}

pub(crate) async fn lock_project(tx: TransactionContext<'_>, id: Uuid) -> AppResult<Project> {
    tx.projects()
        .find_by_id_for_update(id)
        .await?
        .ok_or_not_found("Project")
}

async fn ensure_unique_name(
    tx: TransactionContext<'_>,
    name: &str,
    except: Option<Uuid>,
) -> AppResult<()> {
    match tx.projects().find_by_name(name).await? {
        Some(existing) if Some(existing.id) != except => {
            Err(AppError::conflict("A project with this name already exists"))
        }
        _ => Ok(()),
    }
}

async fn check_manager(tx: TransactionContext<'_>, manager_id: Option<Uuid>) -> AppResult<()> {
    if let Some(manager_id) = manager_id {
        let manager = tx
            .users()
            .find_by_id(manager_id)
            .await?
            .ok_or_else(|| AppError::not_found("Manager user not found"))?;
        ensure_manager_eligible(&manager)?;
    }
    Ok(())
}

pub struct ProjectOffice<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> ProjectOffice<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl<U: UnitOfWork> ProjectService for ProjectOffice<U> {
    async fn create(&self, actor: Actor, input: CreateProject) -> AppResult<Project> {
        authorize(&actor, Action::CreateProject, &Target::managed_by(input.manager_id))?;
        check_date_range(input.start_date, input.end_date)?;

        let project = self
            .uow
            .transaction(move |tx| {
                Box::pin(async move {
                    ensure_unique_name(tx, &input.name, None).await?;
                    check_manager(tx, input.manager_id).await?;
                    tx.projects()
                        .create(NewProject {
                            name: input.name,
                            description: input.description,
                            manager_id: input.manager_id,
                            created_by: actor.id,
                            start_date: input.start_date,
                            end_date: input.end_date,
                            status: input.status.unwrap_or_default(),
                        })
                        .await
                })
            })
            .await?;

        tracing::info!(project_id = %project.id, created_by = %actor.id, "Project created");
        Ok(project)
    }

    async fn list(&self, actor: Actor) -> AppResult<Vec<Project>> {
        self.uow
            .read(move |tx| {
                Box::pin(async move {
                    let scope = visibility_for(tx, &actor).await?;
                    tx.projects().list(scope.project_ids()).await
                })
            })
            .await
    }

    async fn get(&self, actor: Actor, id: Uuid) -> AppResult<ProjectDetails> {
        self.uow
            .read(move |tx| {
                Box::pin(async move {
                    let project = tx.projects().find_by_id(id).await?.ok_or_not_found("Project")?;
                    if !visibility_for(tx, &actor).await?.allows(id) {
                        return Err(AppError::forbidden("You do not have access to this project"));
                    }

                    let manager = match project.manager_id {
                        Some(manager_id) => tx
                            .users()
                            .find_by_id(manager_id)
                            .await?
                            .map(|user| user.summary()),
                        None => None,
                    };
                    let volunteers = tx.projects().volunteers(id).await?;
                    let activities = tx
                        .activities()
                        .list(ActivityQuery {
                            project_ids: Some(vec![id]),
                            ..Default::default()
                        })
                        .await?;

                    Ok(ProjectDetails {
                        project,
                        manager,
                        volunteers,
                        activities,
                    })
                })
            })
            .await
    }

    async fn update(&self, actor: Actor, id: Uuid, input: UpdateProject) -> AppResult<Project> {
        let project = self
            .uow
            .transaction(move |tx| {
                Box::pin(async move {
                    let mut project = lock_project(tx, id).await?;
                    let target = Target::managed_by(project.manager_id);
                    authorize(&actor, Action::UpdateProject, &target)?;

                    if let Some(name) = input.name.as_deref() {
                        ensure_unique_name(tx, name, Some(id)).await?;
                    }

                    let new_manager = input.manager_id;
                    let manager_changed = input.apply_to(&mut project);
                    if manager_changed {
                        authorize(&actor, Action::ChangeProjectManager, &target)?;
                        check_manager(tx, new_manager.flatten()).await?;
                    }
                    check_date_range(project.start_date, project.end_date)?;

                    tx.projects().update(project).await
                })
            })
            .await?;

        tracing::info!(project_id = %project.id, updated_by = %actor.id, "Project updated");
        Ok(project)
    }

    async fn delete(&self, actor: Actor, id: Uuid) -> AppResult<()> {
        self.uow
            .transaction(move |tx| {
                Box::pin(async move {
                    let project = lock_project(tx, id).await?;
                    authorize(&actor, Action::DeleteProject, &Target::managed_by(project.manager_id))?;
                    tx.projects().delete(id).await?;
                    Ok(())
                })
            })
            .await?;

        tracing::info!(project_id = %id, deleted_by = %actor.id, "Project deleted");
        Ok(())
    }

    async fn add_volunteer(
        &self,
        actor: Actor,
        project_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<Vec<ProjectVolunteer>> {
        let volunteers = self
            .uow
            .transaction(move |tx| {
                Box::pin(async move {
                    add_member(tx, &actor, Action::AddProjectVolunteer, project_id, user_id)
                        .await?;
                    tx.projects().volunteers(project_id).await
                })
            })
            .await?;

        tracing::info!(project_id = %project_id, user_id = %user_id, assigned_by = %actor.id, "Volunteer added to project");
        Ok(volunteers)
    }

    async fn remove_volunteer(
        &self,
        actor: Actor,
        project_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<Vec<ProjectVolunteer>> {
        let volunteers = self
            .uow
            .transaction(move |tx| {
                Box::pin(async move {
                    remove_member(tx, &actor, Action::RemoveProjectVolunteer, project_id, user_id)
                        .await?;
                    tx.projects().volunteers(project_id).await
                })
            })
            .await?;

        tracing::info!(project_id = %project_id, user_id = %user_id, removed_by = %actor.id, "Volunteer removed from project");
        Ok(volunteers)
    }

    async fn move_activity(
        &self,
        actor: Actor,
        activity_id: Uuid,
        input: MoveActivity,
    ) -> AppResult<Activity> {
        authorize(&actor, Action::MoveActivity, &Target::unmanaged())?;

        let activity = self
            .uow
            .transaction(move |tx| {
                Box::pin(async move {
                    let activity = tx
                        .activities()
                        .find_by_id(activity_id)
                        .await?
                        .ok_or_not_found("Activity")?;
                    relocate_activity(tx, activity, input.project_id).await
                })
            })
            .await?;

        tracing::info!(activity_id = %activity.id, project_id = %activity.project_id, "Activity moved");
        Ok(activity)
    }
}

/// Add an active user to the project's volunteer set and notify them.
pub(crate) async fn add_member(
    tx: TransactionContext<'_>,
    actor: &Actor,
    action: Action,
    project_id: Uuid,
    user_id: Uuid,
) -> AppResult<()> {
    let project = lock_project(tx, project_id).await?;
    authorize(actor, action, &Target::managed_by(project.manager_id))?;

    let user = tx.users().find_by_id(user_id).await?.ok_or_not_found("User")?;
    if !user.is_active {
        return Err(AppError::conflict("User account is inactive"));
    }
    if tx.projects().is_volunteer(project_id, user_id).await? {
        return Err(AppError::conflict("User is already a volunteer of this project"));
    }

    tx.projects()
        .add_volunteer(project_id, user_id, Some(actor.id))
        .await?;
    tx.notifications()
        .create_many(vec![NewNotification {
            sender_id: actor.id,
            receiver_id: user_id,
            message: format!("You have been added to the project \"{}\"", project.name),
        }])
        .await?;
    Ok(())
}

/// Remove `user_id` from the project, enforcing the last-volunteer rule.
/// Shared by project membership and activity unassignment.
///
/// The project row stays locked until the transaction ends, so concurrent
/// removals see each other's effect on the volunteer count.
pub(crate) async fn remove_member(
    tx: TransactionContext<'_>,
    actor: &Actor,
    action: Action,
    project_id: Uuid,
    user_id: Uuid,
) -> AppResult<()> {
    let project = lock_project(tx, project_id).await?;
    authorize(actor, action, &Target::managed_by(project.manager_id))?;

    if !tx.projects().is_volunteer(project_id, user_id).await? {
        return Err(AppError::not_found("User is not a volunteer of this project"));
    }
    let remaining = tx.projects().count_volunteers(project_id).await?;
    ensure_volunteer_removable(actor, remaining)?;

    tx.projects().remove_volunteer(project_id, user_id).await?;
    Ok(())
}
