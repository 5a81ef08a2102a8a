//! Project repository: projects and their volunteer memberships.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use super::entities::project::{self, ActiveModel, Entity as ProjectEntity};
use super::entities::project_volunteer::{
    self, ActiveModel as VolunteerActiveModel, Entity as VolunteerEntity,
};
use super::entities::user::{self, Entity as UserEntity};
use crate::domain::{Membership, NewProject, Project, ProjectVolunteer, Role};
use crate::errors::AppResult;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Project>>;

    /// Read and lock the row until the transaction ends.
    async fn find_by_id_for_update(&self, id: Uuid) -> AppResult<Option<Project>>;

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Project>>;

    async fn find_many(&self, ids: &[Uuid]) -> AppResult<Vec<Project>>;

    /// All projects, or only those in `scope` when given.
    async fn list(&self, scope: Option<Vec<Uuid>>) -> AppResult<Vec<Project>>;

    async fn create(&self, project: NewProject) -> AppResult<Project>;

    async fn update(&self, project: Project) -> AppResult<Project>;

    /// Activities and memberships go with it.
    async fn delete(&self, id: Uuid) -> AppResult<bool>;

    async fn ids_managed_by(&self, user_id: Uuid) -> AppResult<Vec<Uuid>>;

    async fn ids_joined_by(&self, user_id: Uuid) -> AppResult<Vec<Uuid>>;

    async fn volunteers(&self, project_id: Uuid) -> AppResult<Vec<ProjectVolunteer>>;

    async fn is_volunteer(&self, project_id: Uuid, user_id: Uuid) -> AppResult<bool>;

    async fn count_volunteers(&self, project_id: Uuid) -> AppResult<u64>;

    async fn add_volunteer(
        &self,
        project_id: Uuid,
        user_id: Uuid,
        assigned_by: Option<Uuid>,
    ) -> AppResult<()>;

    async fn remove_volunteer(&self, project_id: Uuid, user_id: Uuid) -> AppResult<bool>;

    /// Memberships of active VOLUNTEER-role users, restricted to `scope` when given.
    async fn volunteer_memberships(&self, scope: Option<Vec<Uuid>>)
        -> AppResult<Vec<Membership>>;
}

pub struct ProjectStore<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> ProjectStore<'a> {
    pub fn new(txn: &'a DatabaseTransaction) -> Self {
        Self { txn }
    }
}

#[async_trait]
impl ProjectRepository for ProjectStore<'_> {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Project>> {
        let model = ProjectEntity::find_by_id(id).one(self.txn).await?;
        Ok(model.map(Project::from))
    }

    async fn find_by_id_for_update(&self, id: Uuid) -> AppResult<Option<Project>> {
        let model = ProjectEntity::find_by_id(id)
            .lock_exclusive()
            .one(self.txn)
            .await?;
        Ok(model.map(Project::from))
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Project>> {
        let model = ProjectEntity::find()
            .filter(project::Column::Name.eq(name))
            .one(self.txn)
            .await?;
        Ok(model.map(Project::from))
    }

    async fn find_many(&self, ids: &[Uuid]) -> AppResult<Vec<Project>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let models = ProjectEntity::find()
            .filter(project::Column::Id.is_in(ids.iter().copied()))
            .all(self.txn)
            .await?;
        Ok(models.into_iter().map(Project::from).collect())
    }

    async fn list(&self, scope: Option<Vec<Uuid>>) -> AppResult<Vec<Project>> {
        let mut query = ProjectEntity::find().order_by_desc(project::Column::CreatedAt);
        if let Some(ids) = scope {
            if ids.is_empty() {
                return Ok(Vec::new());
            }
            query = query.filter(project::Column::Id.is_in(ids));
        }
        let models = query.all(self.txn).await?;
        Ok(models.into_iter().map(Project::from).collect())
    }

    async fn create(&self, new_project: NewProject) -> AppResult<Project> {
        let now = chrono::Utc::now();
        let model = ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(new_project.name),
            description: Set(new_project.description),
            manager_id: Set(new_project.manager_id),
            created_by: Set(new_project.created_by),
            start_date: Set(new_project.start_date),
            end_date: Set(new_project.end_date),
            status: Set(new_project.status.as_str().to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.txn)
        .await?;
        Ok(Project::from(model))
    }

    async fn update(&self, project: Project) -> AppResult<Project> {
        let model = ActiveModel {
            id: Set(project.id),
            name: Set(project.name),
            description: Set(project.description),
            manager_id: Set(project.manager_id),
            created_by: Set(project.created_by),
            start_date: Set(project.start_date),
            end_date: Set(project.end_date),
            status: Set(project.status.as_str().to_string()),
            created_at: Set(project.created_at),
            updated_at: Set(chrono::Utc::now()),
        }
        .update(self.txn)
        .await?;
        Ok(Project::from(model))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = ProjectEntity::delete_by_id(id).exec(self.txn).await?;
        Ok(result.rows_affected > 0)
    }

    async fn ids_managed_by(&self, user_id: Uuid) -> AppResult<Vec<Uuid>> {
        let ids = ProjectEntity::find()
            .select_only()
            .column(project::Column::Id)
            .filter(project::Column::ManagerId.eq(user_id))
            .into_tuple::<Uuid>()
            .all(self.txn)
            .await?;
        Ok(ids)
    }

    async fn ids_joined_by(&self, user_id: Uuid) -> AppResult<Vec<Uuid>> {
        let ids = VolunteerEntity::find()
            .select_only()
            .column(project_volunteer::Column::ProjectId)
            .filter(project_volunteer::Column::UserId.eq(user_id))
            .into_tuple::<Uuid>()
            .all(self.txn)
            .await?;
        Ok(ids)
    }

    async fn volunteers(&self, project_id: Uuid) -> AppResult<Vec<ProjectVolunteer>> {
        let rows = VolunteerEntity::find()
            .filter(project_volunteer::Column::ProjectId.eq(project_id))
            .order_by_asc(project_volunteer::Column::AssignedAt)
            .all(self.txn)
            .await?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let users: HashMap<Uuid, user::Model> = UserEntity::find()
            .filter(user::Column::Id.is_in(rows.iter().map(|r| r.user_id)))
            .all(self.txn)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                users.get(&row.user_id).map(|u| ProjectVolunteer {
                    user_id: row.user_id,
                    name: u.name.clone(),
                    email: u.email.clone(),
                    assigned_at: row.assigned_at,
                    assigned_by: row.assigned_by,
                })
            })
            .collect())
    }

    async fn is_volunteer(&self, project_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let row = VolunteerEntity::find_by_id((project_id, user_id))
            .one(self.txn)
            .await?;
        Ok(row.is_some())
    }

    async fn count_volunteers(&self, project_id: Uuid) -> AppResult<u64> {
        let count = VolunteerEntity::find()
            .filter(project_volunteer::Column::ProjectId.eq(project_id))
            .count(self.txn)
            .await?;
        Ok(count)
    }

    async fn add_volunteer(
        &self,
        project_id: Uuid,
        user_id: Uuid,
        assigned_by: Option<Uuid>,
    ) -> AppResult<()> {
        VolunteerActiveModel {
            project_id: Set(project_id),
            user_id: Set(user_id),
            assigned_at: Set(chrono::Utc::now()),
            assigned_by: Set(assigned_by),
        }
        .insert(self.txn)
        .await?;
        Ok(())
    }

    async fn remove_volunteer(&self, project_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let result = VolunteerEntity::delete_by_id((project_id, user_id))
            .exec(self.txn)
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn volunteer_memberships(
        &self,
        scope: Option<Vec<Uuid>>,
    ) -> AppResult<Vec<Membership>> {
        let mut query = VolunteerEntity::find();
        if let Some(ids) = scope {
            if ids.is_empty() {
                return Ok(Vec::new());
            }
            query = query.filter(project_volunteer::Column::ProjectId.is_in(ids));
        }
        let rows = query.all(self.txn).await?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let volunteers: HashSet<Uuid> = UserEntity::find()
            .select_only()
            .column(user::Column::Id)
            .filter(user::Column::Id.is_in(rows.iter().map(|r| r.user_id)))
            .filter(user::Column::Role.eq(Role::Volunteer.as_str()))
            .filter(user::Column::IsActive.eq(true))
            .into_tuple::<Uuid>()
            .all(self.txn)
            .await?
            .into_iter()
            .collect();

        Ok(rows
            .iter()
            .filter(|row| volunteers.contains(&row.user_id))
            .map(Membership::from)
            .collect())
    }
}
