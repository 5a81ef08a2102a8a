//! Projects, their volunteer set and the consistency rules around them.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::activity::Activity;
use super::status::LifecycleStatus;
use super::user::{User, UserSummary};
use crate::errors::{AppError, AppResult};
use crate::types::nullable;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Project {
    pub id: Uuid,
    #[schema(example = "Food Drive")]
    pub name: String,
    pub description: Option<String>,
    pub manager_id: Option<Uuid>,
    pub created_by: Uuid,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: LifecycleStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn is_managed_by(&self, user_id: Uuid) -> bool {
        self.manager_id == Some(user_id)
    }
}

/// End date may not precede start date.
pub fn check_date_range(start: Option<NaiveDate>, end: Option<NaiveDate>) -> AppResult<()> {
    match (start, end) {
        (Some(start), Some(end)) if end < start => Err(AppError::bad_request(
            "Project end date cannot be before its start date",
        )),
        _ => Ok(()),
    }
}

/// A project manager must hold a managing role and be active.
pub fn ensure_manager_eligible(user: &User) -> AppResult<()> {
    if !user.role.can_manage_projects() {
        return Err(AppError::conflict(
            "Project manager must have role PROJECT_MANAGER or COORDINATOR",
        ));
    }
    if !user.is_active {
        return Err(AppError::conflict("Project manager account is inactive"));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub description: Option<String>,
    pub manager_id: Option<Uuid>,
    pub created_by: Uuid,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: LifecycleStatus,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateProject {
    #[validate(length(min = 1, max = 255, message = "Project name is required"))]
    #[schema(example = "Food Drive")]
    pub name: String,
    pub description: Option<String>,
    pub manager_id: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: Option<LifecycleStatus>,
}

/// Partial project update. Nullable fields distinguish "absent" from `null`.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProject {
    #[validate(length(min = 1, max = 255, message = "Project name cannot be empty"))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<Uuid>)]
    pub manager_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<NaiveDate>)]
    pub start_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<NaiveDate>)]
    pub end_date: Option<Option<NaiveDate>>,
    pub status: Option<LifecycleStatus>,
}

impl UpdateProject {
    /// Apply to a project, returning whether the manager changes.
    pub fn apply_to(self, project: &mut Project) -> bool {
        let manager_changed = matches!(self.manager_id, Some(new) if new != project.manager_id);
        if let Some(name) = self.name {
            project.name = name;
        }
        if let Some(description) = self.description {
            project.description = description;
        }
        if let Some(manager_id) = self.manager_id {
            project.manager_id = manager_id;
        }
        if let Some(start_date) = self.start_date {
            project.start_date = start_date;
        }
        if let Some(end_date) = self.end_date {
            project.end_date = end_date;
        }
        if let Some(status) = self.status {
            project.status = status;
        }
        manager_changed
    }
}

/// Membership row joined with the volunteer's identity.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ProjectVolunteer {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub assigned_at: DateTime<Utc>,
    pub assigned_by: Option<Uuid>,
}

/// (project, user) membership pair used by scoped aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Membership {
    pub project_id: Uuid,
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProjectDetails {
    pub project: Project,
    pub manager: Option<UserSummary>,
    pub volunteers: Vec<ProjectVolunteer>,
    pub activities: Vec<Activity>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AddVolunteer {
    pub user_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;

    fn user(role: Role, is_active: bool) -> User {
        User {
            id: Uuid::new_v4(),
            name: "M".into(),
            email: "m@example.org".into(),
            password_hash: String::new(),
            role,
            is_active,
            phone: None,
            city: None,
            country: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn manager_role_is_checked() {
        assert!(ensure_manager_eligible(&user(Role::ProjectManager, true)).is_ok());
        assert!(ensure_manager_eligible(&user(Role::Coordinator, true)).is_ok());
        assert!(matches!(
            ensure_manager_eligible(&user(Role::Volunteer, true)),
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            ensure_manager_eligible(&user(Role::ProjectManager, false)),
            Err(AppError::Conflict(_))
        ));
    }

    #[test]
    fn end_before_start_is_rejected() {
        let start = NaiveDate::from_ymd_opt(2025, 3, 1);
        let end = NaiveDate::from_ymd_opt(2025, 2, 28);
        assert!(matches!(check_date_range(start, end), Err(AppError::BadRequest(_))));
        assert!(check_date_range(start, start).is_ok());
        assert!(check_date_range(None, end).is_ok());
    }

    #[test]
    fn explicit_null_clears_manager() {
        let update: UpdateProject = serde_json::from_str(r#"{"manager_id": null}"#).unwrap();
        assert_eq!(update.manager_id, Some(None));

        let untouched: UpdateProject = serde_json::from_str(r#"{"name": "x"}"#).unwrap();
        assert_eq!(untouched.manager_id, None);
    }
}
