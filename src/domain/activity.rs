//! Activities belong to exactly one project.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::project::Project;
use super::status::LifecycleStatus;
use crate::errors::{AppError, AppResult};
use crate::types::nullable;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Activity {
    pub id: Uuid,
    #[schema(example = "Pack boxes")]
    pub title: String,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub project_id: Uuid,
    pub created_by: Uuid,
    pub status: LifecycleStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An activity may not be scheduled before its project starts.
pub fn check_date_against_project(date: NaiveDate, project: &Project) -> AppResult<()> {
    match project.start_date {
        Some(start) if date < start => Err(AppError::bad_request(format!(
            "Activity date {} is before the project start date {}",
            date, start
        ))),
        _ => Ok(()),
    }
}

#[derive(Debug, Clone)]
pub struct NewActivity {
    pub title: String,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub project_id: Uuid,
    pub created_by: Uuid,
    pub status: LifecycleStatus,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateActivity {
    #[validate(length(min = 1, max = 255, message = "Title is required"))]
    #[schema(example = "Pack boxes")]
    pub title: String,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub project_id: Uuid,
    pub status: Option<LifecycleStatus>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateActivity {
    #[validate(length(min = 1, max = 255, message = "Title cannot be empty"))]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    pub date: Option<NaiveDate>,
    pub status: Option<LifecycleStatus>,
    /// Moving an activity to another project is reserved to coordinators
    pub project_id: Option<Uuid>,
}

impl UpdateActivity {
    pub fn apply_to(self, activity: &mut Activity) {
        if let Some(title) = self.title {
            activity.title = title;
        }
        if let Some(description) = self.description {
            activity.description = description;
        }
        if let Some(date) = self.date {
            activity.date = date;
        }
        if let Some(status) = self.status {
            activity.status = status;
        }
    }
}

/// Query-string filter shared by the listing and statistics endpoints.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ActivityFilter {
    pub project_id: Option<Uuid>,
    pub status: Option<LifecycleStatus>,
    /// Earliest activity date (inclusive)
    pub from: Option<NaiveDate>,
    /// Latest activity date (inclusive)
    pub to: Option<NaiveDate>,
}

/// Store-level query: `project_ids: None` means unrestricted.
#[derive(Debug, Clone, Default)]
pub struct ActivityQuery {
    pub project_ids: Option<Vec<Uuid>>,
    pub status: Option<LifecycleStatus>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ActivityListItem {
    pub activity: Activity,
    pub project_name: String,
    pub total_volunteers: u64,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct VolunteerRef {
    pub volunteer_id: Uuid,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct MoveActivity {
    pub project_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project_starting(start: Option<NaiveDate>) -> Project {
        Project {
            id: Uuid::new_v4(),
            name: "P".into(),
            description: None,
            manager_id: None,
            created_by: Uuid::new_v4(),
            start_date: start,
            end_date: None,
            status: LifecycleStatus::Planned,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn date_must_not_precede_project_start() {
        let start = NaiveDate::from_ymd_opt(2025, 5, 10).unwrap();
        let project = project_starting(Some(start));

        assert!(check_date_against_project(start, &project).is_ok());
        assert!(check_date_against_project(start.succ_opt().unwrap(), &project).is_ok());
        assert!(matches!(
            check_date_against_project(start.pred_opt().unwrap(), &project),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn no_start_date_means_no_constraint() {
        let project = project_starting(None);
        let any = NaiveDate::from_ymd_opt(1999, 1, 1).unwrap();
        assert!(check_date_against_project(any, &project).is_ok());
    }
}
