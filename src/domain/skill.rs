use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::user::UserSummary;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Skill {
    pub id: Uuid,
    #[schema(example = "First aid")]
    pub name: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Skill with the volunteers holding it.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SkillEntry {
    pub skill: Skill,
    pub volunteers: Vec<UserSummary>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SkillInput {
    #[validate(length(min = 1, max = 100, message = "Skill name is required"))]
    #[schema(example = "First aid")]
    pub name: String,
}
