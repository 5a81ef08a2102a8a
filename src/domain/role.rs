//! Roles and the authenticated actor.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::AppError;

/// Closed set of account roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Coordinator,
    ProjectManager,
    Volunteer,
    Legal,
}

impl Role {
    pub const ALL: [Role; 4] = [
        Role::Coordinator,
        Role::ProjectManager,
        Role::Volunteer,
        Role::Legal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Coordinator => "COORDINATOR",
            Role::ProjectManager => "PROJECT_MANAGER",
            Role::Volunteer => "VOLUNTEER",
            Role::Legal => "LEGAL",
        }
    }

    /// Roles a person may pick when signing up on their own.
    pub fn is_self_assignable(&self) -> bool {
        matches!(self, Role::Volunteer | Role::Legal)
    }

    /// Roles that may be named manager of a project.
    pub fn can_manage_projects(&self) -> bool {
        matches!(self, Role::Coordinator | Role::ProjectManager)
    }

    /// Decode a stored role. Unknown values degrade to the least privileged role.
    pub fn from_db(value: &str) -> Self {
        value.parse().unwrap_or_else(|_| {
            tracing::warn!(role = %value, "Unknown role in storage, treating as VOLUNTEER");
            Role::Volunteer
        })
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| AppError::bad_request(format!("Invalid role: {}", s)))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated identity performing a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn new(id: Uuid, role: Role) -> Self {
        Self { id, role }
    }

    pub fn is_coordinator(&self) -> bool {
        self.role == Role::Coordinator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("project_manager".parse::<Role>().unwrap(), Role::ProjectManager);
        assert_eq!("LEGAL".parse::<Role>().unwrap(), Role::Legal);
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn unknown_stored_role_is_volunteer() {
        assert_eq!(Role::from_db("superuser"), Role::Volunteer);
    }

    #[test]
    fn serde_uses_screaming_case() {
        let json = serde_json::to_string(&Role::ProjectManager).unwrap();
        assert_eq!(json, "\"PROJECT_MANAGER\"");
    }

    #[test]
    fn only_volunteer_and_legal_self_register() {
        let allowed: Vec<Role> = Role::ALL
            .into_iter()
            .filter(Role::is_self_assignable)
            .collect();
        assert_eq!(allowed, vec![Role::Volunteer, Role::Legal]);
    }
}
