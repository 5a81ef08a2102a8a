//! User domain entity and related types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::role::{Actor, Role};
use crate::types::nullable;

/// User domain entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn actor(&self) -> Actor {
        Actor::new(self.id, self.role)
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

/// Data needed to insert a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

/// Partial update applied by the user store. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub password_hash: Option<String>,
    pub phone: Option<Option<String>>,
    pub city: Option<Option<String>>,
    pub country: Option<Option<String>>,
}

/// Compact user reference embedded in other payloads.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct UserSummary {
    pub id: Uuid,
    #[schema(example = "Ada Volunteer")]
    pub name: String,
    #[schema(example = "ada@example.org")]
    pub email: String,
    pub role: Role,
}

/// User response (safe to return to client)
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    #[schema(example = "Ada Volunteer")]
    pub name: String,
    #[schema(example = "ada@example.org")]
    pub email: String,
    pub role: Role,
    pub is_active: bool,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            is_active: user.is_active,
            phone: user.phone,
            city: user.city,
            country: user.country,
            created_at: user.created_at,
        }
    }
}

/// Row of the coordinator's user listing.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserWithHours {
    pub user: UserResponse,
    /// Hours logged across all non-cancelled work logs
    #[schema(example = 12.5)]
    pub total_hours: f64,
}

/// Account created by a coordinator. The person sets a password through the
/// welcome e-mail.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateUser {
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    #[schema(example = "Ada Volunteer")]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "ada@example.org")]
    pub email: String,
    pub role: Role,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateUser {
    #[validate(length(min = 1, max = 255, message = "Name cannot be empty"))]
    pub name: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub city: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub country: Option<Option<String>>,
}

impl UpdateUser {
    /// A coordinator may not lock themselves out.
    pub fn removes_own_access(&self) -> bool {
        self.role.is_some_and(|role| role != Role::Coordinator) || self.is_active == Some(false)
    }
}

impl From<UpdateUser> for UserChanges {
    fn from(update: UpdateUser) -> Self {
        Self {
            name: update.name,
            role: update.role,
            is_active: update.is_active,
            password_hash: None,
            phone: update.phone,
            city: update.city,
            country: update.country,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demotion_or_deactivation_removes_access() {
        let demote = UpdateUser {
            role: Some(Role::Volunteer),
            ..Default::default()
        };
        let deactivate = UpdateUser {
            is_active: Some(false),
            ..Default::default()
        };
        let rename = UpdateUser {
            name: Some("New".into()),
            role: Some(Role::Coordinator),
            ..Default::default()
        };
        assert!(demote.removes_own_access());
        assert!(deactivate.removes_own_access());
        assert!(!rename.removes_own_access());
    }
}
