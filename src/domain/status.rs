//! Lifecycle status shared by projects and activities.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleStatus {
    #[default]
    Planned,
    Active,
    Completed,
    Cancelled,
}

impl LifecycleStatus {
    pub const ALL: [LifecycleStatus; 4] = [
        LifecycleStatus::Planned,
        LifecycleStatus::Active,
        LifecycleStatus::Completed,
        LifecycleStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleStatus::Planned => "planned",
            LifecycleStatus::Active => "active",
            LifecycleStatus::Completed => "completed",
            LifecycleStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_db(value: &str) -> Self {
        value.parse().unwrap_or_else(|_| {
            tracing::warn!(status = %value, "Unknown lifecycle status in storage");
            LifecycleStatus::Planned
        })
    }
}

impl FromStr for LifecycleStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LifecycleStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| AppError::bad_request(format!("Invalid status: {}", s)))
    }
}

impl fmt::Display for LifecycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
