//! Work logs: weekly time entries and their approval state machine.
//!
//! ```text
//! pending --approve--> approved --unapprove--> pending
//! ```
//!
//! `cancelled` is a valid stored status with no transition into or out of it.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::role::Actor;
use crate::config::MAX_WORK_LOG_MINUTES;
use crate::errors::{AppError, AppResult};
use crate::types::nullable;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum WorkLogStatus {
    #[default]
    Pending,
    Approved,
    Cancelled,
}

impl WorkLogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkLogStatus::Pending => "pending",
            WorkLogStatus::Approved => "approved",
            WorkLogStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_db(value: &str) -> Self {
        value.parse().unwrap_or_else(|_| {
            tracing::warn!(status = %value, "Unknown work log status in storage");
            WorkLogStatus::Pending
        })
    }
}

impl FromStr for WorkLogStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(WorkLogStatus::Pending),
            "approved" => Ok(WorkLogStatus::Approved),
            "cancelled" => Ok(WorkLogStatus::Cancelled),
            other => Err(AppError::bad_request(format!("Invalid work log status: {}", other))),
        }
    }
}

impl fmt::Display for WorkLogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hours and minutes as exchanged with clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DurationParts {
    #[schema(example = 2)]
    pub hours: u32,
    #[serde(default)]
    #[schema(example = 30)]
    pub minutes: u32,
}

/// Wire shapes accepted for a duration.
#[derive(Deserialize)]
#[serde(untagged)]
pub enum DurationInput {
    Hours(f64),
    Text(String),
    Parts(DurationParts),
}

/// Time spent, stored as whole minutes in `(0, 168h]`.
///
/// Accepts `2.5`, `"2:30"`, `"2.5"` or `{"hours": 2, "minutes": 30}` and
/// always serializes as `{"hours": h, "minutes": m}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "DurationInput", into = "DurationParts")]
pub struct WorkDuration {
    minutes: u32,
}

impl WorkDuration {
    pub fn from_minutes(minutes: u32) -> AppResult<Self> {
        if minutes == 0 {
            return Err(AppError::bad_request("Hours must be greater than zero"));
        }
        if minutes > MAX_WORK_LOG_MINUTES {
            return Err(AppError::bad_request("Hours cannot exceed 168 per work log"));
        }
        Ok(Self { minutes })
    }

    /// Rebuild from a stored value without re-validating.
    pub fn from_stored(minutes: i32) -> Self {
        Self {
            minutes: minutes.max(0) as u32,
        }
    }

    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    pub fn hours(&self) -> f64 {
        f64::from(self.minutes) / 60.0
    }

    fn from_hours(hours: f64) -> AppResult<Self> {
        if !hours.is_finite() || hours < 0.0 {
            return Err(AppError::bad_request("Hours must be a positive number"));
        }
        let minutes = (hours * 60.0).round();
        if minutes > f64::from(u32::MAX) {
            return Err(AppError::bad_request("Hours cannot exceed 168 per work log"));
        }
        Self::from_minutes(minutes as u32)
    }

    fn from_text(text: &str) -> AppResult<Self> {
        let text = text.trim();
        match text.split_once(':') {
            Some((h, m)) => {
                let hours: u32 = h
                    .trim()
                    .parse()
                    .map_err(|_| AppError::bad_request("Hours must use the H:MM format"))?;
                let minutes: u32 = m
                    .trim()
                    .parse()
                    .map_err(|_| AppError::bad_request("Hours must use the H:MM format"))?;
                if minutes >= 60 {
                    return Err(AppError::bad_request("Minutes must be between 0 and 59"));
                }
                Self::from_parts(DurationParts { hours, minutes })
            }
            None => {
                let hours: f64 = text
                    .parse()
                    .map_err(|_| AppError::bad_request("Hours must be a number or H:MM"))?;
                Self::from_hours(hours)
            }
        }
    }

    fn from_parts(parts: DurationParts) -> AppResult<Self> {
        let total = u64::from(parts.hours) * 60 + u64::from(parts.minutes);
        let total = u32::try_from(total)
            .map_err(|_| AppError::bad_request("Hours cannot exceed 168 per work log"))?;
        Self::from_minutes(total)
    }
}

impl TryFrom<DurationInput> for WorkDuration {
    type Error = String;

    fn try_from(input: DurationInput) -> Result<Self, Self::Error> {
        let parsed = match input {
            DurationInput::Hours(hours) => Self::from_hours(hours),
            DurationInput::Text(text) => Self::from_text(&text),
            DurationInput::Parts(parts) => Self::from_parts(parts),
        };
        parsed.map_err(|e| e.to_string())
    }
}

impl From<WorkDuration> for DurationParts {
    fn from(duration: WorkDuration) -> Self {
        Self {
            hours: duration.minutes / 60,
            minutes: duration.minutes % 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WorkLog {
    pub id: Uuid,
    pub user_id: Uuid,
    pub activity_id: Option<Uuid>,
    pub week_start: NaiveDate,
    #[schema(value_type = DurationParts)]
    pub hours: WorkDuration,
    pub notes: Option<String>,
    pub status: WorkLogStatus,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkLog {
    pub fn approve(&mut self, approver: Uuid, at: DateTime<Utc>) -> AppResult<()> {
        match self.status {
            WorkLogStatus::Pending => {
                self.status = WorkLogStatus::Approved;
                self.approved_by = Some(approver);
                self.approved_at = Some(at);
                self.updated_at = at;
                Ok(())
            }
            WorkLogStatus::Approved => Err(AppError::conflict("Work log is already approved")),
            WorkLogStatus::Cancelled => {
                Err(AppError::conflict("Cancelled work logs cannot be approved"))
            }
        }
    }

    pub fn unapprove(&mut self, at: DateTime<Utc>) -> AppResult<()> {
        match self.status {
            WorkLogStatus::Approved => {
                self.status = WorkLogStatus::Pending;
                self.approved_by = None;
                self.approved_at = None;
                self.updated_at = at;
                Ok(())
            }
            _ => Err(AppError::conflict("Only approved work logs can be unapproved")),
        }
    }

    /// Owners and coordinators may edit or delete a log while it is pending.
    pub fn ensure_editable_by(&self, actor: &Actor) -> AppResult<()> {
        if self.user_id != actor.id && !actor.is_coordinator() {
            return Err(AppError::forbidden("You can only modify your own work logs"));
        }
        if self.status != WorkLogStatus::Pending {
            return Err(AppError::conflict(format!(
                "Work log is {} and can no longer be modified",
                self.status
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct NewWorkLog {
    pub user_id: Uuid,
    pub activity_id: Option<Uuid>,
    pub week_start: NaiveDate,
    pub hours: WorkDuration,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateWorkLog {
    pub activity_id: Option<Uuid>,
    pub week_start: NaiveDate,
    #[schema(value_type = DurationParts)]
    pub hours: WorkDuration,
    #[validate(length(max = 2000, message = "Notes are too long"))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateWorkLog {
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<Uuid>)]
    pub activity_id: Option<Option<Uuid>>,
    pub week_start: Option<NaiveDate>,
    #[schema(value_type = Option<DurationParts>)]
    pub hours: Option<WorkDuration>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub notes: Option<Option<String>>,
}

impl UpdateWorkLog {
    pub fn apply_to(self, log: &mut WorkLog) {
        if let Some(activity_id) = self.activity_id {
            log.activity_id = activity_id;
        }
        if let Some(week_start) = self.week_start {
            log.week_start = week_start;
        }
        if let Some(hours) = self.hours {
            log.hours = hours;
        }
        if let Some(notes) = self.notes {
            log.notes = notes;
        }
    }
}

/// Store-level filter. `None` fields are unrestricted; `week_to` is exclusive.
#[derive(Debug, Clone, Default)]
pub struct WorkLogQuery {
    pub user_ids: Option<Vec<Uuid>>,
    pub activity_ids: Option<Vec<Uuid>>,
    pub status: Option<WorkLogStatus>,
    pub week_from: Option<NaiveDate>,
    pub week_to: Option<NaiveDate>,
}
