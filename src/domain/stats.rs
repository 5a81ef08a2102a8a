//! Role-scoped visibility and the read-only aggregates built on it.
//!
//! Aggregates are computed from rows already filtered by [`Visibility`], so
//! their correctness reduces to the filter predicate.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::HashSet;
use utoipa::ToSchema;
use uuid::Uuid;

use super::activity::Activity;
use super::project::{Membership, Project};
use super::status::LifecycleStatus;
use super::worklog::{WorkLog, WorkLogStatus};
use crate::errors::{AppError, AppResult};

/// Which projects an actor may see in listings and aggregates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Visibility {
    All,
    Projects(Vec<Uuid>),
}

impl Visibility {
    pub fn allows(&self, project_id: Uuid) -> bool {
        match self {
            Visibility::All => true,
            Visibility::Projects(ids) => ids.contains(&project_id),
        }
    }

    /// Store filter: `None` when unrestricted.
    pub fn project_ids(&self) -> Option<Vec<Uuid>> {
        match self {
            Visibility::All => None,
            Visibility::Projects(ids) => Some(ids.clone()),
        }
    }

    /// Restrict to an explicitly requested project, which must be visible.
    pub fn narrow(self, project_id: Option<Uuid>) -> AppResult<Visibility> {
        match project_id {
            None => Ok(self),
            Some(id) if self.allows(id) => Ok(Visibility::Projects(vec![id])),
            Some(_) => Err(AppError::forbidden("You do not have access to this project")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct StatusCount {
    pub status: LifecycleStatus,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DashboardStats {
    pub total_volunteers: u64,
    pub upcoming_activities: u64,
    #[schema(example = 42.5)]
    pub hours_this_month: f64,
    pub approved_hours_this_month: f64,
    pub pending_work_logs: u64,
    pub projects_by_status: Vec<StatusCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ActivityStats {
    pub total: u64,
    pub by_status: Vec<StatusCount>,
    pub upcoming: u64,
    pub approved_logs: u64,
    pub total_approved_hours: f64,
    pub average_approved_hours: f64,
    pub unique_volunteers: u64,
}

/// First day of the month containing `today` and first day of the next one.
pub fn month_bounds(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = today.with_day(1).unwrap_or(today);
    let next = if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
    };
    (first, next.unwrap_or(first))
}

pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Count per status, every status present even when zero.
pub fn status_breakdown(statuses: impl IntoIterator<Item = LifecycleStatus>) -> Vec<StatusCount> {
    let mut counts = [0u64; 4];
    for status in statuses {
        if let Some(slot) = LifecycleStatus::ALL.iter().position(|s| *s == status) {
            counts[slot] += 1;
        }
    }
    LifecycleStatus::ALL
        .into_iter()
        .zip(counts)
        .map(|(status, count)| StatusCount { status, count })
        .collect()
}

fn hours_where(logs: &[WorkLog], keep: impl Fn(&WorkLog) -> bool) -> f64 {
    let minutes: u64 = logs
        .iter()
        .filter(|log| keep(log))
        .map(|log| u64::from(log.hours.minutes()))
        .sum();
    minutes as f64 / 60.0
}

/// Rows feeding the dashboard, already restricted to the actor's scope.
pub struct DashboardRows<'a> {
    pub total_volunteers: u64,
    pub projects: &'a [Project],
    pub activities: &'a [Activity],
    pub month_logs: &'a [WorkLog],
    pub pending_work_logs: u64,
}

pub fn dashboard(rows: DashboardRows<'_>, today: NaiveDate) -> DashboardStats {
    DashboardStats {
        total_volunteers: rows.total_volunteers,
        upcoming_activities: rows
            .activities
            .iter()
            .filter(|a| a.date >= today)
            .count() as u64,
        hours_this_month: round_one_decimal(hours_where(rows.month_logs, |log| {
            log.status != WorkLogStatus::Cancelled
        })),
        approved_hours_this_month: round_one_decimal(hours_where(rows.month_logs, |log| {
            log.status == WorkLogStatus::Approved
        })),
        pending_work_logs: rows.pending_work_logs,
        projects_by_status: status_breakdown(rows.projects.iter().map(|p| p.status)),
    }
}

/// Aggregate activities together with the work logs recorded against them.
///
/// `memberships` must cover the projects owning `activities`; volunteers are
/// counted once across projects.
pub fn activity_stats(
    activities: &[Activity],
    logs: &[WorkLog],
    memberships: &[Membership],
    today: NaiveDate,
) -> ActivityStats {
    let activity_ids: HashSet<Uuid> = activities.iter().map(|a| a.id).collect();
    let project_ids: HashSet<Uuid> = activities.iter().map(|a| a.project_id).collect();

    let approved: Vec<&WorkLog> = logs
        .iter()
        .filter(|log| log.status == WorkLogStatus::Approved)
        .filter(|log| log.activity_id.is_some_and(|id| activity_ids.contains(&id)))
        .collect();
    let approved_minutes: u64 = approved.iter().map(|l| u64::from(l.hours.minutes())).sum();
    let total_approved_hours = approved_minutes as f64 / 60.0;
    let average_approved_hours = if approved.is_empty() {
        0.0
    } else {
        total_approved_hours / approved.len() as f64
    };

    let unique_volunteers: HashSet<Uuid> = memberships
        .iter()
        .filter(|m| project_ids.contains(&m.project_id))
        .map(|m| m.user_id)
        .collect();

    ActivityStats {
        total: activities.len() as u64,
        by_status: status_breakdown(activities.iter().map(|a| a.status)),
        upcoming: activities.iter().filter(|a| a.date >= today).count() as u64,
        approved_logs: approved.len() as u64,
        total_approved_hours: round_one_decimal(total_approved_hours),
        average_approved_hours: round_one_decimal(average_approved_hours),
        unique_volunteers: unique_volunteers.len() as u64,
    }
}
