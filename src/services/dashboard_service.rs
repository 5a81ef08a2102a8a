use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use super::scope::visibility_for;
use crate::domain::stats::{dashboard, month_bounds, DashboardRows};
use crate::domain::{
    ActivityQuery, Actor, DashboardStats, Role, Visibility, WorkLogQuery, WorkLogStatus,
};
use crate::errors::AppResult;
use crate::infra::UnitOfWork;

#[async_trait]
pub trait DashboardService: Send + Sync {
    /// Headline numbers restricted to the projects the actor can see.
    async fn stats(&self, actor: Actor) -> AppResult<DashboardStats>;
}

pub struct DashboardReporter<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> DashboardReporter<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl<U: UnitOfWork> DashboardService for DashboardReporter<U> {
    async fn stats(&self, actor: Actor) -> AppResult<DashboardStats> {
        let today = Utc::now().date_naive();
        let (month_start, next_month) = month_bounds(today);

        self.uow
            .read(move |tx| {
                Box::pin(async move {
                    let scope = visibility_for(tx, &actor).await?;
                    let project_ids = scope.project_ids();

                    let projects = tx.projects().list(project_ids.clone()).await?;
                    let activities = tx
                        .activities()
                        .list(ActivityQuery {
                            project_ids: project_ids.clone(),
                            ..Default::default()
                        })
                        .await?;

                    // Active VOLUNTEER-role users, everywhere or as members in scope.
                    let total_volunteers = match &scope {
                        Visibility::All => tx.users().count_active_by_role(Role::Volunteer).await?,
                        Visibility::Projects(_) => tx
                            .projects()
                            .volunteer_memberships(project_ids)
                            .await?
                            .into_iter()
                            .map(|m| m.user_id)
                            .collect::<HashSet<Uuid>>()
                            .len() as u64,
                    };

                    // Everything for coordinators, else logs on visible activities.
                    let activity_ids = match scope {
                        Visibility::All => None,
                        Visibility::Projects(_) => {
                            Some(activities.iter().map(|a| a.id).collect::<Vec<_>>())
                        }
                    };
                    let month_logs = tx
                        .work_logs()
                        .find(WorkLogQuery {
                            activity_ids: activity_ids.clone(),
                            week_from: Some(month_start),
                            week_to: Some(next_month),
                            ..Default::default()
                        })
                        .await?;
                    let pending_work_logs = tx
                        .work_logs()
                        .count(WorkLogQuery {
                            activity_ids,
                            status: Some(WorkLogStatus::Pending),
                            ..Default::default()
                        })
                        .await?;

                    Ok(dashboard(
                        DashboardRows {
                            total_volunteers,
                            projects: &projects,
                            activities: &activities,
                            month_logs: &month_logs,
                            pending_work_logs,
                        },
                        today,
                    ))
                })
            })
            .await
    }
}
