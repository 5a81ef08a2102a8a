//! Service container handed to the HTTP layer.
//!
//! Handlers depend on the service traits only; [`Services`] wires the
//! concrete implementations around one shared unit of work.

use std::sync::Arc;

use super::{
    ActivityPlanner, ActivityService, AuthService, Authenticator, DashboardReporter,
    DashboardService, DocumentArchive, DocumentService, EmailService, NotificationCenter,
    NotificationService, ProjectOffice, ProjectService, SkillCatalog, SkillService, UserManager,
    UserService, WorkLogLedger, WorkLogService,
};
use crate::config::Config;
use crate::infra::{FileStore, Persistence, UnitOfWork};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Service container trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
pub trait ServiceContainer: Send + Sync {
    fn auth(&self) -> Arc<dyn AuthService>;

    fn users(&self) -> Arc<dyn UserService>;

    fn projects(&self) -> Arc<dyn ProjectService>;

    fn activities(&self) -> Arc<dyn ActivityService>;

    fn work_logs(&self) -> Arc<dyn WorkLogService>;

    fn skills(&self) -> Arc<dyn SkillService>;

    fn documents(&self) -> Arc<dyn DocumentService>;

    fn notifications(&self) -> Arc<dyn NotificationService>;

    fn dashboard(&self) -> Arc<dyn DashboardService>;
}

/// Concrete implementation of ServiceContainer
#[derive(Clone)]
pub struct Services {
    auth: Arc<dyn AuthService>,
    users: Arc<dyn UserService>,
    projects: Arc<dyn ProjectService>,
    activities: Arc<dyn ActivityService>,
    work_logs: Arc<dyn WorkLogService>,
    skills: Arc<dyn SkillService>,
    documents: Arc<dyn DocumentService>,
    notifications: Arc<dyn NotificationService>,
    dashboard: Arc<dyn DashboardService>,
}

impl Services {
    /// Build every service over the given unit of work.
    pub fn with_unit_of_work<U: UnitOfWork>(
        uow: Arc<U>,
        config: Config,
        email: Arc<dyn EmailService>,
        files: Arc<dyn FileStore>,
    ) -> Self {
        Self {
            auth: Arc::new(Authenticator::new(uow.clone(), email.clone(), config)),
            users: Arc::new(UserManager::new(uow.clone(), email)),
            projects: Arc::new(ProjectOffice::new(uow.clone())),
            activities: Arc::new(ActivityPlanner::new(uow.clone())),
            work_logs: Arc::new(WorkLogLedger::new(uow.clone())),
            skills: Arc::new(SkillCatalog::new(uow.clone())),
            documents: Arc::new(DocumentArchive::new(uow.clone(), files)),
            notifications: Arc::new(NotificationCenter::new(uow.clone())),
            dashboard: Arc::new(DashboardReporter::new(uow)),
        }
    }

    /// Create service container from database connection and config
    pub fn from_connection(
        db: sea_orm::DatabaseConnection,
        config: Config,
        email: Arc<dyn EmailService>,
        files: Arc<dyn FileStore>,
    ) -> Self {
        Self::with_unit_of_work(Arc::new(Persistence::new(db)), config, email, files)
    }
}

impl ServiceContainer for Services {
    fn auth(&self) -> Arc<dyn AuthService> {
        self.auth.clone()
    }

    fn users(&self) -> Arc<dyn UserService> {
        self.users.clone()
    }

    fn projects(&self) -> Arc<dyn ProjectService> {
        self.projects.clone()
    }

    fn activities(&self) -> Arc<dyn ActivityService> {
        self.activities.clone()
    }

    fn work_logs(&self) -> Arc<dyn WorkLogService> {
        self.work_logs.clone()
    }

    fn skills(&self) -> Arc<dyn SkillService> {
        self.skills.clone()
    }

    fn documents(&self) -> Arc<dyn DocumentService> {
        self.documents.clone()
    }

    fn notifications(&self) -> Arc<dyn NotificationService> {
        self.notifications.clone()
    }

    fn dashboard(&self) -> Arc<dyn DashboardService> {
        self.dashboard.clone()
    }
}
