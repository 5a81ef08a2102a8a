//! Application services layer - Use cases and business logic.
//!
//! Services take the acting user explicitly, run every multi-step mutation
//! inside one unit-of-work transaction and log state changes after commit.

mod activity_service;
mod auth_service;
pub mod container;
mod dashboard_service;
mod document_service;
mod email_service;
mod notification_service;
mod project_service;
mod scope;
mod skill_service;
mod user_service;
mod work_log_service;

// Service Container
pub use container::{ServiceContainer, Services};

// Service traits and implementations
pub use activity_service::{ActivityPlanner, ActivityService};
pub use auth_service::{
    AuthService, Authenticator, Claims, LoginResponse, Profile, Registration, TokenResponse,
};
pub use dashboard_service::{DashboardReporter, DashboardService};
pub use document_service::{DocumentArchive, DocumentService};
pub use email_service::{
    Delivery, EmailDispatcher, EmailService, Mailer, QueueDispatcher, SpawnDispatcher,
};
pub use notification_service::{NotificationCenter, NotificationService};
pub use project_service::{ProjectOffice, ProjectService};
pub use skill_service::{SkillCatalog, SkillService};
pub use user_service::{UserManager, UserService};
pub use work_log_service::{WorkLogLedger, WorkLogService};

#[cfg(any(test, feature = "test-utils"))]
pub use container::MockServiceContainer;
#[cfg(any(test, feature = "test-utils"))]
pub use email_service::{MockEmailDispatcher, MockEmailService};
