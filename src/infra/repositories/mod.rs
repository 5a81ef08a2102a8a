//! Repository layer - Data access abstraction
//!
//! One trait per aggregate plus a SeaORM store bound to a
//! `DatabaseTransaction`. Stores are only ever created by the unit of work,
//! so every call made while serving a request shares one transaction.

mod activity_repository;
mod document_repository;
pub(crate) mod entities;
mod notification_repository;
mod project_repository;
mod skill_repository;
mod token_repository;
mod user_repository;
mod work_log_repository;

pub use activity_repository::{ActivityRepository, ActivityStore};
pub use document_repository::{DocumentRepository, DocumentStore};
pub use notification_repository::{NotificationRepository, NotificationStore};
pub use project_repository::{ProjectRepository, ProjectStore};
pub use skill_repository::{SkillRepository, SkillStore};
pub use token_repository::{TokenRepository, TokenStore};
pub use user_repository::{UserRepository, UserStore};
pub use work_log_repository::{WorkLogRepository, WorkLogStore};

// Export mocks for tests (both unit and integration)
#[cfg(any(test, feature = "test-utils"))]
pub use activity_repository::MockActivityRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use document_repository::MockDocumentRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use notification_repository::MockNotificationRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use project_repository::MockProjectRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use skill_repository::MockSkillRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use token_repository::MockTokenRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use user_repository::MockUserRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use work_log_repository::MockWorkLogRepository;
