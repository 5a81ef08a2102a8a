//! Infrastructure layer - External systems integration
//!
//! - Database connection, migrations and repositories
//! - Unit of Work for transaction management
//! - Rate limiting (Redis or in-process)
//! - Uploaded file storage

pub mod cache;
pub mod db;
pub mod rate_limit;
pub mod repositories;
pub mod storage;
pub mod unit_of_work;

pub use cache::Cache;
pub use db::{Database, Migrator};
pub use rate_limit::{InMemoryRateLimiter, RateLimiter};
pub use repositories::{
    ActivityRepository, DocumentRepository, NotificationRepository, ProjectRepository,
    SkillRepository, TokenRepository, UserRepository, WorkLogRepository,
};
pub use storage::{FileStore, LocalFileStore};
pub use unit_of_work::{
    Persistence, Repositories, SqlRepositories, TransactionContext, TxFuture, UnitOfWork,
};

#[cfg(any(test, feature = "test-utils"))]
pub use rate_limit::MockRateLimiter;
#[cfg(any(test, feature = "test-utils"))]
pub use storage::MockFileStore;
