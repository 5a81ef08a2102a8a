//! Unit of Work pattern implementation.
//!
//! Every service operation runs inside one closure handed to
//! [`UnitOfWork::transaction`] (read-write) or [`UnitOfWork::read`]
//! (read-only). The closure receives a [`TransactionContext`] whose
//! repositories are all bound to the same database transaction, which is
//! committed when the closure returns `Ok` and rolled back otherwise.

use async_trait::async_trait;
use futures::future::BoxFuture;
use sea_orm::{
    AccessMode, DatabaseConnection, DatabaseTransaction, IsolationLevel, TransactionTrait,
};

use super::repositories::{
    ActivityRepository, ActivityStore, DocumentRepository, DocumentStore, NotificationRepository,
    NotificationStore, ProjectRepository, ProjectStore, SkillRepository, SkillStore,
    TokenRepository, TokenStore, UserRepository, UserStore, WorkLogRepository, WorkLogStore,
};
use crate::errors::{AppError, AppResult};

/// Future returned by a unit-of-work closure.
pub type TxFuture<'a, T> = BoxFuture<'a, AppResult<T>>;

/// The repository set visible inside one transaction.
pub trait Repositories: Send + Sync {
    fn users(&self) -> &dyn UserRepository;
    fn projects(&self) -> &dyn ProjectRepository;
    fn activities(&self) -> &dyn ActivityRepository;
    fn work_logs(&self) -> &dyn WorkLogRepository;
    fn skills(&self) -> &dyn SkillRepository;
    fn documents(&self) -> &dyn DocumentRepository;
    fn notifications(&self) -> &dyn NotificationRepository;
    fn tokens(&self) -> &dyn TokenRepository;
}

/// Unit of Work trait for dependency injection.
///
/// Not object safe because of the generic methods; services are generic over
/// it instead.
#[async_trait]
pub trait UnitOfWork: Send + Sync + 'static {
    /// Run `f` in a read-write transaction (read committed).
    async fn transaction<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> TxFuture<'a, T> + Send,
        T: Send;

    /// Run `f` in a read-only transaction.
    async fn read<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> TxFuture<'a, T> + Send,
        T: Send;
}

/// Repository access within a transaction.
#[derive(Clone, Copy)]
pub struct TransactionContext<'a> {
    repos: &'a dyn Repositories,
}

impl<'a> TransactionContext<'a> {
    pub fn new(repos: &'a dyn Repositories) -> Self {
        Self { repos }
    }

    pub fn users(&self) -> &'a dyn UserRepository {
        self.repos.users()
    }

    pub fn projects(&self) -> &'a dyn ProjectRepository {
        self.repos.projects()
    }

    pub fn activities(&self) -> &'a dyn ActivityRepository {
        self.repos.activities()
    }

    pub fn work_logs(&self) -> &'a dyn WorkLogRepository {
        self.repos.work_logs()
    }

    pub fn skills(&self) -> &'a dyn SkillRepository {
        self.repos.skills()
    }

    pub fn documents(&self) -> &'a dyn DocumentRepository {
        self.repos.documents()
    }

    pub fn notifications(&self) -> &'a dyn NotificationRepository {
        self.repos.notifications()
    }

    pub fn tokens(&self) -> &'a dyn TokenRepository {
        self.repos.tokens()
    }
}

/// SeaORM stores sharing one `DatabaseTransaction`.
pub struct SqlRepositories<'a> {
    users: UserStore<'a>,
    projects: ProjectStore<'a>,
    activities: ActivityStore<'a>,
    work_logs: WorkLogStore<'a>,
    skills: SkillStore<'a>,
    documents: DocumentStore<'a>,
    notifications: NotificationStore<'a>,
    tokens: TokenStore<'a>,
}

impl<'a> SqlRepositories<'a> {
    pub fn new(txn: &'a DatabaseTransaction) -> Self {
        Self {
            users: UserStore::new(txn),
            projects: ProjectStore::new(txn),
            activities: ActivityStore::new(txn),
            work_logs: WorkLogStore::new(txn),
            skills: SkillStore::new(txn),
            documents: DocumentStore::new(txn),
            notifications: NotificationStore::new(txn),
            tokens: TokenStore::new(txn),
        }
    }
}

impl Repositories for SqlRepositories<'_> {
    fn users(&self) -> &dyn UserRepository {
        &self.users
    }

    fn projects(&self) -> &dyn ProjectRepository {
        &self.projects
    }

    fn activities(&self) -> &dyn ActivityRepository {
        &self.activities
    }

    fn work_logs(&self) -> &dyn WorkLogRepository {
        &self.work_logs
    }

    fn skills(&self) -> &dyn SkillRepository {
        &self.skills
    }

    fn documents(&self) -> &dyn DocumentRepository {
        &self.documents
    }

    fn notifications(&self) -> &dyn NotificationRepository {
        &self.notifications
    }

    fn tokens(&self) -> &dyn TokenRepository {
        &self.tokens
    }
}

/// Concrete implementation of UnitOfWork
pub struct Persistence {
    db: DatabaseConnection,
}

impl Persistence {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn execute<F, T>(&self, access: AccessMode, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> TxFuture<'a, T> + Send,
        T: Send,
    {
        let txn = self
            .db
            .begin_with_config(Some(IsolationLevel::ReadCommitted), Some(access))
            .await
            .map_err(AppError::from)?;

        let outcome = {
            let repos = SqlRepositories::new(&txn);
            f(TransactionContext::new(&repos)).await
        };

        match outcome {
            Ok(result) => {
                txn.commit().await.map_err(AppError::from)?;
                Ok(result)
            }
            Err(e) => {
                if let Err(rollback_err) = txn.rollback().await {
                    tracing::error!("Transaction rollback failed: {}", rollback_err);
                }
                Err(e)
            }
        }
    }
}

#[async_trait]
impl UnitOfWork for Persistence {
    async fn transaction<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> TxFuture<'a, T> + Send,
        T: Send,
    {
        self.execute(AccessMode::ReadWrite, f).await
    }

    async fn read<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> TxFuture<'a, T> + Send,
        T: Send,
    {
        self.execute(AccessMode::ReadOnly, f).await
    }
}
