//! Application state - Dependency injection container.

use std::sync::Arc;

use crate::config::Config;
use crate::infra::{Database, FileStore, RateLimiter};
use crate::services::{EmailService, ServiceContainer, Services};

/// Shared state handed to every handler and middleware.
#[derive(Clone)]
pub struct AppState {
    pub services: Arc<dyn ServiceContainer>,
    /// Limiter behind the HTTP rate-limit middleware.
    pub rate_limiter: Arc<dyn RateLimiter>,
    /// Present when backed by a real database; the health check pings it.
    pub database: Option<Arc<Database>>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire the SeaORM-backed services around `database`.
    pub fn from_config(
        database: Arc<Database>,
        rate_limiter: Arc<dyn RateLimiter>,
        email: Arc<dyn EmailService>,
        files: Arc<dyn FileStore>,
        config: Config,
    ) -> Self {
        let services = Services::from_connection(
            database.get_connection(),
            config.clone(),
            email,
            files,
        );
        Self {
            services: Arc::new(services),
            rate_limiter,
            database: Some(database),
            config: Arc::new(config),
        }
    }

    /// State over already built services, without a database handle.
    pub fn new(
        services: Arc<dyn ServiceContainer>,
        rate_limiter: Arc<dyn RateLimiter>,
        config: Config,
    ) -> Self {
        Self {
            services,
            rate_limiter,
            database: None,
            config: Arc::new(config),
        }
    }
}
