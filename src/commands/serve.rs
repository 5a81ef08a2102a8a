//! Serve command - Starts the HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;

use crate::api::{create_router, AppState};
use crate::cli::args::ServeArgs;
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::infra::{Cache, Database, FileStore, InMemoryRateLimiter, LocalFileStore, RateLimiter};
use crate::services::{EmailDispatcher, Mailer, QueueDispatcher, SpawnDispatcher};

/// Execute the serve command
pub async fn execute(args: ServeArgs, mut config: Config) -> AppResult<()> {
    if let Some(host) = args.host {
        config.server_host = host;
    }
    if let Some(port) = args.port {
        config.server_port = port;
    }
    tracing::info!("Starting server...");

    let database = if args.no_migrate {
        Database::connect_without_migrations(&config).await?
    } else {
        Database::connect(&config).await?
    };
    let database = Arc::new(database);

    let rate_limiter = rate_limiter(&config).await;

    let dispatcher: Arc<dyn EmailDispatcher> = if config.email_queue {
        tracing::info!("E-mail routed through the job queue");
        Arc::new(QueueDispatcher::connect(&config.database_url).await?)
    } else {
        Arc::new(SpawnDispatcher)
    };
    let mailer = Arc::new(Mailer::new(dispatcher, rate_limiter.clone(), &config));

    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .map_err(|e| {
            AppError::internal(format!(
                "Failed to create upload directory {}: {}",
                config.upload_dir.display(),
                e
            ))
        })?;
    let files: Arc<dyn FileStore> = Arc::new(LocalFileStore::new(config.upload_dir.clone()));

    let addr = config.server_addr();
    let app_state = AppState::from_config(database, rate_limiter, mailer, files, config);
    let app = create_router(app_state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind to {}: {}", addr, e)))?;

    tracing::info!("Server running on http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Redis when reachable, otherwise a process-local limiter.
async fn rate_limiter(config: &Config) -> Arc<dyn RateLimiter> {
    match Cache::try_connect(&config.redis_url).await {
        Ok(cache) => {
            tracing::info!("Redis rate limiter connected");
            Arc::new(cache)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Redis unavailable, using in-memory rate limiter");
            Arc::new(InMemoryRateLimiter::new())
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
