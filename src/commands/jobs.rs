//! Jobs command - the e-mail delivery queue.
//!
//! `serve` pushes e-mails to the apalis Postgres queue when `EMAIL_QUEUE=postgres`.
//! `jobs work` delivers them; `list` and `clear` inspect and prune the queue.

use sea_orm::{ConnectionTrait, Database as SeaDatabase, DatabaseBackend, DatabaseConnection, Statement};

use crate::cli::args::{JobsAction, JobsArgs};
use crate::config::{Config, JOB_NAME_EMAIL};
use crate::errors::{AppError, AppResult};

/// Execute the jobs command
pub async fn execute(args: JobsArgs, config: Config) -> AppResult<()> {
    match args.action {
        JobsAction::Work => run_worker(&config).await,
        JobsAction::List => list_jobs(&config).await,
        JobsAction::Clear => clear_failed_jobs(&config).await,
    }
}

/// Consume queued e-mails until Ctrl+C.
async fn run_worker(config: &Config) -> AppResult<()> {
    use apalis::prelude::*;
    use apalis_sql::postgres::PostgresStorage;
    use apalis_sql::sqlx::postgres::PgPoolOptions;

    use crate::jobs::{email_job_handler, EmailJob};

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .map_err(|e| AppError::internal(format!("Failed to connect job queue: {}", e)))?;

    PostgresStorage::setup(&pool)
        .await
        .map_err(|e| AppError::internal(format!("Failed to setup job storage: {}", e)))?;

    let storage: PostgresStorage<EmailJob> = PostgresStorage::new(pool);

    let worker = WorkerBuilder::new(JOB_NAME_EMAIL)
        .backend(storage)
        .build_fn(email_job_handler);
    let monitor = Monitor::new().register(worker);

    tracing::info!(worker = JOB_NAME_EMAIL, "E-mail worker started, Ctrl+C to stop");

    tokio::select! {
        result = monitor.run() => {
            if let Err(e) = result {
                tracing::error!(error = %e, "E-mail worker crashed");
                return Err(AppError::internal(format!("Worker failed: {}", e)));
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received, stopping worker");
        }
    }

    tracing::info!("E-mail worker stopped");
    Ok(())
}

async fn connect(config: &Config) -> AppResult<DatabaseConnection> {
    SeaDatabase::connect(&config.database_url)
        .await
        .map_err(|e| AppError::internal(format!("Failed to connect to database: {}", e)))
}

/// Whether `jobs work` (or a queued `serve`) has created the apalis schema yet.
async fn queue_initialized(db: &DatabaseConnection) -> AppResult<bool> {
    let row = db
        .query_one(Statement::from_string(
            DatabaseBackend::Postgres,
            "SELECT EXISTS(SELECT 1 FROM information_schema.schemata WHERE schema_name = 'apalis') AS exists",
        ))
        .await?;
    Ok(row
        .and_then(|r| r.try_get::<bool>("", "exists").ok())
        .unwrap_or(false))
}

async fn list_jobs(config: &Config) -> AppResult<()> {
    let db = connect(config).await?;
    if !queue_initialized(&db).await? {
        println!("E-mail queue not initialized. Run `voluntalia jobs work` to create it.");
        return Ok(());
    }

    let rows = db
        .query_all(Statement::from_string(
            DatabaseBackend::Postgres,
            "SELECT status::text AS status, COUNT(*)::bigint AS count \
             FROM apalis.jobs GROUP BY status ORDER BY status",
        ))
        .await?;

    println!("{:<10} {:>8}", "STATUS", "COUNT");
    let mut total = 0i64;
    for row in rows {
        let status: String = row.try_get("", "status")?;
        let count: i64 = row.try_get("", "count")?;
        total += count;
        println!("{:<10} {:>8}", status, count);
    }
    println!("{:<10} {:>8}", "total", total);
    Ok(())
}

async fn clear_failed_jobs(config: &Config) -> AppResult<()> {
    let db = connect(config).await?;
    if !queue_initialized(&db).await? {
        println!("E-mail queue not initialized. Nothing to clear.");
        return Ok(());
    }

    let result = db
        .execute(Statement::from_string(
            DatabaseBackend::Postgres,
            "DELETE FROM apalis.jobs WHERE status = 'Failed'",
        ))
        .await?;

    let cleared = result.rows_affected();
    tracing::info!(cleared, "Failed e-mail jobs removed");
    println!("Cleared {} failed e-mail job(s).", cleared);
    Ok(())
}
