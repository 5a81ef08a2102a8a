//! Outbound e-mail: composition, per-recipient throttling and dispatch.
//!
//! Callers never fail a request because of e-mail. They log the returned
//! error and carry on.

use apalis::prelude::Storage;
use apalis_sql::postgres::PostgresStorage;
use apalis_sql::sqlx::postgres::PgPoolOptions;
use async_trait::async_trait;
use std::sync::Arc;
use validator::ValidateEmail;

use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::infra::RateLimiter;
use crate::jobs::{email_job_handler, EmailJob};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// What happened to a message handed to the mailer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Dispatched,
    /// Dropped because the recipient hit the e-mail rate limit.
    Throttled,
}

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait EmailService: Send + Sync {
    /// Welcome message carrying the set-password link for a new account.
    async fn send_welcome(&self, to: &str, name: &str, token: &str) -> AppResult<Delivery>;

    async fn send_password_reset(&self, to: &str, name: &str, token: &str) -> AppResult<Delivery>;
}

/// Hands a composed job to whatever actually delivers it.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait EmailDispatcher: Send + Sync {
    async fn dispatch(&self, job: EmailJob) -> AppResult<()>;
}

/// Runs the job handler on a detached task. Failures are only logged.
#[derive(Debug, Default, Clone, Copy)]
pub struct SpawnDispatcher;

#[async_trait]
impl EmailDispatcher for SpawnDispatcher {
    async fn dispatch(&self, job: EmailJob) -> AppResult<()> {
        tokio::spawn(async move {
            let to = job.to.clone();
            if let Err(e) = email_job_handler(job).await {
                tracing::error!(to = %to, error = %e, "E-mail delivery failed");
            }
        });
        Ok(())
    }
}

/// Pushes jobs to the apalis Postgres queue consumed by `jobs work`.
#[derive(Clone)]
pub struct QueueDispatcher {
    storage: PostgresStorage<EmailJob>,
}

impl QueueDispatcher {
    pub fn new(storage: PostgresStorage<EmailJob>) -> Self {
        Self { storage }
    }

    /// Open a pool for the queue and create the apalis tables if needed.
    pub async fn connect(database_url: &str) -> AppResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect(database_url)
            .await
            .map_err(|e| AppError::internal(format!("Failed to connect job queue: {}", e)))?;
        PostgresStorage::setup(&pool)
            .await
            .map_err(|e| AppError::internal(format!("Failed to setup job storage: {}", e)))?;
        Ok(Self::new(PostgresStorage::new(pool)))
    }
}

#[async_trait]
impl EmailDispatcher for QueueDispatcher {
    async fn dispatch(&self, job: EmailJob) -> AppResult<()> {
        let mut storage = self.storage.clone();
        storage
            .push(job)
            .await
            .map_err(|e| AppError::internal(format!("Failed to queue e-mail: {}", e)))?;
        Ok(())
    }
}

/// [`EmailService`] backed by a dispatcher and a recipient rate limiter.
pub struct Mailer {
    dispatcher: Arc<dyn EmailDispatcher>,
    limiter: Arc<dyn RateLimiter>,
    frontend_url: String,
    max_per_window: u64,
    window_seconds: u64,
}

impl Mailer {
    pub fn new(
        dispatcher: Arc<dyn EmailDispatcher>,
        limiter: Arc<dyn RateLimiter>,
        config: &Config,
    ) -> Self {
        Self {
            dispatcher,
            limiter,
            frontend_url: config.frontend_url.clone(),
            max_per_window: config.email_rate_limit_max,
            window_seconds: config.email_rate_limit_window_seconds,
        }
    }

    fn reset_link(&self, token: &str) -> String {
        format!("{}/reset-password?token={}", self.frontend_url, token)
    }

    async fn send(&self, to: &str, subject: &str, body: String) -> AppResult<Delivery> {
        let address = to.trim().to_string();
        if !address.validate_email() {
            return Err(AppError::bad_request("Invalid recipient e-mail address"));
        }

        let key = format!("email:{}", address.to_lowercase());
        let (sent, allowed) = self
            .limiter
            .hit(&key, self.max_per_window, self.window_seconds)
            .await?;
        if !allowed {
            tracing::warn!(to = %address, sent, "E-mail rate limit reached, message dropped");
            return Ok(Delivery::Throttled);
        }

        self.dispatcher
            .dispatch(EmailJob::new(address, sanitize_subject(subject), body))
            .await?;
        Ok(Delivery::Dispatched)
    }
}

#[async_trait]
impl EmailService for Mailer {
    async fn send_welcome(&self, to: &str, name: &str, token: &str) -> AppResult<Delivery> {
        let body = format!(
            "Hello {name},\n\n\
             An account has been created for you on Voluntalia.\n\
             Choose your password here (the link is valid for 72 hours):\n\n\
             {link}\n\n\
             See you soon!",
            name = name,
            link = self.reset_link(token)
        );
        self.send(to, "Welcome to Voluntalia", body).await
    }

    async fn send_password_reset(&self, to: &str, name: &str, token: &str) -> AppResult<Delivery> {
        let body = format!(
            "Hello {name},\n\n\
             We received a request to reset your Voluntalia password.\n\
             Use this link to choose a new one:\n\n\
             {link}\n\n\
             If you did not ask for this, you can ignore this message.",
            name = name,
            link = self.reset_link(token)
        );
        self.send(to, "Reset your Voluntalia password", body).await
    }
}

/// Drop control characters so a subject cannot inject extra headers.
fn sanitize_subject(subject: &str) -> String {
    subject
        .chars()
        .filter(|c| !c.is_control())
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{InMemoryRateLimiter, MockRateLimiter};

    fn config() -> Config {
        let mut config = Config::new("a".repeat(32), "b".repeat(32));
        config.frontend_url = "https://app.voluntalia.org".into();
        config.email_rate_limit_max = 2;
        config
    }

    #[test]
    fn subject_loses_control_characters() {
        assert_eq!(sanitize_subject("Hi\r\nBcc: evil@x.org"), "HiBcc: evil@x.org");
        assert_eq!(sanitize_subject("  Plain  "), "Plain");
    }

    #[tokio::test]
    async fn reset_mail_links_to_frontend() {
        let mut dispatcher = MockEmailDispatcher::new();
        dispatcher
            .expect_dispatch()
            .withf(|job| {
                job.to == "ada@example.org"
                    && job
                        .body
                        .contains("https://app.voluntalia.org/reset-password?token=tok123")
            })
            .times(1)
            .returning(|_| Ok(()));

        let mailer = Mailer::new(
            Arc::new(dispatcher),
            Arc::new(InMemoryRateLimiter::new()),
            &config(),
        );
        let outcome = mailer
            .send_password_reset("ada@example.org", "Ada", "tok123")
            .await
            .unwrap();
        assert_eq!(outcome, Delivery::Dispatched);
    }

    #[tokio::test]
    async fn recipients_are_throttled_per_address() {
        let mut dispatcher = MockEmailDispatcher::new();
        dispatcher.expect_dispatch().times(2).returning(|_| Ok(()));

        let mailer = Mailer::new(
            Arc::new(dispatcher),
            Arc::new(InMemoryRateLimiter::new()),
            &config(),
        );
        for _ in 0..2 {
            assert_eq!(
                mailer.send_welcome("ada@example.org", "Ada", "t").await.unwrap(),
                Delivery::Dispatched
            );
        }
        assert_eq!(
            mailer.send_welcome("ADA@example.org", "Ada", "t").await.unwrap(),
            Delivery::Throttled
        );
    }

    #[tokio::test]
    async fn invalid_recipient_is_rejected_before_the_limiter() {
        let mut limiter = MockRateLimiter::new();
        limiter.expect_hit().never();
        let mut dispatcher = MockEmailDispatcher::new();
        dispatcher.expect_dispatch().never();

        let mailer = Mailer::new(Arc::new(dispatcher), Arc::new(limiter), &config());
        let err = mailer.send_welcome("not-an-email", "Ada", "t").await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn limiter_key_is_lowercased() {
        let mut limiter = MockRateLimiter::new();
        limiter
            .expect_hit()
            .withf(|key, max, _| key == "email:ada@example.org" && *max == 2)
            .times(1)
            .returning(|_, _, _| Ok((1, true)));
        let mut dispatcher = MockEmailDispatcher::new();
        dispatcher.expect_dispatch().times(1).returning(|_| Ok(()));

        let mailer = Mailer::new(Arc::new(dispatcher), Arc::new(limiter), &config());
        mailer.send_welcome("Ada@Example.org", "Ada", "t").await.unwrap();
    }
}
