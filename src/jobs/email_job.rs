//! Outbound e-mail job.
//!
//! The same handler runs in-process (spawned by the mailer) or inside the
//! apalis worker started by `jobs work`. Without `SMTP_HOST` the message is
//! written to the log instead of being delivered.

use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use serde::{Deserialize, Serialize};
use std::env;

use crate::errors::{AppError, AppResult};

/// Email job payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailJob {
    pub to: String,
    pub subject: String,
    /// Plain-text body
    pub body: String,
}

impl EmailJob {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
        }
    }
}

struct SmtpSettings {
    host: Option<String>,
    port: u16,
    user: Option<String>,
    pass: Option<String>,
    from: String,
    starttls: bool,
}

impl SmtpSettings {
    fn from_env() -> Self {
        Self {
            host: env::var("SMTP_HOST").ok().filter(|h| !h.is_empty()),
            port: env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(587),
            user: env::var("SMTP_USER").ok(),
            pass: env::var("SMTP_PASS").ok(),
            from: env::var("SMTP_FROM").unwrap_or_else(|_| "Voluntalia <noreply@voluntalia.org>".to_string()),
            starttls: env::var("SMTP_TLS")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(true),
        }
    }

    fn transport(&self, host: &str) -> AppResult<AsyncSmtpTransport<Tokio1Executor>> {
        let mut builder = if self.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .map_err(|e| AppError::internal(format!("SMTP relay setup failed: {}", e)))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
        };
        builder = builder.port(self.port);
        if let (Some(user), Some(pass)) = (&self.user, &self.pass) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }
        Ok(builder.build())
    }
}

fn build_message(job: &EmailJob, from: &str) -> AppResult<Message> {
    let from: Mailbox = from
        .parse()
        .map_err(|e| AppError::internal(format!("Invalid SMTP_FROM address: {}", e)))?;
    let to: Mailbox = job
        .to
        .parse()
        .map_err(|e| AppError::bad_request(format!("Invalid recipient address: {}", e)))?;

    Message::builder()
        .from(from)
        .to(to)
        .subject(job.subject.as_str())
        .header(ContentType::TEXT_PLAIN)
        .body(job.body.clone())
        .map_err(|e| AppError::internal(format!("Failed to build e-mail: {}", e)))
}

/// Deliver one e-mail.
pub async fn email_job_handler(job: EmailJob) -> Result<(), AppError> {
    let smtp = SmtpSettings::from_env();

    tracing::info!(to = %job.to, subject = %job.subject, "Processing email job");

    let Some(host) = smtp.host.as_deref() else {
        tracing::info!(
            "SMTP not configured, logging e-mail\nFrom: {}\nTo: {}\nSubject: {}\n\n{}",
            smtp.from,
            job.to,
            job.subject,
            job.body
        );
        return Ok(());
    };

    let message = build_message(&job, &smtp.from)?;
    smtp.transport(host)?
        .send(message)
        .await
        .map_err(|e| AppError::internal(format!("SMTP delivery failed: {}", e)))?;

    tracing::info!(to = %job.to, "Email delivered");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_requires_valid_addresses() {
        let job = EmailJob::new("ada@example.org", "Hello", "Body");
        assert!(build_message(&job, "Voluntalia <noreply@voluntalia.org>").is_ok());

        let bad = EmailJob::new("not an address", "Hello", "Body");
        assert!(matches!(
            build_message(&bad, "noreply@voluntalia.org"),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn job_serializes_for_the_queue() {
        let job = EmailJob::new("ada@example.org", "Hi", "Body");
        let json = serde_json::to_string(&job).unwrap();
        assert_eq!(serde_json::from_str::<EmailJob>(&json).unwrap(), job);
    }
}
