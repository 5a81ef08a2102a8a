//! Centralized error handling.
//!
//! Services raise a specific kind with a human-readable message; this module is
//! the single translation point from kind to HTTP status and JSON body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use once_cell::sync::OnceCell;
use sea_orm::{DbErr, SqlErr};
use serde::Serialize;
use thiserror::Error;

static EXPOSE_INTERNAL: OnceCell<bool> = OnceCell::new();

/// Allow internal error details in responses (development only).
///
/// Only the first call has an effect.
pub fn expose_internal_errors(expose: bool) {
    let _ = EXPOSE_INTERNAL.set(expose);
}

fn internal_details_exposed() -> bool {
    EXPOSE_INTERNAL.get().copied().unwrap_or(false)
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication & Authorization
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("{0}")]
    Forbidden(String),

    // Resource errors
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    // Validation
    #[error("{}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("{0}")]
    BadRequest(String),

    // External service errors
    #[error("Database error: {0}")]
    Database(DbErr),

    #[error("Authentication error")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    // Internal
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => {
                tracing::debug!(detail = %detail, "Unique constraint violated");
                AppError::Conflict("Duplicated entry".to_string())
            }
            Some(SqlErr::ForeignKeyConstraintViolation(detail)) => {
                tracing::debug!(detail = %detail, "Foreign key constraint violated");
                AppError::BadRequest("Referenced resource does not exist".to_string())
            }
            _ => AppError::Database(err),
        }
    }
}

/// Error response body: a single message or one message per invalid field.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ErrorMessage {
    Single(String),
    Many(Vec<String>),
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorMessage,
}

impl AppError {
    /// Get HTTP status code
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized | AppError::InvalidCredentials | AppError::Jwt(_) => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get user-facing message (hides internal details outside development)
    fn user_message(self) -> ErrorMessage {
        match self {
            AppError::Validation(messages) => ErrorMessage::Many(messages),
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                ErrorMessage::Single(if internal_details_exposed() {
                    e.to_string()
                } else {
                    "A database error occurred".to_string()
                })
            }
            AppError::Jwt(e) => {
                tracing::debug!("JWT error: {:?}", e);
                ErrorMessage::Single("Invalid or expired token".to_string())
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                ErrorMessage::Single(if internal_details_exposed() {
                    msg
                } else {
                    "An internal error occurred".to_string()
                })
            }
            other => ErrorMessage::Single(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            error: self.user_message(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

/// Extension trait for Option -> AppError conversion
pub trait OptionExt<T> {
    /// Convert `None` into `NotFound("<entity> not found")`.
    fn ok_or_not_found(self, entity: &str) -> AppResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self, entity: &str) -> AppResult<T> {
        self.ok_or_else(|| AppError::NotFound(format!("{} not found", entity)))
    }
}

/// Convenience constructors
impl AppError {
    pub fn forbidden(msg: impl Into<String>) -> Self {
        AppError::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        AppError::Conflict(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        AppError::BadRequest(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(vec![msg.into()])
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn single_message_body() {
        let (status, body) = body_json(AppError::not_found("Project not found")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, serde_json::json!({ "error": "Project not found" }));
    }

    #[tokio::test]
    async fn validation_errors_render_as_array() {
        let err = AppError::Validation(vec!["Name is required".into(), "Invalid email".into()]);
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            serde_json::json!({ "error": ["Name is required", "Invalid email"] })
        );
    }

    #[tokio::test]
    async fn internal_errors_are_sanitized() {
        let (status, body) = body_json(AppError::internal("pool exhausted at 10.0.0.3")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "An internal error occurred");
    }

    #[test]
    fn status_mapping() {
        assert_eq!(AppError::forbidden("x").status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::conflict("x").status(), StatusCode::CONFLICT);
        assert_eq!(AppError::bad_request("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::InvalidCredentials.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn option_ext_formats_entity() {
        let missing: Option<u8> = None;
        match missing.ok_or_not_found("Activity") {
            Err(AppError::NotFound(msg)) => assert_eq!(msg, "Activity not found"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
