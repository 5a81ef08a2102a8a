//! Banner and health check.

use axum::{extract::State, http::StatusCode, response::Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::AppState;

/// Root endpoint
#[utoipa::path(
    get,
    path = "/",
    tag = "Health",
    responses((status = 200, description = "Service banner", body = String))
)]
pub async fn root() -> &'static str {
    "Voluntalia API"
}

/// Health check response
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    #[schema(value_type = String, example = "healthy")]
    pub status: &'static str,
    pub services: ServiceHealth,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ServiceHealth {
    pub database: ServiceStatus,
    pub rate_limiter: ServiceStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ServiceStatus {
    #[schema(value_type = String, example = "healthy")]
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, example = "redis")]
    pub backend: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ServiceStatus {
    fn healthy(backend: Option<&'static str>) -> Self {
        Self {
            status: "healthy",
            backend,
            error: None,
        }
    }

    fn unhealthy(backend: Option<&'static str>, error: impl Into<String>) -> Self {
        Self {
            status: "unhealthy",
            backend,
            error: Some(error.into()),
        }
    }

    fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// Database and rate-limiter status; 503 when either is down
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "All dependencies reachable", body = HealthResponse),
        (status = 503, description = "Degraded", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database = match &state.database {
        Some(db) => match db.ping().await {
            Ok(()) => ServiceStatus::healthy(None),
            Err(e) => ServiceStatus::unhealthy(None, e.to_string()),
        },
        None => ServiceStatus {
            status: "healthy",
            backend: Some("none"),
            error: None,
        },
    };

    let backend = Some(state.rate_limiter.backend());
    let rate_limiter = if state.rate_limiter.is_healthy().await {
        ServiceStatus::healthy(backend)
    } else {
        ServiceStatus::unhealthy(backend, "Rate limiter backend unreachable")
    };

    let all_healthy = database.is_healthy() && rate_limiter.is_healthy();
    if !all_healthy {
        tracing::warn!(
            database = database.status,
            rate_limiter = rate_limiter.status,
            "Health check degraded"
        );
    }

    let status_code = if all_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status_code,
        Json(HealthResponse {
            status: if all_healthy { "healthy" } else { "degraded" },
            services: ServiceHealth {
                database,
                rate_limiter,
            },
        }),
    )
}
