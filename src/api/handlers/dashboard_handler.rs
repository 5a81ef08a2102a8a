use axum::{extract::State, response::Json, routing::get, Extension, Router};

use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::domain::DashboardStats;
use crate::errors::AppResult;

pub fn dashboard_routes() -> Router<AppState> {
    Router::new().route("/stats", get(dashboard_stats))
}

/// Headline numbers scoped to the caller's projects
#[utoipa::path(
    get,
    path = "/dashboard/stats",
    tag = "Dashboard",
    responses((status = 200, description = "Dashboard statistics", body = DashboardStats)),
    security(("bearer_auth" = []))
)]
pub async fn dashboard_stats(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<DashboardStats>> {
    let stats = state
        .services
        .dashboard()
        .stats(current_user.actor())
        .await?;
    Ok(Json(stats))
}
