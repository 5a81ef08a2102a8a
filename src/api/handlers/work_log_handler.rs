//! Work log handlers.

use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, post, put},
    Extension, Router,
};
use uuid::Uuid;

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::domain::{CreateWorkLog, UpdateWorkLog, WorkLog};
use crate::errors::AppResult;
use crate::types::{Created, MessageResponse};

pub fn work_log_routes() -> Router<AppState> {
    Router::new()
        .route("/create", post(create_work_log))
        .route("/me", get(my_work_logs))
        .route("/pending", get(pending_work_logs))
        .route("/user/:id", get(user_work_logs))
        .route("/:id", put(update_work_log).delete(delete_work_log))
        .route("/:id/approve", post(approve_work_log))
        .route("/:id/unapprove", post(unapprove_work_log))
}

/// Record time for the caller
#[utoipa::path(
    post,
    path = "/worklog/create",
    tag = "Work logs",
    request_body = CreateWorkLog,
    responses(
        (status = 201, description = "Work log recorded", body = WorkLog),
        (status = 400, description = "Invalid hours"),
        (status = 403, description = "Not part of the activity's project"),
        (status = 404, description = "Activity not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_work_log(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    ValidatedJson(payload): ValidatedJson<CreateWorkLog>,
) -> AppResult<Created<WorkLog>> {
    let log = state
        .services
        .work_logs()
        .create(current_user.actor(), payload)
        .await?;
    Ok(Created(log))
}

#[utoipa::path(
    get,
    path = "/worklog/me",
    tag = "Work logs",
    responses((status = 200, description = "Caller's work logs", body = [WorkLog])),
    security(("bearer_auth" = []))
)]
pub async fn my_work_logs(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<Vec<WorkLog>>> {
    let logs = state.services.work_logs().mine(current_user.actor()).await?;
    Ok(Json(logs))
}

/// Pending logs the caller may review
#[utoipa::path(
    get,
    path = "/worklog/pending",
    tag = "Work logs",
    responses(
        (status = 200, description = "Pending work logs", body = [WorkLog]),
        (status = 403, description = "Coordinators and project managers only")
    ),
    security(("bearer_auth" = []))
)]
pub async fn pending_work_logs(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<Vec<WorkLog>>> {
    let logs = state
        .services
        .work_logs()
        .pending(current_user.actor())
        .await?;
    Ok(Json(logs))
}

#[utoipa::path(
    get,
    path = "/worklog/user/{id}",
    tag = "Work logs",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "The user's work logs", body = [WorkLog]),
        (status = 403, description = "Coordinators only")
    ),
    security(("bearer_auth" = []))
)]
pub async fn user_work_logs(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<WorkLog>>> {
    let logs = state
        .services
        .work_logs()
        .for_user(current_user.actor(), id)
        .await?;
    Ok(Json(logs))
}

/// Edit a pending work log
#[utoipa::path(
    put,
    path = "/worklog/{id}",
    tag = "Work logs",
    params(("id" = Uuid, Path, description = "Work log ID")),
    request_body = UpdateWorkLog,
    responses(
        (status = 200, description = "Work log updated", body = WorkLog),
        (status = 403, description = "Not the owner"),
        (status = 409, description = "Work log is no longer pending")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_work_log(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateWorkLog>,
) -> AppResult<Json<WorkLog>> {
    let log = state
        .services
        .work_logs()
        .update(current_user.actor(), id, payload)
        .await?;
    Ok(Json(log))
}

#[utoipa::path(
    delete,
    path = "/worklog/{id}",
    tag = "Work logs",
    params(("id" = Uuid, Path, description = "Work log ID")),
    responses(
        (status = 200, description = "Work log deleted", body = MessageResponse),
        (status = 409, description = "Work log is no longer pending")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_work_log(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    state
        .services
        .work_logs()
        .delete(current_user.actor(), id)
        .await?;
    Ok(Json(MessageResponse::new("Work log deleted")))
}

/// Approve a pending work log
#[utoipa::path(
    post,
    path = "/worklog/{id}/approve",
    tag = "Work logs",
    params(("id" = Uuid, Path, description = "Work log ID")),
    responses(
        (status = 200, description = "Work log approved", body = WorkLog),
        (status = 403, description = "Not the managing project manager"),
        (status = 409, description = "Work log is not pending")
    ),
    security(("bearer_auth" = []))
)]
pub async fn approve_work_log(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<WorkLog>> {
    let log = state
        .services
        .work_logs()
        .approve(current_user.actor(), id)
        .await?;
    Ok(Json(log))
}

/// Return an approved work log to pending
#[utoipa::path(
    post,
    path = "/worklog/{id}/unapprove",
    tag = "Work logs",
    params(("id" = Uuid, Path, description = "Work log ID")),
    responses(
        (status = 200, description = "Approval withdrawn", body = WorkLog),
        (status = 403, description = "Not the managing project manager"),
        (status = 409, description = "Work log is not approved")
    ),
    security(("bearer_auth" = []))
)]
pub async fn unapprove_work_log(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<WorkLog>> {
    let log = state
        .services
        .work_logs()
        .unapprove(current_user.actor(), id)
        .await?;
    Ok(Json(log))
}
