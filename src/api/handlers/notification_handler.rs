//! Notification handlers.

use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, patch, post},
    Extension, Router,
};
use uuid::Uuid;

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::domain::{NotificationView, SendNotification, SendOutcome};
use crate::errors::AppResult;
use crate::types::{Created, MessageResponse};

pub fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_notifications))
        .route("/send", post(send_notification))
        .route("/:id/read", patch(mark_read))
}

/// Message a user, or broadcast to all active volunteers
#[utoipa::path(
    post,
    path = "/notification/send",
    tag = "Notifications",
    request_body = SendNotification,
    responses(
        (status = 201, description = "Notifications created", body = SendOutcome),
        (status = 403, description = "Only coordinators can broadcast"),
        (status = 404, description = "Receiver not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn send_notification(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    ValidatedJson(payload): ValidatedJson<SendNotification>,
) -> AppResult<Created<SendOutcome>> {
    let outcome = state
        .services
        .notifications()
        .send(current_user.actor(), payload)
        .await?;
    Ok(Created(outcome))
}

/// The caller's notifications, newest first
#[utoipa::path(
    get,
    path = "/notification",
    tag = "Notifications",
    responses((status = 200, description = "Notifications", body = [NotificationView])),
    security(("bearer_auth" = []))
)]
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<Vec<NotificationView>>> {
    let notifications = state
        .services
        .notifications()
        .list(current_user.actor())
        .await?;
    Ok(Json(notifications))
}

#[utoipa::path(
    patch,
    path = "/notification/{id}/read",
    tag = "Notifications",
    params(("id" = Uuid, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Marked as read", body = MessageResponse),
        (status = 404, description = "Notification not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    state
        .services
        .notifications()
        .mark_read(current_user.actor(), id)
        .await?;
    Ok(Json(MessageResponse::new("Notification marked as read")))
}
