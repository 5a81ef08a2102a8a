//! Activity handlers, mounted under both `/activity` and `/activities`.

use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{get, post},
    Extension, Router,
};
use uuid::Uuid;

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::domain::{
    Activity, ActivityFilter, ActivityListItem, ActivityStats, CreateActivity, ProjectVolunteer,
    UpdateActivity, VolunteerRef,
};
use crate::errors::AppResult;
use crate::types::{Created, MessageResponse};

pub fn activity_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_activities))
        .route("/create", post(create_activity))
        .route("/stats", get(activity_stats))
        .route(
            "/:id",
            get(get_activity).put(update_activity).delete(delete_activity),
        )
        .route("/:id/assign", post(assign_volunteer))
        .route("/:id/unassign", post(unassign_volunteer))
        .route("/:id/volunteers", get(list_volunteers))
}

/// Create an activity in a project
#[utoipa::path(
    post,
    path = "/activity/create",
    tag = "Activities",
    request_body = CreateActivity,
    responses(
        (status = 201, description = "Activity created", body = Activity),
        (status = 400, description = "Date before the project start"),
        (status = 403, description = "Not the project's manager"),
        (status = 409, description = "Title already used in this project")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_activity(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    ValidatedJson(payload): ValidatedJson<CreateActivity>,
) -> AppResult<Created<Activity>> {
    let activity = state
        .services
        .activities()
        .create(current_user.actor(), payload)
        .await?;
    Ok(Created(activity))
}

/// Visible activities, earliest first
#[utoipa::path(
    get,
    path = "/activity",
    tag = "Activities",
    params(ActivityFilter),
    responses(
        (status = 200, description = "Activities", body = [ActivityListItem]),
        (status = 403, description = "Project filter outside the caller's scope")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_activities(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Query(filter): Query<ActivityFilter>,
) -> AppResult<Json<Vec<ActivityListItem>>> {
    let activities = state
        .services
        .activities()
        .list(current_user.actor(), filter)
        .await?;
    Ok(Json(activities))
}

/// Aggregates over the visible activities
#[utoipa::path(
    get,
    path = "/activity/stats",
    tag = "Activities",
    params(ActivityFilter),
    responses((status = 200, description = "Activity statistics", body = ActivityStats)),
    security(("bearer_auth" = []))
)]
pub async fn activity_stats(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Query(filter): Query<ActivityFilter>,
) -> AppResult<Json<ActivityStats>> {
    let stats = state
        .services
        .activities()
        .stats(current_user.actor(), filter)
        .await?;
    Ok(Json(stats))
}

#[utoipa::path(
    get,
    path = "/activity/{id}",
    tag = "Activities",
    params(("id" = Uuid, Path, description = "Activity ID")),
    responses(
        (status = 200, description = "Activity", body = Activity),
        (status = 403, description = "Activity not visible"),
        (status = 404, description = "Activity not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_activity(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Activity>> {
    let activity = state
        .services
        .activities()
        .get(current_user.actor(), id)
        .await?;
    Ok(Json(activity))
}

/// Update an activity; a new `project_id` moves it
#[utoipa::path(
    put,
    path = "/activity/{id}",
    tag = "Activities",
    params(("id" = Uuid, Path, description = "Activity ID")),
    request_body = UpdateActivity,
    responses(
        (status = 200, description = "Activity updated", body = Activity),
        (status = 400, description = "Date before the project start"),
        (status = 403, description = "Not allowed"),
        (status = 409, description = "Title already used in this project")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_activity(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateActivity>,
) -> AppResult<Json<Activity>> {
    let activity = state
        .services
        .activities()
        .update(current_user.actor(), id, payload)
        .await?;
    Ok(Json(activity))
}

#[utoipa::path(
    delete,
    path = "/activity/{id}",
    tag = "Activities",
    params(("id" = Uuid, Path, description = "Activity ID")),
    responses((status = 200, description = "Activity deleted", body = MessageResponse)),
    security(("bearer_auth" = []))
)]
pub async fn delete_activity(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    state
        .services
        .activities()
        .delete(current_user.actor(), id)
        .await?;
    Ok(Json(MessageResponse::new("Activity deleted")))
}

/// Add a volunteer to the activity's project
#[utoipa::path(
    post,
    path = "/activity/{id}/assign",
    tag = "Activities",
    params(("id" = Uuid, Path, description = "Activity ID")),
    request_body = VolunteerRef,
    responses(
        (status = 200, description = "Project volunteers", body = [ProjectVolunteer]),
        (status = 409, description = "Already assigned")
    ),
    security(("bearer_auth" = []))
)]
pub async fn assign_volunteer(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<VolunteerRef>,
) -> AppResult<Json<Vec<ProjectVolunteer>>> {
    let volunteers = state
        .services
        .activities()
        .assign(current_user.actor(), id, payload.volunteer_id)
        .await?;
    Ok(Json(volunteers))
}

/// Remove a volunteer from the activity's project
#[utoipa::path(
    post,
    path = "/activity/{id}/unassign",
    tag = "Activities",
    params(("id" = Uuid, Path, description = "Activity ID")),
    request_body = VolunteerRef,
    responses(
        (status = 200, description = "Project volunteers", body = [ProjectVolunteer]),
        (status = 409, description = "Last volunteer can only be removed by a coordinator")
    ),
    security(("bearer_auth" = []))
)]
pub async fn unassign_volunteer(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<VolunteerRef>,
) -> AppResult<Json<Vec<ProjectVolunteer>>> {
    let volunteers = state
        .services
        .activities()
        .unassign(current_user.actor(), id, payload.volunteer_id)
        .await?;
    Ok(Json(volunteers))
}

#[utoipa::path(
    get,
    path = "/activity/{id}/volunteers",
    tag = "Activities",
    params(("id" = Uuid, Path, description = "Activity ID")),
    responses((status = 200, description = "Project volunteers", body = [ProjectVolunteer])),
    security(("bearer_auth" = []))
)]
pub async fn list_volunteers(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<ProjectVolunteer>>> {
    let volunteers = state
        .services
        .activities()
        .volunteers(current_user.actor(), id)
        .await?;
    Ok(Json(volunteers))
}
