//! Project handlers.

use axum::{
    extract::{Path, State},
    response::Json,
    routing::{delete, get, post, put},
    Extension, Router,
};
use uuid::Uuid;

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::domain::{
    Activity, AddVolunteer, CreateProject, MoveActivity, Project, ProjectDetails,
    ProjectVolunteer, UpdateProject,
};
use crate::errors::AppResult;
use crate::types::{Created, MessageResponse};

pub fn project_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_projects).post(create_project))
        .route("/create", post(create_project))
        .route(
            "/:id",
            get(get_project).put(update_project).delete(delete_project),
        )
        .route("/:id/volunteers", post(add_volunteer))
        .route("/:id/volunteers/:user_id", delete(remove_volunteer))
        .route("/activities/:id/project", put(move_activity))
}

/// Create a project
#[utoipa::path(
    post,
    path = "/projects",
    tag = "Projects",
    request_body = CreateProject,
    responses(
        (status = 201, description = "Project created", body = Project),
        (status = 400, description = "Invalid dates"),
        (status = 403, description = "Not allowed to create this project"),
        (status = 409, description = "Duplicate name or ineligible manager")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_project(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    ValidatedJson(payload): ValidatedJson<CreateProject>,
) -> AppResult<Created<Project>> {
    let project = state
        .services
        .projects()
        .create(current_user.actor(), payload)
        .await?;
    Ok(Created(project))
}

/// Projects visible to the caller
#[utoipa::path(
    get,
    path = "/projects",
    tag = "Projects",
    responses((status = 200, description = "Visible projects", body = [Project])),
    security(("bearer_auth" = []))
)]
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<Vec<Project>>> {
    let projects = state.services.projects().list(current_user.actor()).await?;
    Ok(Json(projects))
}

/// Project with manager, volunteers and activities
#[utoipa::path(
    get,
    path = "/projects/{id}",
    tag = "Projects",
    params(("id" = Uuid, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project details", body = ProjectDetails),
        (status = 403, description = "Project not visible"),
        (status = 404, description = "Project not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_project(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ProjectDetails>> {
    let details = state
        .services
        .projects()
        .get(current_user.actor(), id)
        .await?;
    Ok(Json(details))
}

/// Update a project
#[utoipa::path(
    put,
    path = "/projects/{id}",
    tag = "Projects",
    params(("id" = Uuid, Path, description = "Project ID")),
    request_body = UpdateProject,
    responses(
        (status = 200, description = "Project updated", body = Project),
        (status = 403, description = "Not the project's manager"),
        (status = 404, description = "Project not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_project(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateProject>,
) -> AppResult<Json<Project>> {
    let project = state
        .services
        .projects()
        .update(current_user.actor(), id, payload)
        .await?;
    Ok(Json(project))
}

/// Delete a project with its activities and memberships
#[utoipa::path(
    delete,
    path = "/projects/{id}",
    tag = "Projects",
    params(("id" = Uuid, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project deleted", body = MessageResponse),
        (status = 403, description = "Coordinators only")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    state
        .services
        .projects()
        .delete(current_user.actor(), id)
        .await?;
    Ok(Json(MessageResponse::new("Project deleted")))
}

/// Add a volunteer to the project
#[utoipa::path(
    post,
    path = "/projects/{id}/volunteers",
    tag = "Projects",
    params(("id" = Uuid, Path, description = "Project ID")),
    request_body = AddVolunteer,
    responses(
        (status = 201, description = "Current volunteers", body = [ProjectVolunteer]),
        (status = 409, description = "Already a volunteer or inactive account")
    ),
    security(("bearer_auth" = []))
)]
pub async fn add_volunteer(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<AddVolunteer>,
) -> AppResult<Created<Vec<ProjectVolunteer>>> {
    let volunteers = state
        .services
        .projects()
        .add_volunteer(current_user.actor(), id, payload.user_id)
        .await?;
    Ok(Created(volunteers))
}

/// Remove a volunteer from the project
#[utoipa::path(
    delete,
    path = "/projects/{id}/volunteers/{user_id}",
    tag = "Projects",
    params(
        ("id" = Uuid, Path, description = "Project ID"),
        ("user_id" = Uuid, Path, description = "Volunteer ID")
    ),
    responses(
        (status = 200, description = "Remaining volunteers", body = [ProjectVolunteer]),
        (status = 409, description = "Last volunteer can only be removed by a coordinator")
    ),
    security(("bearer_auth" = []))
)]
pub async fn remove_volunteer(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<Vec<ProjectVolunteer>>> {
    let volunteers = state
        .services
        .projects()
        .remove_volunteer(current_user.actor(), id, user_id)
        .await?;
    Ok(Json(volunteers))
}

/// Move an activity to another project
#[utoipa::path(
    put,
    path = "/projects/activities/{id}/project",
    tag = "Projects",
    params(("id" = Uuid, Path, description = "Activity ID")),
    request_body = MoveActivity,
    responses(
        (status = 200, description = "Activity moved", body = Activity),
        (status = 403, description = "Coordinators only")
    ),
    security(("bearer_auth" = []))
)]
pub async fn move_activity(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<MoveActivity>,
) -> AppResult<Json<Activity>> {
    let activity = state
        .services
        .projects()
        .move_activity(current_user.actor(), id, payload)
        .await?;
    Ok(Json(activity))
}
