//! Skill catalogue handlers.

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
use crate::domain::{Skill, SkillEntry, SkillInput, VolunteerRef};
use crate::errors::AppResult;
use crate::types::{Created, MessageResponse};

/// The public listing.
pub fn skill_public_routes() -> Router<AppState> {
    Router::new().route("/", get(list_skills))
}

pub fn skill_routes() -> Router<AppState> {
    Router::new()
        .route("/create", post(create_skill))
        .route("/update/:id", put(rename_skill))
        .route("/delete/:id", delete(delete_skill))
        .route("/:id/assign", post(assign_skill))
        .route("/:id/unassign", post(unassign_skill))
}

/// Every skill with the volunteers holding it
#[utoipa::path(
    get,
    path = "/skill",
    tag = "Skills",
    responses((status = 200, description = "Skills", body = [SkillEntry]))
)]
pub async fn list_skills(State(state): State<AppState>) -> AppResult<Json<Vec<SkillEntry>>> {
    let skills = state.services.skills().list().await?;
    Ok(Json(skills))
}

#[utoipa::path(
    post,
    path = "/skill/create",
    tag = "Skills",
    request_body = SkillInput,
    responses(
        (status = 201, description = "Skill created", body = Skill),
        (status = 409, description = "Duplicate name")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_skill(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    ValidatedJson(payload): ValidatedJson<SkillInput>,
) -> AppResult<Created<Skill>> {
    let skill = state
        .services
        .skills()
        .create(current_user.actor(), payload.name)
        .await?;
    Ok(Created(skill))
}

#[utoipa::path(
    put,
    path = "/skill/update/{id}",
    tag = "Skills",
    params(("id" = Uuid, Path, description = "Skill ID")),
    request_body = SkillInput,
    responses(
        (status = 200, description = "Skill renamed", body = Skill),
        (status = 409, description = "Duplicate name")
    ),
    security(("bearer_auth" = []))
)]
pub async fn rename_skill(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<SkillInput>,
) -> AppResult<Json<Skill>> {
    let skill = state
        .services
        .skills()
        .rename(current_user.actor(), id, payload.name)
        .await?;
    Ok(Json(skill))
}

#[utoipa::path(
    delete,
    path = "/skill/delete/{id}",
    tag = "Skills",
    params(("id" = Uuid, Path, description = "Skill ID")),
    responses((status = 200, description = "Skill deleted", body = MessageResponse)),
    security(("bearer_auth" = []))
)]
pub async fn delete_skill(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    state
        .services
        .skills()
        .delete(current_user.actor(), id)
        .await?;
    Ok(Json(MessageResponse::new("Skill deleted")))
}

#[utoipa::path(
    post,
    path = "/skill/{id}/assign",
    tag = "Skills",
    params(("id" = Uuid, Path, description = "Skill ID")),
    request_body = VolunteerRef,
    responses((status = 200, description = "Skill assigned", body = MessageResponse)),
    security(("bearer_auth" = []))
)]
pub async fn assign_skill(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<VolunteerRef>,
) -> AppResult<Json<MessageResponse>> {
    state
        .services
        .skills()
        .assign(current_user.actor(), id, payload.volunteer_id)
        .await?;
    Ok(Json(MessageResponse::new("Skill assigned")))
}

#[utoipa::path(
    post,
    path = "/skill/{id}/unassign",
    tag = "Skills",
    params(("id" = Uuid, Path, description = "Skill ID")),
    request_body = VolunteerRef,
    responses((status = 200, description = "Skill unassigned", body = MessageResponse)),
    security(("bearer_auth" = []))
)]
pub async fn unassign_skill(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<VolunteerRef>,
) -> AppResult<Json<MessageResponse>> {
    state
        .services
        .skills()
        .unassign(current_user.actor(), id, payload.volunteer_id)
        .await?;
    Ok(Json(MessageResponse::new("Skill unassigned")))
}
