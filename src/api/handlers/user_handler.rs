//! User administration handlers (coordinators only).

use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::get,
    Extension, Router,
};
use uuid::Uuid;

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::domain::{CreateUser, UpdateUser, UserResponse};
use crate::errors::AppResult;
use crate::types::{Created, PaginationParams, UserPage};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:id", get(get_user).patch(update_user))
}

/// List users with their logged hours
#[utoipa::path(
    get,
    path = "/users",
    tag = "Users",
    params(PaginationParams),
    responses(
        (status = 200, description = "Page of users", body = UserPage),
        (status = 403, description = "Coordinators only")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_users(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<UserPage>> {
    let page = state
        .services
        .users()
        .list(current_user.actor(), params)
        .await?;
    Ok(Json(page))
}

/// Get a user by ID
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "Users",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_user(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<UserResponse>> {
    let user = state.services.users().get(current_user.actor(), id).await?;
    Ok(Json(UserResponse::from(user)))
}

/// Create an account and send its welcome e-mail
#[utoipa::path(
    post,
    path = "/users",
    tag = "Users",
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 409, description = "Email already registered")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_user(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    ValidatedJson(payload): ValidatedJson<CreateUser>,
) -> AppResult<Created<UserResponse>> {
    let user = state
        .services
        .users()
        .create(current_user.actor(), payload)
        .await?;
    Ok(Created(UserResponse::from(user)))
}

/// Update profile fields, role or activation
#[utoipa::path(
    patch,
    path = "/users/{id}",
    tag = "Users",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateUser,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 404, description = "User not found"),
        (status = 409, description = "Cannot deactivate or demote yourself")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_user(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateUser>,
) -> AppResult<Json<UserResponse>> {
    let user = state
        .services
        .users()
        .update(current_user.actor(), id, payload)
        .await?;
    Ok(Json(UserResponse::from(user)))
}
