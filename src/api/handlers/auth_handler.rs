//! Authentication handlers.

use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Extension, Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::domain::{Role, UserResponse};
use crate::errors::AppResult;
use crate::services::{LoginResponse, Profile, Registration, TokenResponse};
use crate::types::{Created, MessageResponse};

/// User registration request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    #[schema(example = "Ada Volunteer")]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "ada@example.org")]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    #[schema(example = "SecurePass123!", min_length = 8)]
    pub password: String,
    /// VOLUNTEER (default) or LEGAL
    pub role: Option<Role>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

/// User login request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "ada@example.org")]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    #[schema(example = "SecurePass123!")]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1, message = "Reset token is required"))]
    pub token: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

/// Routes reachable without a token.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
}

/// Routes that need an authenticated caller.
pub fn session_routes() -> Router<AppState> {
    Router::new().route("/me", get(me))
}

/// Register a new account
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "Authentication",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = UserResponse),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Role cannot be self-assigned"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> AppResult<Created<UserResponse>> {
    let user = state
        .services
        .auth()
        .register(Registration {
            name: payload.name,
            email: payload.email,
            password: payload.password,
            role: payload.role,
            phone: payload.phone,
            city: payload.city,
            country: payload.country,
        })
        .await?;

    Ok(Created(UserResponse::from(user)))
}

/// Login and get an access/refresh token pair
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let session = state
        .services
        .auth()
        .login(payload.email, payload.password)
        .await?;
    Ok(Json(session))
}

/// Exchange a refresh token for a new access token
#[utoipa::path(
    post,
    path = "/auth/refresh",
    tag = "Authentication",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New access token", body = TokenResponse),
        (status = 401, description = "Invalid, revoked or expired refresh token")
    )
)]
pub async fn refresh(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RefreshRequest>,
) -> AppResult<Json<TokenResponse>> {
    let token = state.services.auth().refresh(payload.refresh_token).await?;
    Ok(Json(token))
}

/// Revoke a refresh token
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "Authentication",
    request_body = RefreshRequest,
    responses((status = 200, description = "Logged out", body = MessageResponse))
)]
pub async fn logout(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RefreshRequest>,
) -> AppResult<Json<MessageResponse>> {
    state.services.auth().logout(payload.refresh_token).await?;
    Ok(Json(MessageResponse::new("Logged out")))
}

/// Current user and their projects
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "Authentication",
    responses(
        (status = 200, description = "Current user", body = Profile),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer_auth" = []))
)]
pub async fn me(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<Profile>> {
    let profile = state.services.auth().me(current_user.id).await?;
    Ok(Json(profile))
}

/// Start password recovery
#[utoipa::path(
    post,
    path = "/auth/forgot-password",
    tag = "Authentication",
    request_body = ForgotPasswordRequest,
    responses((status = 200, description = "Reset e-mail sent if the account exists", body = MessageResponse))
)]
pub async fn forgot_password(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ForgotPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    state.services.auth().forgot_password(payload.email).await?;
    Ok(Json(MessageResponse::new(
        "If the account exists, a reset link has been sent",
    )))
}

/// Set a new password with a reset token
#[utoipa::path(
    post,
    path = "/auth/reset-password",
    tag = "Authentication",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password updated", body = MessageResponse),
        (status = 400, description = "Invalid or expired reset token")
    )
)]
pub async fn reset_password(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ResetPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    state
        .services
        .auth()
        .reset_password(payload.token, payload.password)
        .await?;
    Ok(Json(MessageResponse::new("Password updated")))
}
