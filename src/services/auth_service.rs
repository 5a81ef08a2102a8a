//! Authentication service - registration, tokens and password recovery.
//!
//! Access tokens are short-lived JWTs signed with `JWT_SECRET`. Refresh
//! tokens are JWTs signed with `JWT_REFRESH_SECRET` and also persisted, so
//! logout and password resets can revoke them.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use super::email_service::EmailService;
use crate::config::{Config, SECONDS_PER_HOUR, TOKEN_TYPE_BEARER};
use crate::domain::token::generate_reset_token;
use crate::domain::{NewUser, Password, Project, Role, User, UserChanges, UserResponse};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UnitOfWork;

/// Hash verified against when the e-mail is unknown, so both paths cost the same.
static DUMMY_HASH: Lazy<String> = Lazy::new(|| {
    Password::new("timing-equalizer-password")
        .map(Password::into_string)
        .unwrap_or_default()
});

/// JWT claims payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct RefreshClaims {
    sub: Uuid,
    /// Makes every issued refresh token distinct.
    jti: Uuid,
    exp: i64,
    iat: i64,
}

/// Token response returned after a refresh
#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    /// JWT access token
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub access_token: String,
    /// Token type (always "Bearer")
    #[schema(example = "Bearer")]
    pub token_type: String,
    /// Token expiration time in seconds
    #[schema(example = 3600)]
    pub expires_in: i64,
}

/// Login response: both tokens and the signed-in user
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[schema(example = "Bearer")]
    pub token_type: String,
    #[schema(example = 3600)]
    pub expires_in: i64,
    pub user: UserResponse,
}

/// Current user with the projects they belong to or manage
#[derive(Debug, Serialize, ToSchema)]
pub struct Profile {
    pub user: UserResponse,
    pub projects: Vec<Project>,
}

/// Self-service sign-up data.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Option<Role>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

#[async_trait]
pub trait AuthService: Send + Sync {
    /// Register a new account. Only VOLUNTEER (default) and LEGAL may be chosen.
    async fn register(&self, registration: Registration) -> AppResult<User>;

    async fn login(&self, email: String, password: String) -> AppResult<LoginResponse>;

    /// Exchange a stored, unrevoked refresh token for a new access token.
    async fn refresh(&self, refresh_token: String) -> AppResult<TokenResponse>;

    /// Revoke a refresh token. Unknown tokens are ignored.
    async fn logout(&self, refresh_token: String) -> AppResult<()>;

    async fn me(&self, user_id: Uuid) -> AppResult<Profile>;

    /// Start password recovery. Succeeds whether or not the account exists.
    async fn forgot_password(&self, email: String) -> AppResult<()>;

    async fn reset_password(&self, token: String, password: String) -> AppResult<()>;

    /// Verify an access token and extract its claims.
    fn verify_token(&self, token: &str) -> AppResult<Claims>;
}

fn access_token(user: &User, config: &Config) -> AppResult<TokenResponse> {
    let now = Utc::now();
    let expires_at = now + Duration::hours(config.jwt_expiration_hours);

    let claims = Claims {
        sub: user.id,
        email: user.email.clone(),
        name: user.name.clone(),
        role: user.role,
        exp: expires_at.timestamp(),
        iat: now.timestamp(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret_bytes()),
    )?;

    Ok(TokenResponse {
        access_token: token,
        token_type: TOKEN_TYPE_BEARER.to_string(),
        expires_in: config.jwt_expiration_hours * SECONDS_PER_HOUR,
    })
}

fn refresh_token(user_id: Uuid, config: &Config) -> AppResult<(String, chrono::DateTime<Utc>)> {
    let now = Utc::now();
    let expires_at = now + Duration::days(config.refresh_expiration_days);
    let claims = RefreshClaims {
        sub: user_id,
        jti: Uuid::new_v4(),
        exp: expires_at.timestamp(),
        iat: now.timestamp(),
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.refresh_secret_bytes()),
    )?;
    Ok((token, expires_at))
}

pub struct Authenticator<U: UnitOfWork> {
    uow: Arc<U>,
    email: Arc<dyn EmailService>,
    config: Config,
}

impl<U: UnitOfWork> Authenticator<U> {
    pub fn new(uow: Arc<U>, email: Arc<dyn EmailService>, config: Config) -> Self {
        Self { uow, email, config }
    }
}

#[async_trait]
impl<U: UnitOfWork> AuthService for Authenticator<U> {
    async fn register(&self, registration: Registration) -> AppResult<User> {
        let role = registration.role.unwrap_or(Role::Volunteer);
        if !role.is_self_assignable() {
            return Err(AppError::forbidden(format!(
                "Role {} cannot be chosen at registration",
                role
            )));
        }
        let password_hash = Password::new(&registration.password)?.into_string();

        let user = self
            .uow
            .transaction(move |tx| {
                Box::pin(async move {
                    if tx.users().find_by_email(&registration.email).await?.is_some() {
                        return Err(AppError::conflict("Email already registered"));
                    }
                    tx.users()
                        .create(NewUser {
                            name: registration.name,
                            email: registration.email,
                            password_hash,
                            role,
                            phone: registration.phone,
                            city: registration.city,
                            country: registration.country,
                        })
                        .await
                })
            })
            .await?;

        tracing::info!(user_id = %user.id, role = %user.role, "User registered");
        Ok(user)
    }

    async fn login(&self, email: String, password: String) -> AppResult<LoginResponse> {
        let found = self
            .uow
            .read(move |tx| Box::pin(async move { tx.users().find_by_email(&email).await }))
            .await?;

        let hash = found
            .as_ref()
            .map(|user| user.password_hash.clone())
            .unwrap_or_else(|| DUMMY_HASH.clone());
        let password_valid = Password::from_hash(hash).verify(&password);

        let user = match found {
            Some(user) if password_valid && user.is_active => user,
            _ => return Err(AppError::InvalidCredentials),
        };

        let access = access_token(&user, &self.config)?;
        let (refresh, expires_at) = refresh_token(user.id, &self.config)?;

        let user_id = user.id;
        let stored = refresh.clone();
        self.uow
            .transaction(move |tx| {
                Box::pin(async move { tx.tokens().store_refresh(user_id, stored, expires_at).await })
            })
            .await?;

        tracing::info!(user_id = %user.id, "User logged in");
        Ok(LoginResponse {
            access_token: access.access_token,
            refresh_token: refresh,
            token_type: access.token_type,
            expires_in: access.expires_in,
            user: user.into(),
        })
    }

    async fn refresh(&self, refresh_token: String) -> AppResult<TokenResponse> {
        let claims = decode::<RefreshClaims>(
            &refresh_token,
            &DecodingKey::from_secret(self.config.refresh_secret_bytes()),
            &Validation::default(),
        )?
        .claims;

        let user = self
            .uow
            .read(move |tx| {
                Box::pin(async move {
                    let stored = tx
                        .tokens()
                        .find_refresh(&refresh_token)
                        .await?
                        .ok_or(AppError::Unauthorized)?;
                    if stored.user_id != claims.sub || !stored.is_usable(Utc::now()) {
                        return Err(AppError::Unauthorized);
                    }
                    match tx.users().find_by_id(stored.user_id).await? {
                        Some(user) if user.is_active => Ok(user),
                        _ => Err(AppError::Unauthorized),
                    }
                })
            })
            .await?;

        access_token(&user, &self.config)
    }

    async fn logout(&self, refresh_token: String) -> AppResult<()> {
        let revoked = self
            .uow
            .transaction(move |tx| {
                Box::pin(async move { tx.tokens().revoke_refresh(&refresh_token).await })
            })
            .await?;
        tracing::debug!(revoked, "Logout");
        Ok(())
    }

    async fn me(&self, user_id: Uuid) -> AppResult<Profile> {
        self.uow
            .read(move |tx| {
                Box::pin(async move {
                    let user = tx.users().find_by_id(user_id).await?.ok_or_not_found("User")?;
                    let mut ids = tx.projects().ids_managed_by(user_id).await?;
                    ids.extend(tx.projects().ids_joined_by(user_id).await?);
                    ids.sort();
                    ids.dedup();
                    let projects = tx.projects().find_many(&ids).await?;
                    Ok(Profile {
                        user: user.into(),
                        projects,
                    })
                })
            })
            .await
    }

    async fn forgot_password(&self, email: String) -> AppResult<()> {
        let token = generate_reset_token();
        let expires_at = Utc::now() + Duration::minutes(self.config.reset_expiration_minutes);

        let stored = token.clone();
        let user = self
            .uow
            .transaction(move |tx| {
                Box::pin(async move {
                    let user = match tx.users().find_by_email(&email).await? {
                        Some(user) if user.is_active => user,
                        _ => return Ok(None),
                    };
                    tx.tokens().create_reset(user.id, stored, expires_at).await?;
                    Ok(Some(user))
                })
            })
            .await?;

        match user {
            Some(user) => {
                tracing::info!(user_id = %user.id, "Password reset requested");
                if let Err(e) = self
                    .email
                    .send_password_reset(&user.email, &user.name, &token)
                    .await
                {
                    tracing::warn!(user_id = %user.id, error = %e, "Password reset e-mail not sent");
                }
            }
            None => tracing::debug!("Password reset requested for unknown or inactive account"),
        }
        Ok(())
    }

    async fn reset_password(&self, token: String, password: String) -> AppResult<()> {
        let password_hash = Password::new(&password)?.into_string();

        let user_id = self
            .uow
            .transaction(move |tx| {
                Box::pin(async move {
                    let reset = tx
                        .tokens()
                        .find_reset_for_update(&token)
                        .await?
                        .filter(|reset| reset.is_usable(Utc::now()))
                        .ok_or_else(|| AppError::bad_request("Invalid or expired reset token"))?;

                    tx.users()
                        .update(
                            reset.user_id,
                            UserChanges {
                                password_hash: Some(password_hash),
                                ..Default::default()
                            },
                        )
                        .await?;
                    tx.tokens().consume_resets_for_user(reset.user_id).await?;
                    tx.tokens().revoke_all_for_user(reset.user_id).await?;
                    Ok(reset.user_id)
                })
            })
            .await?;

        tracing::info!(user_id = %user_id, "Password reset completed");
        Ok(())
    }

    fn verify_token(&self, token: &str) -> AppResult<Claims> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }
}
