//! User administration (coordinators only).

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use super::email_service::EmailService;
use crate::config::WELCOME_RESET_EXPIRATION_HOURS;
use crate::domain::policy::require_role;
use crate::domain::stats::round_one_decimal;
use crate::domain::token::generate_reset_token;
use crate::domain::{
    Actor, CreateUser, NewUser, Password, Role, UpdateUser, User, UserResponse, UserWithHours,
};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UnitOfWork;
use crate::types::{Paginated, PaginationParams};

#[async_trait]
pub trait UserService: Send + Sync {
    /// Page of users with the hours they logged.
    async fn list(
        &self,
        actor: Actor,
        params: PaginationParams,
    ) -> AppResult<Paginated<UserWithHours>>;

    async fn get(&self, actor: Actor, id: Uuid) -> AppResult<User>;

    /// Create an account and e-mail its owner a set-password link.
    async fn create(&self, actor: Actor, input: CreateUser) -> AppResult<User>;

    async fn update(&self, actor: Actor, id: Uuid, input: UpdateUser) -> AppResult<User>;
}

pub struct UserManager<U: UnitOfWork> {
    uow: Arc<U>,
    email: Arc<dyn EmailService>,
}

impl<U: UnitOfWork> UserManager<U> {
    pub fn new(uow: Arc<U>, email: Arc<dyn EmailService>) -> Self {
        Self { uow, email }
    }
}

#[async_trait]
impl<U: UnitOfWork> UserService for UserManager<U> {
    async fn list(
        &self,
        actor: Actor,
        params: PaginationParams,
    ) -> AppResult<Paginated<UserWithHours>> {
        require_role(&actor, &[Role::Coordinator])?;

        self.uow
            .read(move |tx| {
                Box::pin(async move {
                    let (users, total) = tx.users().list(&params).await?;
                    let ids: Vec<Uuid> = users.iter().map(|u| u.id).collect();
                    let minutes: HashMap<Uuid, i64> =
                        tx.work_logs().minutes_by_user(&ids).await?.into_iter().collect();

                    let rows = users
                        .into_iter()
                        .map(|user| {
                            let logged = minutes.get(&user.id).copied().unwrap_or(0);
                            UserWithHours {
                                user: UserResponse::from(user),
                                total_hours: round_one_decimal(logged as f64 / 60.0),
                            }
                        })
                        .collect();
                    Ok(Paginated::new(rows, params.page(), params.limit(), total))
                })
            })
            .await
    }

    async fn get(&self, actor: Actor, id: Uuid) -> AppResult<User> {
        require_role(&actor, &[Role::Coordinator])?;
        self.uow
            .read(move |tx| {
                Box::pin(async move { tx.users().find_by_id(id).await?.ok_or_not_found("User") })
            })
            .await
    }

    async fn create(&self, actor: Actor, input: CreateUser) -> AppResult<User> {
        require_role(&actor, &[Role::Coordinator])?;

        let password_hash = Password::unusable()?.into_string();
        let token = generate_reset_token();
        let expires_at = Utc::now() + Duration::hours(WELCOME_RESET_EXPIRATION_HOURS);

        let stored = token.clone();
        let user = self
            .uow
            .transaction(move |tx| {
                Box::pin(async move {
                    if tx.users().find_by_email(&input.email).await?.is_some() {
                        return Err(AppError::conflict("Email already registered"));
                    }
                    let user = tx
                        .users()
                        .create(NewUser {
                            name: input.name,
                            email: input.email,
                            password_hash,
                            role: input.role,
                            phone: input.phone,
                            city: input.city,
                            country: input.country,
                        })
                        .await?;
                    tx.tokens().create_reset(user.id, stored, expires_at).await?;
                    Ok(user)
                })
            })
            .await?;

        tracing::info!(user_id = %user.id, role = %user.role, created_by = %actor.id, "User created");
        if let Err(e) = self.email.send_welcome(&user.email, &user.name, &token).await {
            tracing::warn!(user_id = %user.id, error = %e, "Welcome e-mail not sent");
        }
        Ok(user)
    }

    async fn update(&self, actor: Actor, id: Uuid, input: UpdateUser) -> AppResult<User> {
        require_role(&actor, &[Role::Coordinator])?;
        if actor.id == id && input.removes_own_access() {
            return Err(AppError::conflict(
                "You cannot deactivate or demote your own account",
            ));
        }

        let user = self
            .uow
            .transaction(move |tx| Box::pin(async move { tx.users().update(id, input.into()).await }))
            .await?;

        tracing::info!(user_id = %user.id, updated_by = %actor.id, "User updated");
        Ok(user)
    }
}
