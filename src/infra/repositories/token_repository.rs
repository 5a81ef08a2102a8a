//! Refresh-token and password-reset-token storage.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter,
    QuerySelect, Set,
};
use uuid::Uuid;

use super::entities::password_reset_token::{self, Entity as ResetEntity};
use super::entities::refresh_token::{self, Entity as RefreshEntity};
use crate::domain::{PasswordResetToken, RefreshToken};
use crate::errors::AppResult;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait TokenRepository: Send + Sync {
    async fn store_refresh(
        &self,
        user_id: Uuid,
        token: String,
        expires_at: DateTime<Utc>,
    ) -> AppResult<RefreshToken>;

    async fn find_refresh(&self, token: &str) -> AppResult<Option<RefreshToken>>;

    /// `false` when the token is unknown or already revoked.
    async fn revoke_refresh(&self, token: &str) -> AppResult<bool>;

    async fn revoke_all_for_user(&self, user_id: Uuid) -> AppResult<u64>;

    async fn create_reset(
        &self,
        user_id: Uuid,
        token: String,
        expires_at: DateTime<Utc>,
    ) -> AppResult<PasswordResetToken>;

    /// Lock the reset token row until the transaction ends.
    async fn find_reset_for_update(&self, token: &str) -> AppResult<Option<PasswordResetToken>>;

    /// Mark every unused reset token of the user as used.
    async fn consume_resets_for_user(&self, user_id: Uuid) -> AppResult<u64>;
}

pub struct TokenStore<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> TokenStore<'a> {
    pub fn new(txn: &'a DatabaseTransaction) -> Self {
        Self { txn }
    }
}

#[async_trait]
impl TokenRepository for TokenStore<'_> {
    async fn store_refresh(
        &self,
        user_id: Uuid,
        token: String,
        expires_at: DateTime<Utc>,
    ) -> AppResult<RefreshToken> {
        let model = refresh_token::ActiveModel {
            id: Set(Uuid::new_v4()),
            token: Set(token),
            user_id: Set(user_id),
            revoked: Set(false),
            expires_at: Set(expires_at),
            created_at: Set(Utc::now()),
        }
        .insert(self.txn)
        .await?;
        Ok(RefreshToken::from(model))
    }

    async fn find_refresh(&self, token: &str) -> AppResult<Option<RefreshToken>> {
        let model = RefreshEntity::find()
            .filter(refresh_token::Column::Token.eq(token))
            .one(self.txn)
            .await?;
        Ok(model.map(RefreshToken::from))
    }

    async fn revoke_refresh(&self, token: &str) -> AppResult<bool> {
        let result = RefreshEntity::update_many()
            .col_expr(refresh_token::Column::Revoked, Expr::value(true))
            .filter(refresh_token::Column::Token.eq(token))
            .filter(refresh_token::Column::Revoked.eq(false))
            .exec(self.txn)
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn revoke_all_for_user(&self, user_id: Uuid) -> AppResult<u64> {
        let result = RefreshEntity::update_many()
            .col_expr(refresh_token::Column::Revoked, Expr::value(true))
            .filter(refresh_token::Column::UserId.eq(user_id))
            .filter(refresh_token::Column::Revoked.eq(false))
            .exec(self.txn)
            .await?;
        Ok(result.rows_affected)
    }

    async fn create_reset(
        &self,
        user_id: Uuid,
        token: String,
        expires_at: DateTime<Utc>,
    ) -> AppResult<PasswordResetToken> {
        let model = password_reset_token::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            token: Set(token),
            expires_at: Set(expires_at),
            used: Set(false),
            created_at: Set(Utc::now()),
        }
        .insert(self.txn)
        .await?;
        Ok(PasswordResetToken::from(model))
    }

    async fn find_reset_for_update(&self, token: &str) -> AppResult<Option<PasswordResetToken>> {
        let model = ResetEntity::find()
            .filter(password_reset_token::Column::Token.eq(token))
            .lock_exclusive()
            .one(self.txn)
            .await?;
        Ok(model.map(PasswordResetToken::from))
    }

    async fn consume_resets_for_user(&self, user_id: Uuid) -> AppResult<u64> {
        let result = ResetEntity::update_many()
            .col_expr(password_reset_token::Column::Used, Expr::value(true))
            .filter(password_reset_token::Column::UserId.eq(user_id))
            .filter(password_reset_token::Column::Used.eq(false))
            .exec(self.txn)
            .await?;
        Ok(result.rows_affected)
    }
}
