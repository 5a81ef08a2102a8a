//! User repository.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use super::entities::user::{self, ActiveModel, Entity as UserEntity};
use crate::domain::{NewUser, Role, User, UserChanges};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::types::PaginationParams;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Emails are matched case-insensitively.
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    async fn find_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<User>>;

    async fn create(&self, user: NewUser) -> AppResult<User>;

    /// Apply the set fields of `changes`; `NotFound` when the user is absent.
    async fn update(&self, id: Uuid, changes: UserChanges) -> AppResult<User>;

    /// One page ordered by name, with the total row count.
    async fn list(&self, params: &PaginationParams) -> AppResult<(Vec<User>, u64)>;

    async fn count_active_by_role(&self, role: Role) -> AppResult<u64>;

    async fn active_ids_by_role(&self, role: Role) -> AppResult<Vec<Uuid>>;
}

pub struct UserStore<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> UserStore<'a> {
    pub fn new(txn: &'a DatabaseTransaction) -> Self {
        Self { txn }
    }
}

#[async_trait]
impl UserRepository for UserStore<'_> {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let result = UserEntity::find_by_id(id).one(self.txn).await?;
        Ok(result.map(User::from))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email.trim().to_lowercase()))
            .one(self.txn)
            .await?;
        Ok(result.map(User::from))
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let models = UserEntity::find()
            .filter(user::Column::Id.is_in(ids.iter().copied()))
            .order_by_asc(user::Column::Name)
            .all(self.txn)
            .await?;
        Ok(models.into_iter().map(User::from).collect())
    }

    async fn create(&self, new_user: NewUser) -> AppResult<User> {
        let now = chrono::Utc::now();
        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(new_user.name),
            email: Set(new_user.email.trim().to_lowercase()),
            password_hash: Set(new_user.password_hash),
            role: Set(new_user.role.as_str().to_string()),
            is_active: Set(true),
            phone: Set(new_user.phone),
            city: Set(new_user.city),
            country: Set(new_user.country),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active_model.insert(self.txn).await?;
        Ok(User::from(model))
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> AppResult<User> {
        let user = UserEntity::find_by_id(id)
            .one(self.txn)
            .await?
            .ok_or_not_found("User")?;

        let mut active: ActiveModel = user.into();
        if let Some(name) = changes.name {
            active.name = Set(name);
        }
        if let Some(role) = changes.role {
            active.role = Set(role.as_str().to_string());
        }
        if let Some(is_active) = changes.is_active {
            active.is_active = Set(is_active);
        }
        if let Some(password_hash) = changes.password_hash {
            active.password_hash = Set(password_hash);
        }
        if let Some(phone) = changes.phone {
            active.phone = Set(phone);
        }
        if let Some(city) = changes.city {
            active.city = Set(city);
        }
        if let Some(country) = changes.country {
            active.country = Set(country);
        }
        active.updated_at = Set(chrono::Utc::now());

        let model = active.update(self.txn).await.map_err(AppError::from)?;
        Ok(User::from(model))
    }

    async fn list(&self, params: &PaginationParams) -> AppResult<(Vec<User>, u64)> {
        let paginator = UserEntity::find()
            .order_by_asc(user::Column::Name)
            .paginate(self.txn, params.limit());
        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(params.page() - 1).await?;
        Ok((models.into_iter().map(User::from).collect(), total))
    }

    async fn count_active_by_role(&self, role: Role) -> AppResult<u64> {
        let count = UserEntity::find()
            .filter(user::Column::Role.eq(role.as_str()))
            .filter(user::Column::IsActive.eq(true))
            .count(self.txn)
            .await?;
        Ok(count)
    }

    async fn active_ids_by_role(&self, role: Role) -> AppResult<Vec<Uuid>> {
        let ids = UserEntity::find()
            .select_only()
            .column(user::Column::Id)
            .filter(user::Column::Role.eq(role.as_str()))
            .filter(user::Column::IsActive.eq(true))
            .into_tuple::<Uuid>()
            .all(self.txn)
            .await?;
        Ok(ids)
    }
}
