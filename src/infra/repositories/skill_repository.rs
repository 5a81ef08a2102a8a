//! Skill catalog repository.

use async_trait::async_trait;
use sea_orm::{
    sea_query::OnConflict, ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use super::entities::skill::{self, ActiveModel, Entity as SkillEntity};
use super::entities::skill_volunteer::{
    self, ActiveModel as AssignmentActiveModel, Entity as AssignmentEntity,
};
use crate::domain::Skill;
use crate::errors::{AppResult, OptionExt};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait SkillRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Skill>>;

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Skill>>;

    async fn create(&self, name: String, created_by: Uuid) -> AppResult<Skill>;

    async fn rename(&self, id: Uuid, name: String) -> AppResult<Skill>;

    async fn delete(&self, id: Uuid) -> AppResult<bool>;

    async fn list(&self) -> AppResult<Vec<Skill>>;

    /// Every (skill_id, user_id) pair.
    async fn assignments(&self) -> AppResult<Vec<(Uuid, Uuid)>>;

    /// No-op when already assigned.
    async fn assign(&self, skill_id: Uuid, user_id: Uuid) -> AppResult<()>;

    async fn unassign(&self, skill_id: Uuid, user_id: Uuid) -> AppResult<bool>;
}

pub struct SkillStore<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> SkillStore<'a> {
    pub fn new(txn: &'a DatabaseTransaction) -> Self {
        Self { txn }
    }
}

#[async_trait]
impl SkillRepository for SkillStore<'_> {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Skill>> {
        Ok(SkillEntity::find_by_id(id).one(self.txn).await?.map(Skill::from))
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Skill>> {
        let model = SkillEntity::find()
            .filter(skill::Column::Name.eq(name))
            .one(self.txn)
            .await?;
        Ok(model.map(Skill::from))
    }

    async fn create(&self, name: String, created_by: Uuid) -> AppResult<Skill> {
        let model = ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            created_by: Set(created_by),
            created_at: Set(chrono::Utc::now()),
        }
        .insert(self.txn)
        .await?;
        Ok(Skill::from(model))
    }

    async fn rename(&self, id: Uuid, name: String) -> AppResult<Skill> {
        let model = SkillEntity::find_by_id(id)
            .one(self.txn)
            .await?
            .ok_or_not_found("Skill")?;
        let mut active: ActiveModel = model.into();
        active.name = Set(name);
        Ok(Skill::from(active.update(self.txn).await?))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = SkillEntity::delete_by_id(id).exec(self.txn).await?;
        Ok(result.rows_affected > 0)
    }

    async fn list(&self) -> AppResult<Vec<Skill>> {
        let models = SkillEntity::find()
            .order_by_asc(skill::Column::Name)
            .all(self.txn)
            .await?;
        Ok(models.into_iter().map(Skill::from).collect())
    }

    async fn assignments(&self) -> AppResult<Vec<(Uuid, Uuid)>> {
        let rows = AssignmentEntity::find().all(self.txn).await?;
        Ok(rows.into_iter().map(|r| (r.skill_id, r.user_id)).collect())
    }

    async fn assign(&self, skill_id: Uuid, user_id: Uuid) -> AppResult<()> {
        let row = AssignmentActiveModel {
            skill_id: Set(skill_id),
            user_id: Set(user_id),
        };
        AssignmentEntity::insert(row)
            .on_conflict(
                OnConflict::columns([
                    skill_volunteer::Column::SkillId,
                    skill_volunteer::Column::UserId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(self.txn)
            .await?;
        Ok(())
    }

    async fn unassign(&self, skill_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let result = AssignmentEntity::delete_by_id((skill_id, user_id))
            .exec(self.txn)
            .await?;
        Ok(result.rows_affected > 0)
    }
}
