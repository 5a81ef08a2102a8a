use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::policy::require_role;
use crate::domain::{Actor, Role, Skill, SkillEntry, UserSummary};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::{TransactionContext, UnitOfWork};

#[async_trait]
pub trait SkillService: Send + Sync {
    /// Every skill with the users holding it. Public.
    async fn list(&self) -> AppResult<Vec<SkillEntry>>;

    async fn create(&self, actor: Actor, name: String) -> AppResult<Skill>;

    async fn rename(&self, actor: Actor, id: Uuid, name: String) -> AppResult<Skill>;

    async fn delete(&self, actor: Actor, id: Uuid) -> AppResult<()>;

    async fn assign(&self, actor: Actor, id: Uuid, user_id: Uuid) -> AppResult<()>;

    async fn unassign(&self, actor: Actor, id: Uuid, user_id: Uuid) -> AppResult<()>;
}

async fn ensure_unique_name(
    tx: TransactionContext<'_>,
    name: &str,
    except: Option<Uuid>,
) -> AppResult<()> {
    match tx.skills().find_by_name(name).await? {
        Some(existing) if Some(existing.id) != except => {
            Err(AppError::conflict("A skill with this name already exists"))
        }
        _ => Ok(()),
    }
}

pub struct SkillCatalog<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> SkillCatalog<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl<U: UnitOfWork> SkillService for SkillCatalog<U> {
    async fn list(&self) -> AppResult<Vec<SkillEntry>> {
        self.uow
            .read(|tx| {
                Box::pin(async move {
                    let skills = tx.skills().list().await?;
                    let assignments = tx.skills().assignments().await?;

                    let mut user_ids: Vec<Uuid> = assignments.iter().map(|(_, u)| *u).collect();
                    user_ids.sort();
                    user_ids.dedup();
                    let users: HashMap<Uuid, UserSummary> = tx
                        .users()
                        .find_by_ids(&user_ids)
                        .await?
                        .into_iter()
                        .map(|u| (u.id, u.summary()))
                        .collect();

                    let mut holders: HashMap<Uuid, Vec<UserSummary>> = HashMap::new();
                    for (skill_id, user_id) in assignments {
                        if let Some(user) = users.get(&user_id) {
                            holders.entry(skill_id).or_default().push(user.clone());
                        }
                    }

                    Ok(skills
                        .into_iter()
                        .map(|skill| SkillEntry {
                            volunteers: holders.remove(&skill.id).unwrap_or_default(),
                            skill,
                        })
                        .collect())
                })
            })
            .await
    }

    async fn create(&self, actor: Actor, name: String) -> AppResult<Skill> {
        require_role(&actor, &[Role::Coordinator])?;
        let name = name.trim().to_string();

        let skill = self
            .uow
            .transaction(move |tx| {
                Box::pin(async move {
                    ensure_unique_name(tx, &name, None).await?;
                    tx.skills().create(name, actor.id).await
                })
            })
            .await?;

        tracing::info!(skill_id = %skill.id, created_by = %actor.id, "Skill created");
        Ok(skill)
    }

    async fn rename(&self, actor: Actor, id: Uuid, name: String) -> AppResult<Skill> {
        require_role(&actor, &[Role::Coordinator])?;
        let name = name.trim().to_string();

        let skill = self
            .uow
            .transaction(move |tx| {
                Box::pin(async move {
                    tx.skills().find_by_id(id).await?.ok_or_not_found("Skill")?;
                    ensure_unique_name(tx, &name, Some(id)).await?;
                    tx.skills().rename(id, name).await
                })
            })
            .await?;

        tracing::info!(skill_id = %skill.id, updated_by = %actor.id, "Skill renamed");
        Ok(skill)
    }

    async fn delete(&self, actor: Actor, id: Uuid) -> AppResult<()> {
        require_role(&actor, &[Role::Coordinator])?;

        self.uow
            .transaction(move |tx| {
                Box::pin(async move {
                    if !tx.skills().delete(id).await? {
                        return Err(AppError::not_found("Skill not found"));
                    }
                    Ok(())
                })
            })
            .await?;

        tracing::info!(skill_id = %id, deleted_by = %actor.id, "Skill deleted");
        Ok(())
    }

    async fn assign(&self, actor: Actor, id: Uuid, user_id: Uuid) -> AppResult<()> {
        require_role(&actor, &[Role::Coordinator])?;

        self.uow
            .transaction(move |tx| {
                Box::pin(async move {
                    tx.skills().find_by_id(id).await?.ok_or_not_found("Skill")?;
                    tx.users().find_by_id(user_id).await?.ok_or_not_found("User")?;
                    tx.skills().assign(id, user_id).await
                })
            })
            .await?;

        tracing::info!(skill_id = %id, user_id = %user_id, "Skill assigned");
        Ok(())
    }

    async fn unassign(&self, actor: Actor, id: Uuid, user_id: Uuid) -> AppResult<()> {
        require_role(&actor, &[Role::Coordinator])?;

        self.uow
            .transaction(move |tx| {
                Box::pin(async move {
                    tx.skills().find_by_id(id).await?.ok_or_not_found("Skill")?;
                    if !tx.skills().unassign(id, user_id).await? {
                        return Err(AppError::not_found("User does not hold this skill"));
                    }
                    Ok(())
                })
            })
            .await?;

        tracing::info!(skill_id = %id, user_id = %user_id, "Skill unassigned");
        Ok(())
    }
}
