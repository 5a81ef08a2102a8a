//! Role scoping shared by the listing and statistics services.

use crate::domain::{Actor, Role, Visibility};
use crate::errors::AppResult;
use crate::infra::TransactionContext;

/// Projects the actor may see: everything for coordinators, managed projects
/// for project managers, joined projects for everyone else.
pub(crate) async fn visibility_for(
    tx: TransactionContext<'_>,
    actor: &Actor,
) -> AppResult<Visibility> {
    let ids = match actor.role {
        Role::Coordinator => return Ok(Visibility::All),
        Role::ProjectManager => tx.projects().ids_managed_by(actor.id).await?,
        Role::Volunteer | Role::Legal => tx.projects().ids_joined_by(actor.id).await?,
    };
    Ok(Visibility::Projects(ids))
}
