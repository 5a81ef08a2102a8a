//! Authorization rule evaluator.
//!
//! Every resource-scoped permission check goes through [`decide`], a pure
//! function of (actor, action, target). Services fetch the target, evaluate
//! the policy and only then write, all inside one transaction.

use uuid::Uuid;

use super::role::{Actor, Role};
use crate::errors::{AppError, AppResult};

/// Operations subject to resource-scoped authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CreateProject,
    UpdateProject,
    ChangeProjectManager,
    DeleteProject,
    AddProjectVolunteer,
    RemoveProjectVolunteer,
    CreateActivity,
    UpdateActivity,
    DeleteActivity,
    MoveActivity,
    AssignActivityVolunteer,
    UnassignActivityVolunteer,
    ApproveWorkLog,
    UnapproveWorkLog,
}

impl Action {
    fn denial(&self) -> &'static str {
        match self {
            Action::CreateProject => "Project managers can only create projects they manage",
            Action::UpdateProject => "Only the project's manager or a coordinator can update it",
            Action::ChangeProjectManager => {
                "Only the current manager or a coordinator can change the project manager"
            }
            Action::DeleteProject => "Only coordinators can delete projects",
            Action::AddProjectVolunteer | Action::RemoveProjectVolunteer => {
                "Only the project's manager or a coordinator can manage its volunteers"
            }
            Action::CreateActivity | Action::UpdateActivity | Action::DeleteActivity => {
                "Only the project's manager or a coordinator can manage its activities"
            }
            Action::MoveActivity => "Only coordinators can move an activity to another project",
            Action::AssignActivityVolunteer | Action::UnassignActivityVolunteer => {
                "Only the project's manager or a coordinator can assign volunteers"
            }
            Action::ApproveWorkLog | Action::UnapproveWorkLog => {
                "Only the managing project manager or a coordinator can review this work log"
            }
        }
    }

    fn coordinator_only(&self) -> bool {
        matches!(self, Action::DeleteProject | Action::MoveActivity)
    }
}

/// What the policy needs to know about the resource being acted on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Target {
    /// Manager of the project that owns the resource, if any.
    pub manager_id: Option<Uuid>,
}

impl Target {
    pub fn managed_by(manager_id: Option<Uuid>) -> Self {
        Self { manager_id }
    }

    /// A resource with no managing project (coordinator-only territory).
    pub fn unmanaged() -> Self {
        Self { manager_id: None }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(&'static str),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Evaluate the decision table.
///
/// For `CreateProject` the target's manager is the manager named in the
/// request; for every other action it is the current manager of the owning
/// project.
pub fn decide(actor: &Actor, action: Action, target: &Target) -> Decision {
    match actor.role {
        Role::Coordinator => Decision::Allow,
        Role::ProjectManager if !action.coordinator_only() => {
            if target.manager_id == Some(actor.id) {
                Decision::Allow
            } else {
                Decision::Deny(action.denial())
            }
        }
        Role::ProjectManager | Role::Volunteer | Role::Legal => Decision::Deny(action.denial()),
    }
}

/// [`decide`], mapping a denial to `Forbidden`.
pub fn authorize(actor: &Actor, action: Action, target: &Target) -> AppResult<()> {
    match decide(actor, action, target) {
        Decision::Allow => Ok(()),
        Decision::Deny(reason) => {
            tracing::debug!(actor_id = %actor.id, role = %actor.role, ?action, "Authorization denied");
            Err(AppError::forbidden(reason))
        }
    }
}

/// Removing the last remaining volunteer of a project is reserved to coordinators.
pub fn ensure_volunteer_removable(actor: &Actor, current_volunteers: u64) -> AppResult<()> {
    if current_volunteers <= 1 && !actor.is_coordinator() {
        return Err(AppError::conflict(
            "Cannot remove the last volunteer of a project; ask a coordinator",
        ));
    }
    Ok(())
}

/// Require one of the given roles (route-level allow list).
pub fn require_role(actor: &Actor, allowed: &[Role]) -> AppResult<()> {
    if allowed.contains(&actor.role) {
        Ok(())
    } else {
        Err(AppError::forbidden("Insufficient permissions"))
    }
}

/// Coordinators and legal staff see every document.
pub fn can_view_all_documents(actor: &Actor) -> bool {
    matches!(actor.role, Role::Coordinator | Role::Legal)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_ACTIONS: [Action; 14] = [
        Action::CreateProject,
        Action::UpdateProject,
        Action::ChangeProjectManager,
        Action::DeleteProject,
        Action::AddProjectVolunteer,
        Action::RemoveProjectVolunteer,
        Action::CreateActivity,
        Action::UpdateActivity,
        Action::DeleteActivity,
        Action::MoveActivity,
        Action::AssignActivityVolunteer,
        Action::UnassignActivityVolunteer,
        Action::ApproveWorkLog,
        Action::UnapproveWorkLog,
    ];

    fn actor(role: Role) -> Actor {
        Actor::new(Uuid::new_v4(), role)
    }

    #[test]
    fn coordinator_is_always_allowed() {
        let coordinator = actor(Role::Coordinator);
        for action in ALL_ACTIONS {
            assert!(decide(&coordinator, action, &Target::unmanaged()).is_allowed());
            assert!(decide(&coordinator, action, &Target::managed_by(Some(Uuid::new_v4()))).is_allowed());
        }
    }

    #[test]
    fn volunteer_and_legal_are_always_denied() {
        for role in [Role::Volunteer, Role::Legal] {
            let someone = actor(role);
            let own = Target::managed_by(Some(someone.id));
            for action in ALL_ACTIONS {
                assert!(!decide(&someone, action, &own).is_allowed(), "{:?} {:?}", role, action);
            }
        }
    }

    #[test]
    fn project_manager_is_scoped_to_own_project() {
        let manager = actor(Role::ProjectManager);
        let own = Target::managed_by(Some(manager.id));
        let other = Target::managed_by(Some(Uuid::new_v4()));

        for action in ALL_ACTIONS {
            let expected = !matches!(action, Action::DeleteProject | Action::MoveActivity);
            assert_eq!(decide(&manager, action, &own).is_allowed(), expected, "{:?}", action);
            assert!(!decide(&manager, action, &other).is_allowed(), "{:?}", action);
            assert!(!decide(&manager, action, &Target::unmanaged()).is_allowed());
        }
    }

    #[test]
    fn denial_maps_to_forbidden() {
        let volunteer = actor(Role::Volunteer);
        let err = authorize(&volunteer, Action::CreateActivity, &Target::unmanaged()).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn last_volunteer_rule() {
        let manager = actor(Role::ProjectManager);
        let coordinator = actor(Role::Coordinator);

        assert!(matches!(
            ensure_volunteer_removable(&manager, 1),
            Err(AppError::Conflict(_))
        ));
        assert!(ensure_volunteer_removable(&manager, 2).is_ok());
        assert!(ensure_volunteer_removable(&coordinator, 1).is_ok());
    }

    #[test]
    fn document_visibility() {
        assert!(can_view_all_documents(&actor(Role::Legal)));
        assert!(can_view_all_documents(&actor(Role::Coordinator)));
        assert!(!can_view_all_documents(&actor(Role::ProjectManager)));
    }
}
