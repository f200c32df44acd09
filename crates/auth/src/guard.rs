//! Centralized authorization predicate.
//!
//! Every mutating or resource-scoped read goes through [`ensure`] before any
//! store access. The rules here are the complete policy; no endpoint carries
//! its own role checks.

use coursehub_core::{DomainError, DomainResult, OrganizationId, UserId};

use crate::{Actor, Role};

/// What the actor is trying to do with a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Read a non-public, resource-scoped record.
    Read,
    /// Create a resource within the given scope.
    Create,
    /// Mutate fields of an existing resource.
    Edit,
    /// Remove a resource.
    Delete,
    /// Approve or reject a pending submission.
    Review,
    /// Administer user accounts and invitations.
    ManageUsers,
}

/// Ownership coordinates of the resource being touched.
///
/// A scope with neither field set is reachable only by a platform admin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Scope {
    pub organization_id: Option<OrganizationId>,
    pub created_by: Option<UserId>,
}

impl Scope {
    pub fn organization(organization_id: Option<OrganizationId>) -> Self {
        Self {
            organization_id,
            created_by: None,
        }
    }

    pub fn owned(created_by: UserId, organization_id: Option<OrganizationId>) -> Self {
        Self {
            organization_id,
            created_by: Some(created_by),
        }
    }

    /// Platform-wide scope: only platform admins pass.
    pub fn platform() -> Self {
        Self::default()
    }
}

/// Pure authorization predicate.
///
/// - No IO
/// - No panics
/// - No business logic (state-machine rules live with the entities)
pub fn can_perform(actor: &Actor, action: Action, scope: &Scope) -> bool {
    match actor.role {
        // Unconditional access to all resources and actions.
        Role::PlatformAdmin => true,

        // Access only within the actor's own organization, including review
        // and user management for that organization.
        Role::OrganizationAdmin => match (actor.organization_id, scope.organization_id) {
            (Some(own), Some(target)) => own == target,
            _ => false,
        },

        // Access only to resources the actor authored; never review, never
        // user management.
        Role::YouthAdvocate => match action {
            Action::Review | Action::ManageUsers => false,
            Action::Read | Action::Create | Action::Edit | Action::Delete => {
                scope.created_by == Some(actor.user_id)
            }
        },
    }
}

/// [`can_perform`] lifted into the domain error taxonomy.
pub fn ensure(actor: &Actor, action: Action, scope: &Scope) -> DomainResult<()> {
    if can_perform(actor, action, scope) {
        Ok(())
    } else {
        Err(DomainError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coursehub_core::{OrganizationId, UserId};

    fn platform_admin() -> Actor {
        Actor::new(UserId::new(), Role::PlatformAdmin, None)
    }

    fn org_admin(org: OrganizationId) -> Actor {
        Actor::new(UserId::new(), Role::OrganizationAdmin, Some(org))
    }

    fn advocate() -> Actor {
        Actor::new(UserId::new(), Role::YouthAdvocate, None)
    }

    #[test]
    fn platform_admin_passes_everything() {
        let actor = platform_admin();
        for action in [
            Action::Read,
            Action::Create,
            Action::Edit,
            Action::Delete,
            Action::Review,
            Action::ManageUsers,
        ] {
            assert!(can_perform(&actor, action, &Scope::platform()));
            assert!(can_perform(
                &actor,
                action,
                &Scope::owned(UserId::new(), Some(OrganizationId::new()))
            ));
        }
    }

    #[test]
    fn org_admin_scoped_to_own_organization() {
        let org = OrganizationId::new();
        let actor = org_admin(org);

        assert!(can_perform(&actor, Action::Edit, &Scope::organization(Some(org))));
        assert!(can_perform(&actor, Action::Review, &Scope::organization(Some(org))));
        assert!(can_perform(&actor, Action::ManageUsers, &Scope::organization(Some(org))));

        let other = OrganizationId::new();
        assert!(!can_perform(&actor, Action::Edit, &Scope::organization(Some(other))));
        assert!(!can_perform(&actor, Action::Review, &Scope::organization(Some(other))));
        // Resources with no organization are out of reach for org admins.
        assert!(!can_perform(&actor, Action::Read, &Scope::organization(None)));
        assert!(!can_perform(&actor, Action::Edit, &Scope::platform()));
    }

    #[test]
    fn advocate_limited_to_own_resources() {
        let actor = advocate();
        let own = Scope::owned(actor.user_id, None);
        let someone_elses = Scope::owned(UserId::new(), None);

        assert!(can_perform(&actor, Action::Read, &own));
        assert!(can_perform(&actor, Action::Create, &own));
        assert!(can_perform(&actor, Action::Edit, &own));
        assert!(can_perform(&actor, Action::Delete, &own));
        assert!(!can_perform(&actor, Action::Edit, &someone_elses));
    }

    #[test]
    fn advocate_never_reviews_or_manages_users() {
        let actor = advocate();
        let own = Scope::owned(actor.user_id, None);
        assert!(!can_perform(&actor, Action::Review, &own));
        assert!(!can_perform(&actor, Action::ManageUsers, &own));
    }

    #[test]
    fn ensure_maps_denial_to_forbidden() {
        let actor = advocate();
        let err = ensure(&actor, Action::Review, &Scope::platform()).unwrap_err();
        assert_eq!(err, DomainError::Forbidden);
    }
}
