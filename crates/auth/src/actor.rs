use serde::{Deserialize, Serialize};

use coursehub_core::{OrganizationId, UserId};

use crate::Role;

/// A fully resolved, active identity for authorization decisions.
///
/// Construction is the job of the session resolver: an `Actor` only exists for
/// an authenticated user whose account is ACTIVE. Inactive accounts are treated
/// as unauthenticated and never reach this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: UserId,
    pub role: Role,
    /// Present iff `role` is [`Role::OrganizationAdmin`] (may also be set for
    /// advocates affiliated with an organization).
    pub organization_id: Option<OrganizationId>,
}

impl Actor {
    pub fn new(user_id: UserId, role: Role, organization_id: Option<OrganizationId>) -> Self {
        Self {
            user_id,
            role,
            organization_id,
        }
    }

    pub fn is_platform_admin(&self) -> bool {
        self.role == Role::PlatformAdmin
    }
}
