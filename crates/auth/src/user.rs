//! User identity records and sign-up invitations.
//!
//! Users are created on first successful sign-in when a matching open
//! invitation exists; role and organization are fixed at creation and mutable
//! only by a platform admin.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use coursehub_core::{DomainError, DomainResult, InviteId, OrganizationId, UserId};

use crate::{Actor, Role};

/// User account status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    #[default]
    Active,
    /// Treated as unauthenticated for all protected operations.
    Inactive,
}

/// Identity record.
///
/// # Invariants
/// - `email` is unique (lowercased at creation).
/// - `organization_id` is required iff `role` is [`Role::OrganizationAdmin`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    pub organization_id: Option<OrganizationId>,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl User {
    /// Create a user from an accepted invitation.
    pub fn from_invite(invite: &Invite, display_name: String, now: DateTime<Utc>) -> Self {
        Self {
            id: UserId::new(),
            email: invite.email.clone(),
            display_name,
            role: invite.role,
            organization_id: invite.organization_id,
            status: UserStatus::Active,
            created_at: now,
            last_login_at: Some(now),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }

    /// The authorization identity of this user, if the account is active.
    pub fn actor(&self) -> Option<Actor> {
        if self.is_active() {
            Some(Actor::new(self.id, self.role, self.organization_id))
        } else {
            None
        }
    }
}

/// Validate the role/organization pairing at creation or role change.
pub fn validate_role_assignment(
    role: Role,
    organization_id: Option<OrganizationId>,
) -> DomainResult<()> {
    match (role, organization_id) {
        (Role::OrganizationAdmin, None) => Err(DomainError::validation(
            "organization admin requires an organization",
        )),
        _ => Ok(()),
    }
}

/// Pre-authorization record: an email allowed to sign in with a fixed role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invite {
    pub id: InviteId,
    /// Stored lowercased; matched against the verified email from the token.
    pub email: String,
    pub role: Role,
    pub organization_id: Option<OrganizationId>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
}

impl Invite {
    pub fn is_open(&self) -> bool {
        self.accepted_at.is_none()
    }
}
