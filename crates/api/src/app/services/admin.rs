//! User, invitation, and organization administration.
//!
//! Everything here runs under [`Action::ManageUsers`] or an organization
//! scope, plus the self-protection rules: no self-demotion or
//! self-deactivation, and the last active platform admin is untouchable.

use chrono::{DateTime, Utc};

use coursehub_auth::{
    can_perform, ensure, validate_role_assignment, Action, Actor, Invite, Role, Scope, User,
    UserStatus,
};
use coursehub_catalog::Organization;
use coursehub_core::{DomainError, DomainResult, InviteId, OrganizationId, UserId};
use coursehub_review::OrganizationContent;

use crate::app::dto::{ChangeRoleRequest, InviteRequest};

use super::Stores;

pub struct AdminService {
    stores: Stores,
}

impl AdminService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    // ───── users & invitations ─────

    pub async fn list_users(&self, actor: &Actor) -> DomainResult<Vec<User>> {
        if can_perform(actor, Action::ManageUsers, &Scope::platform()) {
            return self.stores.users.list_users().await;
        }

        ensure(
            actor,
            Action::ManageUsers,
            &Scope::organization(actor.organization_id),
        )?;
        let org = actor.organization_id.ok_or(DomainError::Forbidden)?;
        self.stores.users.list_users_by_organization(org).await
    }

    pub async fn invite(
        &self,
        actor: &Actor,
        req: InviteRequest,
        now: DateTime<Utc>,
    ) -> DomainResult<Invite> {
        let email = req.email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(DomainError::validation("a valid email is required"));
        }
        validate_role_assignment(req.role, req.organization_id)?;

        ensure(
            actor,
            Action::ManageUsers,
            &Scope::organization(req.organization_id),
        )?;
        // Platform-admin accounts are granted only by platform admins.
        if req.role == Role::PlatformAdmin {
            ensure(actor, Action::ManageUsers, &Scope::platform())?;
        }

        if self.stores.users.get_user_by_email(&email).await?.is_some() {
            return Err(DomainError::conflict("email already registered"));
        }

        let invite = Invite {
            id: InviteId::new(),
            email,
            role: req.role,
            organization_id: req.organization_id,
            created_by: actor.user_id,
            created_at: now,
            accepted_at: None,
        };
        self.stores.invites.insert_invite(invite.clone()).await?;

        tracing::info!(invite_id = %invite.id, role = %invite.role, "invitation created");
        Ok(invite)
    }

    pub async fn list_invites(&self, actor: &Actor) -> DomainResult<Vec<Invite>> {
        ensure(
            actor,
            Action::ManageUsers,
            &Scope::organization(actor.organization_id),
        )?;

        let invites = self.stores.invites.list_invites().await?;
        Ok(invites
            .into_iter()
            .filter(|i| {
                can_perform(
                    actor,
                    Action::ManageUsers,
                    &Scope::organization(i.organization_id),
                )
            })
            .collect())
    }

    pub async fn change_role(
        &self,
        actor: &Actor,
        user_id: UserId,
        req: ChangeRoleRequest,
    ) -> DomainResult<User> {
        let mut target = self.load_user(user_id).await?;
        // Authority over both the user's current organization and the one the
        // request would move them into.
        ensure(
            actor,
            Action::ManageUsers,
            &Scope::organization(target.organization_id),
        )?;
        ensure(
            actor,
            Action::ManageUsers,
            &Scope::organization(req.organization_id),
        )?;
        validate_role_assignment(req.role, req.organization_id)?;
        if req.role == Role::PlatformAdmin {
            ensure(actor, Action::ManageUsers, &Scope::platform())?;
        }

        // Self-protection: nobody rewrites their own authority.
        if actor.user_id == target.id {
            return Err(DomainError::Forbidden);
        }
        if target.role == Role::PlatformAdmin
            && req.role != Role::PlatformAdmin
            && target.is_active()
            && self.stores.users.count_active_platform_admins().await? <= 1
        {
            return Err(DomainError::conflict(
                "cannot demote the last active platform admin",
            ));
        }

        target.role = req.role;
        target.organization_id = req.organization_id;
        self.stores.users.update_user(&target).await?;
        Ok(target)
    }

    pub async fn deactivate_user(&self, actor: &Actor, user_id: UserId) -> DomainResult<User> {
        let mut target = self.load_user(user_id).await?;
        ensure(
            actor,
            Action::ManageUsers,
            &Scope::organization(target.organization_id),
        )?;

        if actor.user_id == target.id {
            return Err(DomainError::Forbidden);
        }
        if target.role == Role::PlatformAdmin
            && target.is_active()
            && self.stores.users.count_active_platform_admins().await? <= 1
        {
            return Err(DomainError::conflict(
                "cannot deactivate the last active platform admin",
            ));
        }

        target.status = UserStatus::Inactive;
        self.stores.users.update_user(&target).await?;
        Ok(target)
    }

    pub async fn reactivate_user(&self, actor: &Actor, user_id: UserId) -> DomainResult<User> {
        let mut target = self.load_user(user_id).await?;
        ensure(
            actor,
            Action::ManageUsers,
            &Scope::organization(target.organization_id),
        )?;

        target.status = UserStatus::Active;
        self.stores.users.update_user(&target).await?;
        Ok(target)
    }

    // ───── organizations ─────

    pub async fn list_organizations(&self, actor: &Actor) -> DomainResult<Vec<Organization>> {
        ensure(actor, Action::Read, &Scope::platform())?;
        self.stores.organizations.list_organizations().await
    }

    pub async fn get_organization(
        &self,
        actor: &Actor,
        id: OrganizationId,
    ) -> DomainResult<Organization> {
        ensure(actor, Action::Read, &Scope::organization(Some(id)))?;
        self.stores
            .organizations
            .get_organization(id)
            .await?
            .ok_or(DomainError::NotFound)
    }

    pub async fn create_organization(
        &self,
        actor: &Actor,
        content: OrganizationContent,
        now: DateTime<Utc>,
    ) -> DomainResult<Organization> {
        ensure(actor, Action::Create, &Scope::platform())?;

        let org = content.into_organization(OrganizationId::new(), now);
        self.stores.organizations.upsert_organization(org.clone()).await?;
        Ok(org)
    }

    pub async fn update_organization(
        &self,
        actor: &Actor,
        id: OrganizationId,
        content: OrganizationContent,
        now: DateTime<Utc>,
    ) -> DomainResult<Organization> {
        ensure(actor, Action::Edit, &Scope::organization(Some(id)))?;

        let existing = self
            .stores
            .organizations
            .get_organization(id)
            .await?
            .ok_or(DomainError::NotFound)?;

        let mut org = content.into_organization(id, now);
        org.created_at = existing.created_at;
        self.stores.organizations.upsert_organization(org.clone()).await?;
        Ok(org)
    }

    /// `Conflict` while the organization still owns courses or users.
    pub async fn delete_organization(
        &self,
        actor: &Actor,
        id: OrganizationId,
    ) -> DomainResult<()> {
        ensure(actor, Action::Delete, &Scope::platform())?;
        self.stores.organizations.delete_organization(id).await
    }

    async fn load_user(&self, id: UserId) -> DomainResult<User> {
        self.stores
            .users
            .get_user(id)
            .await?
            .ok_or(DomainError::NotFound)
    }
}
