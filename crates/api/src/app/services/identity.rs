//! Identity and session resolution.

use chrono::{DateTime, Utc};

use coursehub_auth::{validate_claims, Actor, SessionClaims, User};
use coursehub_core::{DomainError, DomainResult};

use super::Stores;

pub struct IdentityService {
    stores: Stores,
}

impl IdentityService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    /// Resolve validated session claims into an [`Actor`].
    ///
    /// First sign-in with a matching open invitation creates the user and
    /// marks the invitation accepted in one store operation. Every failure
    /// mode collapses to `Unauthenticated`; the distinction stays in logs.
    pub async fn resolve(
        &self,
        claims: &SessionClaims,
        now: DateTime<Utc>,
    ) -> DomainResult<Actor> {
        validate_claims(claims, now).map_err(|e| {
            tracing::debug!(error = %e, "session claims rejected");
            DomainError::Unauthenticated
        })?;

        let email = claims.email.trim().to_lowercase();
        let user = match self.stores.users.get_user_by_email(&email).await? {
            Some(user) => user,
            None => self.accept_invite(&email, now).await?,
        };

        let actor = user.actor().ok_or(DomainError::Unauthenticated)?;

        // At most one bump per issued token.
        if user.last_login_at.is_none_or(|at| at < claims.issued_at) {
            self.stores
                .users
                .touch_last_login(user.id, claims.issued_at)
                .await?;
        }

        Ok(actor)
    }

    async fn accept_invite(&self, email: &str, now: DateTime<Utc>) -> DomainResult<User> {
        let invite = self
            .stores
            .invites
            .find_open_invite(email)
            .await?
            .ok_or_else(|| {
                tracing::debug!("no account and no open invitation for signed-in email");
                DomainError::Unauthenticated
            })?;

        let display_name = email.split('@').next().unwrap_or(email).to_string();
        let user = User::from_invite(&invite, display_name, now);
        self.stores
            .users
            .create_user_from_invite(user.clone(), invite.id, now)
            .await?;

        tracing::info!(user_id = %user.id, role = %user.role, "user created from invitation");
        Ok(user)
    }
}
