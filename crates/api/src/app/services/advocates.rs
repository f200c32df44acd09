//! Advocate profile moderation and the public ranking.

use chrono::{DateTime, Utc};

use coursehub_auth::{can_perform, ensure, Action, Actor, Scope};
use coursehub_core::{DomainError, DomainResult, ProfileId};
use coursehub_review::{my_rank, rank_advocates, AdvocateProfile, RankedAdvocate};

use crate::app::dto::{CreateProfileRequest, PatchProfileRequest, ReviewRequest};

use super::Stores;

pub struct AdvocateService {
    stores: Stores,
}

impl AdvocateService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    pub async fn create_profile(
        &self,
        actor: &Actor,
        req: CreateProfileRequest,
        now: DateTime<Utc>,
    ) -> DomainResult<AdvocateProfile> {
        ensure(
            actor,
            Action::Create,
            &Scope::owned(actor.user_id, actor.organization_id),
        )?;

        let mut profile = AdvocateProfile::new(
            actor.user_id,
            actor.organization_id,
            req.public_name,
            req.bio,
            now,
        )?;
        if req.avatar_url.is_some() || req.show_organization {
            profile.edit(
                None,
                None,
                req.avatar_url.map(Some),
                Some(req.show_organization),
                now,
            )?;
        }
        if req.submit {
            profile.submit(now)?;
        }

        self.stores.profiles.insert_profile(profile.clone()).await?;
        Ok(profile)
    }

    pub async fn my_profile(&self, actor: &Actor) -> DomainResult<AdvocateProfile> {
        self.stores
            .profiles
            .get_profile_by_user(actor.user_id)
            .await?
            .ok_or(DomainError::NotFound)
    }

    pub async fn patch_my_profile(
        &self,
        actor: &Actor,
        req: PatchProfileRequest,
        now: DateTime<Utc>,
    ) -> DomainResult<AdvocateProfile> {
        let mut profile = self.my_profile(actor).await?;

        if req.public_name.is_some()
            || req.bio.is_some()
            || req.avatar_url.is_some()
            || req.show_organization.is_some()
        {
            profile.edit(
                req.public_name,
                req.bio,
                req.avatar_url.map(Some),
                req.show_organization,
                now,
            )?;
        }
        if req.submit {
            profile.submit(now)?;
        }

        self.stores.profiles.update_profile(&profile).await?;
        Ok(profile)
    }

    /// Owner takes an approved profile off the public listing.
    pub async fn hide_my_profile(
        &self,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> DomainResult<AdvocateProfile> {
        let mut profile = self.my_profile(actor).await?;
        profile.hide(now)?;
        self.stores.profiles.update_profile(&profile).await?;
        Ok(profile)
    }

    pub async fn unhide_my_profile(
        &self,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> DomainResult<AdvocateProfile> {
        let mut profile = self.my_profile(actor).await?;
        profile.unhide(now)?;
        self.stores.profiles.update_profile(&profile).await?;
        Ok(profile)
    }

    pub async fn review(
        &self,
        actor: &Actor,
        id: ProfileId,
        req: ReviewRequest,
        now: DateTime<Utc>,
    ) -> DomainResult<AdvocateProfile> {
        let mut profile = self
            .stores
            .profiles
            .get_profile(id)
            .await?
            .ok_or(DomainError::NotFound)?;
        ensure(
            actor,
            Action::Review,
            &Scope::organization(profile.organization_id),
        )?;

        profile.review(req.decision, actor.user_id, req.notes, now)?;
        self.stores.profiles.update_profile(&profile).await?;
        Ok(profile)
    }

    pub async fn list_pending(&self, actor: &Actor) -> DomainResult<Vec<AdvocateProfile>> {
        ensure(
            actor,
            Action::Review,
            &Scope::organization(actor.organization_id),
        )?;

        let pending = self.stores.profiles.list_pending_profiles().await?;
        Ok(pending
            .into_iter()
            .filter(|p| {
                can_perform(actor, Action::Review, &Scope::organization(p.organization_id))
            })
            .collect())
    }

    /// Approved profiles annotated with their authored-course count, in the
    /// public ranking order.
    pub async fn list_public(&self) -> DomainResult<Vec<RankedAdvocate>> {
        let approved = self.stores.profiles.list_approved_profiles().await?;

        let mut entries = Vec::with_capacity(approved.len());
        for profile in approved {
            let count = self
                .stores
                .courses
                .count_courses_by_creator(profile.user_id)
                .await?;
            entries.push((profile, count));
        }

        Ok(rank_advocates(entries))
    }

    /// 1-based rank in the public ordering, or `None` without an approved
    /// profile.
    pub async fn my_rank(&self, actor: &Actor) -> DomainResult<Option<usize>> {
        let ranked = self.list_public().await?;
        Ok(my_rank(&ranked, actor.user_id))
    }
}
