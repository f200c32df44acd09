//! Draft lifecycle orchestration: create, patch (edit/submit or review),
//! copy, delete, and the shadow-edit protocol for published courses.

use chrono::{DateTime, Utc};

use coursehub_auth::{can_perform, ensure, Action, Actor, Scope};
use coursehub_catalog::CourseStatus;
use coursehub_core::{CourseId, DomainError, DomainResult, DraftId};
use coursehub_review::{ContentDraft, CourseContent, DraftContent, ReviewDecision};
use coursehub_store::{EditSubmission, HideOutcome, ReviewSideEffect};

use crate::app::dto::{CourseEditRequest, CreateDraftRequest, PatchDraftRequest};

use super::Stores;

pub struct DraftService {
    stores: Stores,
}

impl DraftService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    pub async fn create(
        &self,
        actor: &Actor,
        req: CreateDraftRequest,
        now: DateTime<Utc>,
    ) -> DomainResult<ContentDraft> {
        ensure(
            actor,
            Action::Create,
            &Scope::owned(actor.user_id, actor.organization_id),
        )?;

        let draft = ContentDraft::new(
            actor.user_id,
            actor.organization_id,
            req.title,
            req.content,
            req.submit,
            now,
        )?;
        self.stores.drafts.insert_draft(draft.clone()).await?;
        Ok(draft)
    }

    /// Drafts the actor works on: own-org drafts for org admins, own-authored
    /// drafts for everyone else.
    pub async fn list_mine(&self, actor: &Actor) -> DomainResult<Vec<ContentDraft>> {
        match actor.organization_id {
            Some(org) if can_perform(actor, Action::Review, &Scope::organization(Some(org))) => {
                self.stores.drafts.list_drafts_by_organization(org).await
            }
            _ => self.stores.drafts.list_drafts_by_creator(actor.user_id).await,
        }
    }

    /// The review queue, limited to drafts the actor may review.
    pub async fn list_pending(&self, actor: &Actor) -> DomainResult<Vec<ContentDraft>> {
        ensure(
            actor,
            Action::Review,
            &Scope::organization(actor.organization_id),
        )?;

        let pending = self.stores.drafts.list_pending_drafts().await?;
        Ok(pending
            .into_iter()
            .filter(|d| {
                can_perform(actor, Action::Review, &Scope::organization(d.organization_id))
            })
            .collect())
    }

    pub async fn get(&self, actor: &Actor, id: DraftId) -> DomainResult<ContentDraft> {
        let draft = self.load(id).await?;
        ensure(
            actor,
            Action::Read,
            &Scope::owned(draft.created_by, draft.organization_id),
        )?;
        Ok(draft)
    }

    /// Dispatch a patch onto one of the two disjoint paths: a request carrying
    /// a `decision` is a review action, anything else is a creator edit/submit.
    pub async fn patch(
        &self,
        actor: &Actor,
        id: DraftId,
        req: PatchDraftRequest,
        now: DateTime<Utc>,
    ) -> DomainResult<ContentDraft> {
        let mut draft = self.load(id).await?;

        if let Some(decision) = req.decision {
            ensure(
                actor,
                Action::Review,
                &Scope::organization(draft.organization_id),
            )?;

            draft.review(decision, actor.user_id, req.notes, now)?;
            let side_effect = self.review_side_effect(&draft, decision, now).await?;
            self.stores.drafts.finalize_review(&draft, side_effect).await?;
        } else {
            ensure(
                actor,
                Action::Edit,
                &Scope::owned(draft.created_by, draft.organization_id),
            )?;

            if req.title.is_some() || req.content.is_some() {
                draft.edit(req.title, req.content, now)?;
            }
            if req.submit {
                draft.submit(now)?;
            }

            // Resubmitting a shadow edit re-enters the protocol: the
            // one-active-edit check and the course hide happen atomically
            // with the draft write, exactly as on first submission.
            if req.submit && draft.original_course_id.is_some() {
                let hide = self
                    .stores
                    .drafts
                    .resubmit_course_edit(&draft, actor.user_id, now)
                    .await?;
                if hide == HideOutcome::TimestampOnly {
                    tracing::warn!(
                        draft_id = %draft.id,
                        "course could not be hidden; edit draft resubmitted with timestamp-only update"
                    );
                }
            } else {
                self.stores.drafts.update_draft(&draft).await?;
            }
        }

        Ok(draft)
    }

    pub async fn copy(
        &self,
        actor: &Actor,
        id: DraftId,
        now: DateTime<Utc>,
    ) -> DomainResult<ContentDraft> {
        let source = self.load(id).await?;
        // Copying is open to the creator and to anyone in the draft's
        // organization, not just reviewers.
        let same_org =
            source.organization_id.is_some() && source.organization_id == actor.organization_id;
        if !same_org {
            ensure(
                actor,
                Action::Read,
                &Scope::owned(source.created_by, source.organization_id),
            )?;
        }

        let copy = source.copy_as(actor.user_id, actor.organization_id, now);
        self.stores.drafts.insert_draft(copy.clone()).await?;
        Ok(copy)
    }

    /// Delete is creator-only (org admins cannot delete another author's
    /// draft), and approved drafts are permanent records.
    pub async fn delete(&self, actor: &Actor, id: DraftId) -> DomainResult<()> {
        let draft = self.load(id).await?;
        // The creator may delete regardless of role; the guard fallback only
        // admits platform admins.
        if actor.user_id != draft.created_by {
            ensure(actor, Action::Delete, &Scope::owned(draft.created_by, None))?;
        }

        if !draft.is_deletable() {
            return Err(DomainError::Forbidden);
        }
        self.stores.drafts.delete_draft(id).await
    }

    /// Shadow-edit a published course: snapshot + overlay, then one atomic
    /// store operation inserting the pending draft and hiding the course.
    pub async fn submit_course_edit(
        &self,
        actor: &Actor,
        course_id: CourseId,
        req: CourseEditRequest,
        now: DateTime<Utc>,
    ) -> DomainResult<EditSubmission> {
        let course = self
            .stores
            .courses
            .get_course(course_id)
            .await?
            .ok_or(DomainError::NotFound)?;
        ensure(
            actor,
            Action::Edit,
            &Scope::owned(course.created_by, Some(course.organization_id)),
        )?;

        let snapshot = CourseContent::from_course(&course).merged(req.changes);
        let title = req.title.unwrap_or_else(|| course.title.en.clone());

        let mut draft = ContentDraft::new(
            actor.user_id,
            Some(course.organization_id),
            title,
            DraftContent::Course(snapshot),
            true,
            now,
        )?;
        draft.original_course_id = Some(course.id);

        let submission = self
            .stores
            .drafts
            .submit_course_edit(draft, actor.user_id, now)
            .await?;

        if submission.hide == HideOutcome::TimestampOnly {
            tracing::warn!(
                course_id = %course.id,
                draft_id = %submission.draft.id,
                "course could not be hidden; edit draft committed with timestamp-only update"
            );
        }

        Ok(submission)
    }

    async fn load(&self, id: DraftId) -> DomainResult<ContentDraft> {
        self.stores
            .drafts
            .get_draft(id)
            .await?
            .ok_or(DomainError::NotFound)
    }

    /// The course/organization write that must land atomically with the
    /// reviewed draft.
    async fn review_side_effect(
        &self,
        draft: &ContentDraft,
        decision: ReviewDecision,
        now: DateTime<Utc>,
    ) -> DomainResult<ReviewSideEffect> {
        // Shadow edit: the original course comes back in both outcomes.
        if let Some(course_id) = draft.original_course_id {
            let mut course = self
                .stores
                .courses
                .get_course(course_id)
                .await?
                .ok_or(DomainError::NotFound)?;

            match (&draft.content, decision) {
                (DraftContent::Course(content), ReviewDecision::Approved) => {
                    content.clone().apply_to(&mut course, draft.created_by, now);
                }
                (_, ReviewDecision::Rejected) => {
                    // Restore visibility, fields untouched.
                    course.status = CourseStatus::Published;
                    course.updated_at = now;
                }
                (DraftContent::Organization(_), ReviewDecision::Approved) => {
                    return Err(DomainError::invalid_transition(
                        "organization draft cannot reference a course",
                    ));
                }
            }
            return Ok(ReviewSideEffect::UpdateCourse(course));
        }

        if decision == ReviewDecision::Rejected {
            return Ok(ReviewSideEffect::None);
        }

        match &draft.content {
            DraftContent::Course(content) => {
                let org_id = draft.organization_id.ok_or_else(|| {
                    DomainError::validation("course draft has no organization")
                })?;
                let org = self
                    .stores
                    .organizations
                    .get_organization(org_id)
                    .await?
                    .ok_or(DomainError::NotFound)?;
                Ok(ReviewSideEffect::CreateCourse(content.clone().into_course(
                    org_id,
                    &org.name.en,
                    draft.created_by,
                    now,
                )))
            }
            DraftContent::Organization(content) => {
                let org_id = draft.organization_id.unwrap_or_default();
                let mut org = content.clone().into_organization(org_id, now);
                if let Some(existing) =
                    self.stores.organizations.get_organization(org_id).await?
                {
                    org.created_at = existing.created_at;
                }
                Ok(ReviewSideEffect::UpsertOrganization(org))
            }
        }
    }
}
