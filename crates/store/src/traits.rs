//! Repository contracts.
//!
//! All operations are async store IO returning [`DomainResult`]; uniqueness
//! violations surface as `Conflict`, missing rows as `NotFound`, and backend
//! failures as `Internal`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use coursehub_auth::{Invite, User};
use coursehub_catalog::{Course, Organization};
use coursehub_core::{
    CourseId, DomainResult, DraftId, InviteId, OrganizationId, ProfileId, UserId,
};
use coursehub_review::{AdvocateProfile, ContentDraft};

/// Identity records and the invitation handshake.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// `Conflict` when the email is already taken.
    async fn insert_user(&self, user: User) -> DomainResult<()>;
    async fn get_user(&self, id: UserId) -> DomainResult<Option<User>>;
    /// Lookup by lowercased email.
    async fn get_user_by_email(&self, email: &str) -> DomainResult<Option<User>>;
    /// `NotFound` when the row is missing.
    async fn update_user(&self, user: &User) -> DomainResult<()>;
    async fn list_users(&self) -> DomainResult<Vec<User>>;
    async fn list_users_by_organization(&self, org: OrganizationId) -> DomainResult<Vec<User>>;
    /// How many ACTIVE platform admins exist (the last one is protected).
    async fn count_active_platform_admins(&self) -> DomainResult<u64>;
    /// Atomically create the user and mark the invitation accepted.
    async fn create_user_from_invite(
        &self,
        user: User,
        invite_id: InviteId,
        now: DateTime<Utc>,
    ) -> DomainResult<()>;
    /// Bump `last_login_at` to `at` only when it currently predates `at`
    /// (idempotent within one issued session token).
    async fn touch_last_login(&self, id: UserId, at: DateTime<Utc>) -> DomainResult<()>;
}

/// Sign-up pre-authorization records.
#[async_trait]
pub trait InviteStore: Send + Sync {
    /// `Conflict` when an open invitation for the email already exists.
    async fn insert_invite(&self, invite: Invite) -> DomainResult<()>;
    async fn find_open_invite(&self, email: &str) -> DomainResult<Option<Invite>>;
    async fn list_invites(&self) -> DomainResult<Vec<Invite>>;
}

#[async_trait]
pub trait OrganizationStore: Send + Sync {
    async fn upsert_organization(&self, org: Organization) -> DomainResult<()>;
    async fn get_organization(&self, id: OrganizationId) -> DomainResult<Option<Organization>>;
    async fn list_organizations(&self) -> DomainResult<Vec<Organization>>;
    /// `Conflict` while the organization still owns any course or user.
    async fn delete_organization(&self, id: OrganizationId) -> DomainResult<()>;
}

#[async_trait]
pub trait CourseStore: Send + Sync {
    /// `Conflict` on a duplicate slug.
    async fn insert_course(&self, course: Course) -> DomainResult<()>;
    async fn get_course(&self, id: CourseId) -> DomainResult<Option<Course>>;
    async fn get_course_by_slug(&self, slug: &str) -> DomainResult<Option<Course>>;
    async fn update_course(&self, course: &Course) -> DomainResult<()>;
    /// Courses with a publicly visible status; date filtering is the
    /// projector's concern.
    async fn list_published_courses(&self) -> DomainResult<Vec<Course>>;
    async fn list_courses_by_organization(&self, org: OrganizationId)
        -> DomainResult<Vec<Course>>;
    async fn count_courses_by_creator(&self, user: UserId) -> DomainResult<u64>;
}

/// What happened to the course-hiding side-effect of a shadow-edit
/// submission.
///
/// The draft insert is the primary write; hiding the course is secondary and
/// allowed to degrade. `TimestampOnly` means only `last_modified_by` and the
/// timestamp were written. Callers log it and move on; it is never surfaced
/// as a user-facing error and never rolls back the draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HideOutcome {
    Hidden,
    TimestampOnly,
}

/// Result of an atomic shadow-edit submission.
#[derive(Debug, Clone)]
pub struct EditSubmission {
    pub draft: ContentDraft,
    pub hide: HideOutcome,
}

/// Course/organization write to perform atomically with a review verdict.
#[derive(Debug, Clone)]
pub enum ReviewSideEffect {
    /// Plain rejection of a non-shadow draft: only the draft row changes.
    None,
    /// Approval of a fresh COURSE draft publishes a new course.
    CreateCourse(Course),
    /// Shadow-edit verdict: the original course row is rewritten (approved:
    /// snapshot applied; rejected: status restored, fields untouched).
    UpdateCourse(Course),
    /// Approval of an ORGANIZATION draft.
    UpsertOrganization(Organization),
}

#[async_trait]
pub trait DraftStore: Send + Sync {
    async fn insert_draft(&self, draft: ContentDraft) -> DomainResult<()>;
    async fn get_draft(&self, id: DraftId) -> DomainResult<Option<ContentDraft>>;
    /// `NotFound` when the row is missing.
    async fn update_draft(&self, draft: &ContentDraft) -> DomainResult<()>;
    async fn delete_draft(&self, id: DraftId) -> DomainResult<()>;
    async fn list_drafts_by_creator(&self, user: UserId) -> DomainResult<Vec<ContentDraft>>;
    async fn list_drafts_by_organization(
        &self,
        org: OrganizationId,
    ) -> DomainResult<Vec<ContentDraft>>;
    async fn list_pending_drafts(&self) -> DomainResult<Vec<ContentDraft>>;
    /// The active (DRAFT or PENDING) edit draft for a course, if any.
    async fn find_active_edit(&self, course: CourseId) -> DomainResult<Option<ContentDraft>>;
    /// Atomic shadow-edit submission: verify no active edit draft references
    /// the course (`Conflict` otherwise), insert the pending draft, and hide
    /// the course. The hide may degrade to [`HideOutcome::TimestampOnly`]
    /// without failing the submission.
    ///
    /// `draft.original_course_id` must be set; the draft arrives already
    /// PENDING.
    async fn submit_course_edit(
        &self,
        draft: ContentDraft,
        editor: UserId,
        now: DateTime<Utc>,
    ) -> DomainResult<EditSubmission>;
    /// Atomic resubmission of a rejected edit draft: verify no *other* active
    /// edit draft references the course (`Conflict` otherwise), persist the
    /// updated draft, and hide the course again with the same degradable
    /// outcome as [`DraftStore::submit_course_edit`].
    async fn resubmit_course_edit(
        &self,
        draft: &ContentDraft,
        editor: UserId,
        now: DateTime<Utc>,
    ) -> DomainResult<HideOutcome>;
    /// Persist a reviewed draft and its side-effect in one transaction, so
    /// exactly one draft transitions state per review action.
    async fn finalize_review(
        &self,
        draft: &ContentDraft,
        side_effect: ReviewSideEffect,
    ) -> DomainResult<()>;
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// `Conflict` when the user already has a profile.
    async fn insert_profile(&self, profile: AdvocateProfile) -> DomainResult<()>;
    async fn get_profile(&self, id: ProfileId) -> DomainResult<Option<AdvocateProfile>>;
    async fn get_profile_by_user(&self, user: UserId) -> DomainResult<Option<AdvocateProfile>>;
    async fn update_profile(&self, profile: &AdvocateProfile) -> DomainResult<()>;
    async fn list_approved_profiles(&self) -> DomainResult<Vec<AdvocateProfile>>;
    async fn list_pending_profiles(&self) -> DomainResult<Vec<AdvocateProfile>>;
}
