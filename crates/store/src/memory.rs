//! In-memory backend for tests and dev.
//!
//! One `RwLock` over all tables: multi-row operations take the write lock
//! once, which gives them the same all-or-nothing behavior the Postgres
//! backend gets from transactions.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use coursehub_auth::{Invite, User};
use coursehub_catalog::{Course, CourseStatus, Organization};
use coursehub_core::{
    CourseId, DomainError, DomainResult, DraftId, InviteId, OrganizationId, ProfileId, UserId,
};
use coursehub_review::{AdvocateProfile, ContentDraft, DraftStatus, ProfileStatus};

use crate::traits::{
    CourseStore, DraftStore, EditSubmission, HideOutcome, InviteStore, OrganizationStore,
    ProfileStore, ReviewSideEffect, UserStore,
};

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<UserId, User>,
    invites: HashMap<InviteId, Invite>,
    organizations: HashMap<OrganizationId, Organization>,
    courses: HashMap<CourseId, Course>,
    drafts: HashMap<DraftId, ContentDraft>,
    profiles: HashMap<ProfileId, AdvocateProfile>,
}

/// In-memory store implementing every repository trait.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Tables>,
    /// Test seam: force the shadow-edit hide side-effect to degrade to the
    /// timestamp-only fallback.
    fail_hide: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent shadow-edit submissions exercise the
    /// [`HideOutcome::TimestampOnly`] fallback path.
    pub fn fail_hide_updates(&self, fail: bool) {
        self.fail_hide.store(fail, Ordering::SeqCst);
    }

    fn read(&self) -> DomainResult<std::sync::RwLockReadGuard<'_, Tables>> {
        self.inner
            .read()
            .map_err(|_| DomainError::internal("store lock poisoned"))
    }

    fn write(&self) -> DomainResult<std::sync::RwLockWriteGuard<'_, Tables>> {
        self.inner
            .write()
            .map_err(|_| DomainError::internal("store lock poisoned"))
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: User) -> DomainResult<()> {
        let mut tables = self.write()?;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(DomainError::conflict("email already registered"));
        }
        tables.users.insert(user.id, user);
        Ok(())
    }

    async fn get_user(&self, id: UserId) -> DomainResult<Option<User>> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        let email = email.to_lowercase();
        Ok(self
            .read()?
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn update_user(&self, user: &User) -> DomainResult<()> {
        let mut tables = self.write()?;
        match tables.users.get_mut(&user.id) {
            Some(existing) => {
                *existing = user.clone();
                Ok(())
            }
            None => Err(DomainError::NotFound),
        }
    }

    async fn list_users(&self) -> DomainResult<Vec<User>> {
        let mut users: Vec<User> = self.read()?.users.values().cloned().collect();
        users.sort_by_key(|u| (u.created_at, u.id));
        Ok(users)
    }

    async fn list_users_by_organization(&self, org: OrganizationId) -> DomainResult<Vec<User>> {
        let mut users: Vec<User> = self
            .read()?
            .users
            .values()
            .filter(|u| u.organization_id == Some(org))
            .cloned()
            .collect();
        users.sort_by_key(|u| (u.created_at, u.id));
        Ok(users)
    }

    async fn count_active_platform_admins(&self) -> DomainResult<u64> {
        Ok(self
            .read()?
            .users
            .values()
            .filter(|u| u.is_active() && u.role == coursehub_auth::Role::PlatformAdmin)
            .count() as u64)
    }

    async fn create_user_from_invite(
        &self,
        user: User,
        invite_id: InviteId,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        let mut tables = self.write()?;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(DomainError::conflict("email already registered"));
        }
        let invite = tables
            .invites
            .get_mut(&invite_id)
            .ok_or(DomainError::NotFound)?;
        if !invite.is_open() {
            return Err(DomainError::conflict("invitation already accepted"));
        }
        invite.accepted_at = Some(now);
        tables.users.insert(user.id, user);
        Ok(())
    }

    async fn touch_last_login(&self, id: UserId, at: DateTime<Utc>) -> DomainResult<()> {
        let mut tables = self.write()?;
        let user = tables.users.get_mut(&id).ok_or(DomainError::NotFound)?;
        if user.last_login_at.is_none_or(|prev| prev < at) {
            user.last_login_at = Some(at);
        }
        Ok(())
    }
}

#[async_trait]
impl InviteStore for MemoryStore {
    async fn insert_invite(&self, invite: Invite) -> DomainResult<()> {
        let mut tables = self.write()?;
        if tables
            .invites
            .values()
            .any(|i| i.email == invite.email && i.is_open())
        {
            return Err(DomainError::conflict("open invitation already exists"));
        }
        tables.invites.insert(invite.id, invite);
        Ok(())
    }

    async fn find_open_invite(&self, email: &str) -> DomainResult<Option<Invite>> {
        let email = email.to_lowercase();
        Ok(self
            .read()?
            .invites
            .values()
            .find(|i| i.email == email && i.is_open())
            .cloned())
    }

    async fn list_invites(&self) -> DomainResult<Vec<Invite>> {
        let mut invites: Vec<Invite> = self.read()?.invites.values().cloned().collect();
        invites.sort_by_key(|i| (i.created_at, i.id));
        Ok(invites)
    }
}

#[async_trait]
impl OrganizationStore for MemoryStore {
    async fn upsert_organization(&self, org: Organization) -> DomainResult<()> {
        self.write()?.organizations.insert(org.id, org);
        Ok(())
    }

    async fn get_organization(&self, id: OrganizationId) -> DomainResult<Option<Organization>> {
        Ok(self.read()?.organizations.get(&id).cloned())
    }

    async fn list_organizations(&self) -> DomainResult<Vec<Organization>> {
        let mut orgs: Vec<Organization> = self.read()?.organizations.values().cloned().collect();
        orgs.sort_by_key(|o| (o.created_at, o.id));
        Ok(orgs)
    }

    async fn delete_organization(&self, id: OrganizationId) -> DomainResult<()> {
        let mut tables = self.write()?;
        if !tables.organizations.contains_key(&id) {
            return Err(DomainError::NotFound);
        }
        if tables.courses.values().any(|c| c.organization_id == id) {
            return Err(DomainError::conflict("organization still owns courses"));
        }
        if tables.users.values().any(|u| u.organization_id == Some(id)) {
            return Err(DomainError::conflict("organization still owns users"));
        }
        tables.organizations.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl CourseStore for MemoryStore {
    async fn insert_course(&self, course: Course) -> DomainResult<()> {
        let mut tables = self.write()?;
        if tables.courses.values().any(|c| c.slug == course.slug) {
            return Err(DomainError::conflict("course slug already exists"));
        }
        tables.courses.insert(course.id, course);
        Ok(())
    }

    async fn get_course(&self, id: CourseId) -> DomainResult<Option<Course>> {
        Ok(self.read()?.courses.get(&id).cloned())
    }

    async fn get_course_by_slug(&self, slug: &str) -> DomainResult<Option<Course>> {
        Ok(self
            .read()?
            .courses
            .values()
            .find(|c| c.slug == slug)
            .cloned())
    }

    async fn update_course(&self, course: &Course) -> DomainResult<()> {
        let mut tables = self.write()?;
        match tables.courses.get_mut(&course.id) {
            Some(existing) => {
                *existing = course.clone();
                Ok(())
            }
            None => Err(DomainError::NotFound),
        }
    }

    async fn list_published_courses(&self) -> DomainResult<Vec<Course>> {
        let mut courses: Vec<Course> = self
            .read()?
            .courses
            .values()
            .filter(|c| c.status == CourseStatus::Published)
            .cloned()
            .collect();
        courses.sort_by_key(|c| (c.created_at, c.id));
        Ok(courses)
    }

    async fn list_courses_by_organization(
        &self,
        org: OrganizationId,
    ) -> DomainResult<Vec<Course>> {
        let mut courses: Vec<Course> = self
            .read()?
            .courses
            .values()
            .filter(|c| c.organization_id == org)
            .cloned()
            .collect();
        courses.sort_by_key(|c| (c.created_at, c.id));
        Ok(courses)
    }

    async fn count_courses_by_creator(&self, user: UserId) -> DomainResult<u64> {
        Ok(self
            .read()?
            .courses
            .values()
            .filter(|c| c.created_by == user)
            .count() as u64)
    }
}

#[async_trait]
impl DraftStore for MemoryStore {
    async fn insert_draft(&self, draft: ContentDraft) -> DomainResult<()> {
        self.write()?.drafts.insert(draft.id, draft);
        Ok(())
    }

    async fn get_draft(&self, id: DraftId) -> DomainResult<Option<ContentDraft>> {
        Ok(self.read()?.drafts.get(&id).cloned())
    }

    async fn update_draft(&self, draft: &ContentDraft) -> DomainResult<()> {
        let mut tables = self.write()?;
        match tables.drafts.get_mut(&draft.id) {
            Some(existing) => {
                *existing = draft.clone();
                Ok(())
            }
            None => Err(DomainError::NotFound),
        }
    }

    async fn delete_draft(&self, id: DraftId) -> DomainResult<()> {
        match self.write()?.drafts.remove(&id) {
            Some(_) => Ok(()),
            None => Err(DomainError::NotFound),
        }
    }

    async fn list_drafts_by_creator(&self, user: UserId) -> DomainResult<Vec<ContentDraft>> {
        let mut drafts: Vec<ContentDraft> = self
            .read()?
            .drafts
            .values()
            .filter(|d| d.created_by == user)
            .cloned()
            .collect();
        drafts.sort_by_key(|d| (d.created_at, d.id));
        Ok(drafts)
    }

    async fn list_drafts_by_organization(
        &self,
        org: OrganizationId,
    ) -> DomainResult<Vec<ContentDraft>> {
        let mut drafts: Vec<ContentDraft> = self
            .read()?
            .drafts
            .values()
            .filter(|d| d.organization_id == Some(org))
            .cloned()
            .collect();
        drafts.sort_by_key(|d| (d.created_at, d.id));
        Ok(drafts)
    }

    async fn list_pending_drafts(&self) -> DomainResult<Vec<ContentDraft>> {
        let mut drafts: Vec<ContentDraft> = self
            .read()?
            .drafts
            .values()
            .filter(|d| d.status == DraftStatus::Pending)
            .cloned()
            .collect();
        drafts.sort_by_key(|d| (d.submitted_at, d.id));
        Ok(drafts)
    }

    async fn find_active_edit(&self, course: CourseId) -> DomainResult<Option<ContentDraft>> {
        Ok(self
            .read()?
            .drafts
            .values()
            .find(|d| d.original_course_id == Some(course) && d.is_active())
            .cloned())
    }

    async fn submit_course_edit(
        &self,
        draft: ContentDraft,
        editor: UserId,
        now: DateTime<Utc>,
    ) -> DomainResult<EditSubmission> {
        let course_id = draft
            .original_course_id
            .ok_or_else(|| DomainError::validation("edit draft must reference a course"))?;

        let mut tables = self.write()?;
        if !tables.courses.contains_key(&course_id) {
            return Err(DomainError::NotFound);
        }
        if tables
            .drafts
            .values()
            .any(|d| d.original_course_id == Some(course_id) && d.is_active())
        {
            return Err(DomainError::conflict(
                "an edit for this course is already in flight",
            ));
        }

        tables.drafts.insert(draft.id, draft.clone());

        let course = tables
            .courses
            .get_mut(&course_id)
            .ok_or(DomainError::NotFound)?;
        let hide = if self.fail_hide.load(Ordering::SeqCst) {
            course.last_modified_by = editor;
            course.updated_at = now;
            HideOutcome::TimestampOnly
        } else {
            course.status = CourseStatus::UnderReview;
            course.last_modified_by = editor;
            course.updated_at = now;
            HideOutcome::Hidden
        };

        Ok(EditSubmission { draft, hide })
    }

    async fn resubmit_course_edit(
        &self,
        draft: &ContentDraft,
        editor: UserId,
        now: DateTime<Utc>,
    ) -> DomainResult<HideOutcome> {
        let course_id = draft
            .original_course_id
            .ok_or_else(|| DomainError::validation("edit draft must reference a course"))?;

        let mut tables = self.write()?;
        if !tables.drafts.contains_key(&draft.id) {
            return Err(DomainError::NotFound);
        }
        if !tables.courses.contains_key(&course_id) {
            return Err(DomainError::NotFound);
        }
        if tables
            .drafts
            .values()
            .any(|d| d.id != draft.id && d.original_course_id == Some(course_id) && d.is_active())
        {
            return Err(DomainError::conflict(
                "an edit for this course is already in flight",
            ));
        }

        tables.drafts.insert(draft.id, draft.clone());

        let course = tables
            .courses
            .get_mut(&course_id)
            .ok_or(DomainError::NotFound)?;
        let hide = if self.fail_hide.load(Ordering::SeqCst) {
            course.last_modified_by = editor;
            course.updated_at = now;
            HideOutcome::TimestampOnly
        } else {
            course.status = CourseStatus::UnderReview;
            course.last_modified_by = editor;
            course.updated_at = now;
            HideOutcome::Hidden
        };

        Ok(hide)
    }

    async fn finalize_review(
        &self,
        draft: &ContentDraft,
        side_effect: ReviewSideEffect,
    ) -> DomainResult<()> {
        let mut tables = self.write()?;
        if !tables.drafts.contains_key(&draft.id) {
            return Err(DomainError::NotFound);
        }

        match side_effect {
            ReviewSideEffect::None => {}
            ReviewSideEffect::CreateCourse(course) => {
                if tables.courses.values().any(|c| c.slug == course.slug) {
                    return Err(DomainError::conflict("course slug already exists"));
                }
                tables.courses.insert(course.id, course);
            }
            ReviewSideEffect::UpdateCourse(course) => {
                match tables.courses.get_mut(&course.id) {
                    Some(existing) => *existing = course,
                    None => return Err(DomainError::NotFound),
                }
            }
            ReviewSideEffect::UpsertOrganization(org) => {
                tables.organizations.insert(org.id, org);
            }
        }

        tables.drafts.insert(draft.id, draft.clone());
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn insert_profile(&self, profile: AdvocateProfile) -> DomainResult<()> {
        let mut tables = self.write()?;
        if tables
            .profiles
            .values()
            .any(|p| p.user_id == profile.user_id)
        {
            return Err(DomainError::conflict("user already has a profile"));
        }
        tables.profiles.insert(profile.id, profile);
        Ok(())
    }

    async fn get_profile(&self, id: ProfileId) -> DomainResult<Option<AdvocateProfile>> {
        Ok(self.read()?.profiles.get(&id).cloned())
    }

    async fn get_profile_by_user(&self, user: UserId) -> DomainResult<Option<AdvocateProfile>> {
        Ok(self
            .read()?
            .profiles
            .values()
            .find(|p| p.user_id == user)
            .cloned())
    }

    async fn update_profile(&self, profile: &AdvocateProfile) -> DomainResult<()> {
        let mut tables = self.write()?;
        match tables.profiles.get_mut(&profile.id) {
            Some(existing) => {
                *existing = profile.clone();
                Ok(())
            }
            None => Err(DomainError::NotFound),
        }
    }

    async fn list_approved_profiles(&self) -> DomainResult<Vec<AdvocateProfile>> {
        Ok(self
            .read()?
            .profiles
            .values()
            .filter(|p| p.status == ProfileStatus::Approved)
            .cloned()
            .collect())
    }

    async fn list_pending_profiles(&self) -> DomainResult<Vec<AdvocateProfile>> {
        let mut profiles: Vec<AdvocateProfile> = self
            .read()?
            .profiles
            .values()
            .filter(|p| p.status == ProfileStatus::Pending)
            .cloned()
            .collect();
        profiles.sort_by_key(|p| (p.submitted_at, p.id));
        Ok(profiles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coursehub_catalog::Bilingual;
    use coursehub_review::{CourseContent, DraftContent};

    fn course(org: OrganizationId, creator: UserId) -> Course {
        CourseContent {
            title: Bilingual::en_only("Photography"),
            start_date: Some(Utc::now() + chrono::Duration::days(10)),
            ..Default::default()
        }
        .into_course(org, "Org", creator, Utc::now())
    }

    fn edit_draft(creator: UserId, org: OrganizationId, course_id: CourseId) -> ContentDraft {
        let mut draft = ContentDraft::new(
            creator,
            Some(org),
            "Edit".to_string(),
            DraftContent::Course(CourseContent::default()),
            true,
            Utc::now(),
        )
        .unwrap();
        draft.original_course_id = Some(course_id);
        draft
    }

    #[tokio::test]
    async fn duplicate_active_edit_is_a_conflict() {
        let store = MemoryStore::new();
        let org = OrganizationId::new();
        let creator = UserId::new();
        let course = course(org, creator);
        store.insert_course(course.clone()).await.unwrap();

        let first = edit_draft(creator, org, course.id);
        store
            .submit_course_edit(first, creator, Utc::now())
            .await
            .unwrap();

        let second = edit_draft(creator, org, course.id);
        let err = store
            .submit_course_edit(second, creator, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn submit_course_edit_hides_the_course() {
        let store = MemoryStore::new();
        let org = OrganizationId::new();
        let editor = UserId::new();
        let course = course(org, editor);
        store.insert_course(course.clone()).await.unwrap();

        let submission = store
            .submit_course_edit(edit_draft(editor, org, course.id), editor, Utc::now())
            .await
            .unwrap();

        assert_eq!(submission.hide, HideOutcome::Hidden);
        let stored = store.get_course(course.id).await.unwrap().unwrap();
        assert_eq!(stored.status, CourseStatus::UnderReview);
        assert_eq!(stored.last_modified_by, editor);
    }

    #[tokio::test]
    async fn hide_fallback_keeps_course_visible_but_commits_the_draft() {
        let store = MemoryStore::new();
        let org = OrganizationId::new();
        let editor = UserId::new();
        let course = course(org, editor);
        store.insert_course(course.clone()).await.unwrap();

        store.fail_hide_updates(true);
        let submission = store
            .submit_course_edit(edit_draft(editor, org, course.id), editor, Utc::now())
            .await
            .unwrap();

        assert_eq!(submission.hide, HideOutcome::TimestampOnly);
        let stored = store.get_course(course.id).await.unwrap().unwrap();
        assert_eq!(stored.status, CourseStatus::Published);
        assert_eq!(stored.last_modified_by, editor);
        // The primary write committed regardless.
        assert!(store
            .get_draft(submission.draft.id)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn organization_delete_is_guarded() {
        let store = MemoryStore::new();
        let creator = UserId::new();
        let org = Organization {
            id: OrganizationId::new(),
            name: Bilingual::en_only("Org"),
            description: Bilingual::default(),
            contact: Default::default(),
            location: None,
            logo_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        store.upsert_organization(org.clone()).await.unwrap();
        store.insert_course(course(org.id, creator)).await.unwrap();

        let err = store.delete_organization(org.id).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn touch_last_login_is_idempotent_per_token() {
        let store = MemoryStore::new();
        let invite = Invite {
            id: InviteId::new(),
            email: "a@example.com".to_string(),
            role: coursehub_auth::Role::YouthAdvocate,
            organization_id: None,
            created_by: UserId::new(),
            created_at: Utc::now(),
            accepted_at: None,
        };
        let issued = Utc::now();
        let user = User::from_invite(&invite, "A".to_string(), issued);
        store.insert_user(user.clone()).await.unwrap();

        // Repeat calls with the same issued-at do not move the stamp.
        store.touch_last_login(user.id, issued).await.unwrap();
        let after = store.get_user(user.id).await.unwrap().unwrap();
        assert_eq!(after.last_login_at, Some(issued));

        let later = issued + chrono::Duration::hours(1);
        store.touch_last_login(user.id, later).await.unwrap();
        let after = store.get_user(user.id).await.unwrap().unwrap();
        assert_eq!(after.last_login_at, Some(later));
    }
}
