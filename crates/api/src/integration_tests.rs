//! Service-level scenarios over the in-memory store: sign-in and invitation
//! acceptance, the draft review loop, the shadow-edit protocol, advocate
//! ranking, and the admin self-protection rules.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{Duration, Utc};
use tower::ServiceExt;

use coursehub_auth::{Actor, Invite, Role, SessionClaims, User, UserStatus};
use coursehub_catalog::{Bilingual, Course, CourseStatus};
use coursehub_core::{DomainError, InviteId, OrganizationId, UserId};
use coursehub_review::{
    CourseContent, CoursePatch, DraftContent, DraftStatus, OrganizationContent, ProfileStatus,
    ReviewDecision,
};
use coursehub_store::{
    CourseStore, DraftStore, HideOutcome, InviteStore, MemoryStore, OrganizationStore, UserStore,
};

use crate::app::dto::{
    ChangeRoleRequest, CourseEditRequest, CourseListQuery, CreateDraftRequest,
    CreateProfileRequest, PatchDraftRequest, ReviewRequest,
};
use crate::app::services::{AppServices, Stores};
use crate::session::SessionCodec;

fn harness() -> (Arc<MemoryStore>, AppServices) {
    let backend = Arc::new(MemoryStore::new());
    let services = AppServices::new(Stores::from_backend(backend.clone()));
    (backend, services)
}

async fn seed_user(backend: &MemoryStore, role: Role, org: Option<OrganizationId>) -> Actor {
    let now = Utc::now();
    let user = User {
        id: UserId::new(),
        email: format!("{}@example.org", UserId::new()),
        display_name: "Test User".to_string(),
        role,
        organization_id: org,
        status: UserStatus::Active,
        created_at: now,
        last_login_at: None,
    };
    backend.insert_user(user.clone()).await.unwrap();
    user.actor().unwrap()
}

async fn seed_org(backend: &MemoryStore, name: &str) -> OrganizationId {
    let content = OrganizationContent {
        name: Bilingual::en_only(name),
        ..Default::default()
    };
    let org = content.into_organization(OrganizationId::new(), Utc::now());
    backend.upsert_organization(org.clone()).await.unwrap();
    org.id
}

fn claims_for(email: &str) -> SessionClaims {
    let now = Utc::now();
    SessionClaims {
        email: email.to_string(),
        issued_at: now - Duration::minutes(1),
        expires_at: now + Duration::hours(1),
    }
}

fn course_content(title: &str) -> CourseContent {
    CourseContent {
        title: Bilingual::en_only(title),
        description: Bilingual::en_only("Hands-on evening sessions."),
        district: "Hlaing".to_string(),
        province: "Yangon".to_string(),
        start_date: Some(Utc::now() + Duration::days(30)),
        fee: 15000,
        ..Default::default()
    }
}

fn review_patch(decision: ReviewDecision, notes: Option<&str>) -> PatchDraftRequest {
    PatchDraftRequest {
        title: None,
        content: None,
        submit: false,
        decision: Some(decision),
        notes: notes.map(str::to_string),
    }
}

/// Author submits a course draft and the reviewer approves it; returns the
/// published course.
async fn publish_course(
    backend: &MemoryStore,
    services: &AppServices,
    author: &Actor,
    reviewer: &Actor,
    title: &str,
) -> Course {
    let draft = services
        .drafts
        .create(
            author,
            CreateDraftRequest {
                title: title.to_string(),
                content: DraftContent::Course(course_content(title)),
                submit: true,
            },
            Utc::now(),
        )
        .await
        .unwrap();

    services
        .drafts
        .patch(
            reviewer,
            draft.id,
            review_patch(ReviewDecision::Approved, None),
            Utc::now(),
        )
        .await
        .unwrap();

    backend
        .list_published_courses()
        .await
        .unwrap()
        .into_iter()
        .find(|c| c.title.en == title)
        .expect("approved draft should have published a course")
}

// ───── identity & invitations ─────

#[tokio::test]
async fn first_sign_in_accepts_the_open_invitation() {
    let (backend, services) = harness();
    let org = seed_org(&backend, "Yangon Youth Center").await;
    let admin = seed_user(&backend, Role::PlatformAdmin, None).await;

    backend
        .insert_invite(Invite {
            id: InviteId::new(),
            email: "maya@example.org".to_string(),
            role: Role::OrganizationAdmin,
            organization_id: Some(org),
            created_by: admin.user_id,
            created_at: Utc::now(),
            accepted_at: None,
        })
        .await
        .unwrap();

    let actor = services
        .identity
        .resolve(&claims_for("maya@example.org"), Utc::now())
        .await
        .unwrap();

    assert_eq!(actor.role, Role::OrganizationAdmin);
    assert_eq!(actor.organization_id, Some(org));

    let user = backend
        .get_user_by_email("maya@example.org")
        .await
        .unwrap()
        .expect("first sign-in should have created the account");
    assert!(user.last_login_at.is_some());
    assert!(backend
        .find_open_invite("maya@example.org")
        .await
        .unwrap()
        .is_none());

    // Second sign-in resolves the existing account.
    let again = services
        .identity
        .resolve(&claims_for("maya@example.org"), Utc::now())
        .await
        .unwrap();
    assert_eq!(again.user_id, actor.user_id);
}

#[tokio::test]
async fn sign_in_without_account_or_invitation_is_unauthenticated() {
    let (_backend, services) = harness();

    let err = services
        .identity
        .resolve(&claims_for("stranger@example.org"), Utc::now())
        .await
        .unwrap_err();
    assert_eq!(err, DomainError::Unauthenticated);
}

#[tokio::test]
async fn inactive_accounts_cannot_sign_in() {
    let (backend, services) = harness();
    let actor = seed_user(&backend, Role::YouthAdvocate, None).await;

    let mut user = backend.get_user(actor.user_id).await.unwrap().unwrap();
    user.status = UserStatus::Inactive;
    backend.update_user(&user).await.unwrap();

    let err = services
        .identity
        .resolve(&claims_for(&user.email), Utc::now())
        .await
        .unwrap_err();
    assert_eq!(err, DomainError::Unauthenticated);
}

// ───── draft review loop ─────

#[tokio::test]
async fn rejected_draft_can_be_edited_and_resubmitted() {
    let (backend, services) = harness();
    let org = seed_org(&backend, "Mandalay Makers").await;
    let advocate = seed_user(&backend, Role::YouthAdvocate, Some(org)).await;
    let reviewer = seed_user(&backend, Role::OrganizationAdmin, Some(org)).await;

    let draft = services
        .drafts
        .create(
            &advocate,
            CreateDraftRequest {
                title: "Photography Course".to_string(),
                content: DraftContent::Course(course_content("Photography Course")),
                submit: true,
            },
            Utc::now(),
        )
        .await
        .unwrap();

    let rejected = services
        .drafts
        .patch(
            &reviewer,
            draft.id,
            review_patch(ReviewDecision::Rejected, Some("missing fee")),
            Utc::now(),
        )
        .await
        .unwrap();
    assert_eq!(rejected.status, DraftStatus::Rejected);
    assert_eq!(rejected.review_notes.as_deref(), Some("missing fee"));

    // Creator fixes the content and resubmits in one patch.
    let mut fixed = course_content("Photography Course");
    fixed.fee = 0;
    let resubmitted = services
        .drafts
        .patch(
            &advocate,
            draft.id,
            PatchDraftRequest {
                title: None,
                content: Some(DraftContent::Course(fixed)),
                submit: true,
                decision: None,
                notes: None,
            },
            Utc::now(),
        )
        .await
        .unwrap();
    assert_eq!(resubmitted.status, DraftStatus::Pending);
    assert!(resubmitted.review_notes.is_none());

    let approved = services
        .drafts
        .patch(
            &reviewer,
            draft.id,
            review_patch(ReviewDecision::Approved, None),
            Utc::now(),
        )
        .await
        .unwrap();
    assert_eq!(approved.status, DraftStatus::Approved);

    let published = backend.list_published_courses().await.unwrap();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].fee, 0);
    assert_eq!(published[0].created_by, advocate.user_id);
}

#[tokio::test]
async fn approved_course_appears_in_the_public_listing() {
    let (backend, services) = harness();
    let org = seed_org(&backend, "Yangon Youth Center").await;
    let advocate = seed_user(&backend, Role::YouthAdvocate, Some(org)).await;
    let reviewer = seed_user(&backend, Role::OrganizationAdmin, Some(org)).await;

    let course = publish_course(&backend, &services, &advocate, &reviewer, "Weaving Basics").await;

    let page = services
        .courses
        .list_public(CourseListQuery::default().into_query())
        .await
        .unwrap();
    assert_eq!(page.pagination.total, 1);
    assert_eq!(page.courses[0].slug, course.slug);
    assert_eq!(page.courses[0].organization_name, "Yangon Youth Center");

    let (detail, org_name) = services
        .courses
        .get_published_by_slug(&course.slug)
        .await
        .unwrap();
    assert_eq!(detail.id, course.id);
    assert_eq!(org_name, "Yangon Youth Center");
}

#[tokio::test]
async fn reviewer_queue_is_limited_to_the_reviewer_org() {
    let (backend, services) = harness();
    let org_a = seed_org(&backend, "Org A").await;
    let org_b = seed_org(&backend, "Org B").await;
    let advocate_a = seed_user(&backend, Role::YouthAdvocate, Some(org_a)).await;
    let advocate_b = seed_user(&backend, Role::YouthAdvocate, Some(org_b)).await;
    let admin_a = seed_user(&backend, Role::OrganizationAdmin, Some(org_a)).await;
    let platform = seed_user(&backend, Role::PlatformAdmin, None).await;

    for (actor, title) in [(&advocate_a, "Course A"), (&advocate_b, "Course B")] {
        services
            .drafts
            .create(
                actor,
                CreateDraftRequest {
                    title: title.to_string(),
                    content: DraftContent::Course(course_content(title)),
                    submit: true,
                },
                Utc::now(),
            )
            .await
            .unwrap();
    }

    let queue_a = services.drafts.list_pending(&admin_a).await.unwrap();
    assert_eq!(queue_a.len(), 1);
    assert_eq!(queue_a[0].title, "Course A");

    let queue_platform = services.drafts.list_pending(&platform).await.unwrap();
    assert_eq!(queue_platform.len(), 2);

    let err = services.drafts.list_pending(&advocate_a).await.unwrap_err();
    assert_eq!(err, DomainError::Forbidden);
}

#[tokio::test]
async fn copy_produces_a_fresh_editable_draft() {
    let (backend, services) = harness();
    let advocate = seed_user(&backend, Role::YouthAdvocate, None).await;

    let original = services
        .drafts
        .create(
            &advocate,
            CreateDraftRequest {
                title: "Pottery Course".to_string(),
                content: DraftContent::Course(course_content("Pottery Course")),
                submit: true,
            },
            Utc::now(),
        )
        .await
        .unwrap();

    let copy = services
        .drafts
        .copy(&advocate, original.id, Utc::now())
        .await
        .unwrap();
    assert_ne!(copy.id, original.id);
    assert_eq!(copy.status, DraftStatus::Draft);
    assert_eq!(copy.title, "Copy of Pottery Course");
    assert_eq!(copy.content, original.content);
    assert!(copy.submitted_at.is_some());

    services.drafts.delete(&advocate, copy.id).await.unwrap();
    let err = services.drafts.get(&advocate, copy.id).await.unwrap_err();
    assert_eq!(err, DomainError::NotFound);
}

#[tokio::test]
async fn creators_delete_their_own_drafts_regardless_of_role() {
    let (backend, services) = harness();
    let org = seed_org(&backend, "Org").await;
    let org_admin = seed_user(&backend, Role::OrganizationAdmin, Some(org)).await;

    let draft = services
        .drafts
        .create(
            &org_admin,
            CreateDraftRequest {
                title: "Evening Classes".to_string(),
                content: DraftContent::Course(course_content("Evening Classes")),
                submit: false,
            },
            Utc::now(),
        )
        .await
        .unwrap();

    services.drafts.delete(&org_admin, draft.id).await.unwrap();
    let err = services.drafts.get(&org_admin, draft.id).await.unwrap_err();
    assert_eq!(err, DomainError::NotFound);

    // A non-creator org admin still cannot delete someone else's draft.
    let advocate = seed_user(&backend, Role::YouthAdvocate, Some(org)).await;
    let theirs = services
        .drafts
        .create(
            &advocate,
            CreateDraftRequest {
                title: "Workshop".to_string(),
                content: DraftContent::Course(course_content("Workshop")),
                submit: false,
            },
            Utc::now(),
        )
        .await
        .unwrap();
    let err = services
        .drafts
        .delete(&org_admin, theirs.id)
        .await
        .unwrap_err();
    assert_eq!(err, DomainError::Forbidden);
}

#[tokio::test]
async fn approved_drafts_cannot_be_deleted() {
    let (backend, services) = harness();
    let org = seed_org(&backend, "Org").await;
    let advocate = seed_user(&backend, Role::YouthAdvocate, Some(org)).await;
    let reviewer = seed_user(&backend, Role::OrganizationAdmin, Some(org)).await;

    publish_course(&backend, &services, &advocate, &reviewer, "Carpentry").await;

    let drafts = services.drafts.list_mine(&advocate).await.unwrap();
    let approved = drafts
        .iter()
        .find(|d| d.status == DraftStatus::Approved)
        .unwrap();

    let err = services
        .drafts
        .delete(&advocate, approved.id)
        .await
        .unwrap_err();
    assert_eq!(err, DomainError::Forbidden);

    // Another advocate cannot delete someone else's draft either.
    let other = seed_user(&backend, Role::YouthAdvocate, Some(org)).await;
    let err = services.drafts.delete(&other, approved.id).await.unwrap_err();
    assert_eq!(err, DomainError::Forbidden);
}

// ───── shadow-edit protocol ─────

#[tokio::test]
async fn course_edit_hides_the_course_and_blocks_a_second_edit() {
    let (backend, services) = harness();
    let org = seed_org(&backend, "Org").await;
    let advocate = seed_user(&backend, Role::YouthAdvocate, Some(org)).await;
    let reviewer = seed_user(&backend, Role::OrganizationAdmin, Some(org)).await;

    let course = publish_course(&backend, &services, &advocate, &reviewer, "Sewing").await;

    let submission = services
        .drafts
        .submit_course_edit(
            &advocate,
            course.id,
            CourseEditRequest {
                title: None,
                changes: CoursePatch {
                    fee: Some(0),
                    ..Default::default()
                },
            },
            Utc::now(),
        )
        .await
        .unwrap();
    assert_eq!(submission.hide, HideOutcome::Hidden);
    assert_eq!(submission.draft.original_course_id, Some(course.id));
    assert_eq!(submission.draft.status, DraftStatus::Pending);

    let hidden = backend.get_course(course.id).await.unwrap().unwrap();
    assert_eq!(hidden.status, CourseStatus::UnderReview);

    let err = services
        .courses
        .get_published_by_slug(&course.slug)
        .await
        .unwrap_err();
    assert_eq!(err, DomainError::NotFound);

    let err = services
        .drafts
        .submit_course_edit(
            &advocate,
            course.id,
            CourseEditRequest {
                title: None,
                changes: CoursePatch::default(),
            },
            Utc::now(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));
}

#[tokio::test]
async fn approved_edit_applies_the_snapshot_and_republishes() {
    let (backend, services) = harness();
    let org = seed_org(&backend, "Org").await;
    let advocate = seed_user(&backend, Role::YouthAdvocate, Some(org)).await;
    let reviewer = seed_user(&backend, Role::OrganizationAdmin, Some(org)).await;

    let course = publish_course(&backend, &services, &advocate, &reviewer, "Baking").await;
    let submission = services
        .drafts
        .submit_course_edit(
            &advocate,
            course.id,
            CourseEditRequest {
                title: None,
                changes: CoursePatch {
                    fee: Some(0),
                    district: Some("Bahan".to_string()),
                    ..Default::default()
                },
            },
            Utc::now(),
        )
        .await
        .unwrap();

    services
        .drafts
        .patch(
            &reviewer,
            submission.draft.id,
            review_patch(ReviewDecision::Approved, None),
            Utc::now(),
        )
        .await
        .unwrap();

    let updated = backend.get_course(course.id).await.unwrap().unwrap();
    assert_eq!(updated.status, CourseStatus::Published);
    assert_eq!(updated.fee, 0);
    assert_eq!(updated.district, "Bahan");
    assert_eq!(updated.slug, course.slug);
    assert_eq!(updated.last_modified_by, advocate.user_id);
}

#[tokio::test]
async fn rejected_edit_restores_visibility_with_fields_untouched() {
    let (backend, services) = harness();
    let org = seed_org(&backend, "Org").await;
    let advocate = seed_user(&backend, Role::YouthAdvocate, Some(org)).await;
    let reviewer = seed_user(&backend, Role::OrganizationAdmin, Some(org)).await;

    let course = publish_course(&backend, &services, &advocate, &reviewer, "Welding").await;
    let submission = services
        .drafts
        .submit_course_edit(
            &advocate,
            course.id,
            CourseEditRequest {
                title: None,
                changes: CoursePatch {
                    fee: Some(999_999),
                    ..Default::default()
                },
            },
            Utc::now(),
        )
        .await
        .unwrap();

    services
        .drafts
        .patch(
            &reviewer,
            submission.draft.id,
            review_patch(ReviewDecision::Rejected, Some("fee is implausible")),
            Utc::now(),
        )
        .await
        .unwrap();

    let restored = backend.get_course(course.id).await.unwrap().unwrap();
    assert_eq!(restored.status, CourseStatus::Published);
    assert_eq!(restored.fee, course.fee);
    assert_eq!(restored.title, course.title);
}

#[tokio::test]
async fn failed_hide_still_commits_the_edit_draft() {
    let (backend, services) = harness();
    let org = seed_org(&backend, "Org").await;
    let advocate = seed_user(&backend, Role::YouthAdvocate, Some(org)).await;
    let reviewer = seed_user(&backend, Role::OrganizationAdmin, Some(org)).await;

    let course = publish_course(&backend, &services, &advocate, &reviewer, "Coding").await;
    backend.fail_hide_updates(true);

    let submission = services
        .drafts
        .submit_course_edit(
            &advocate,
            course.id,
            CourseEditRequest {
                title: None,
                changes: CoursePatch::default(),
            },
            Utc::now(),
        )
        .await
        .unwrap();
    assert_eq!(submission.hide, HideOutcome::TimestampOnly);

    // The course stays visible, but the pending draft exists.
    let still_visible = backend.get_course(course.id).await.unwrap().unwrap();
    assert_eq!(still_visible.status, CourseStatus::Published);
    assert!(backend
        .find_active_edit(course.id)
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn resubmitting_a_rejected_edit_rehides_the_course() {
    let (backend, services) = harness();
    let org = seed_org(&backend, "Org").await;
    let advocate = seed_user(&backend, Role::YouthAdvocate, Some(org)).await;
    let reviewer = seed_user(&backend, Role::OrganizationAdmin, Some(org)).await;

    let course = publish_course(&backend, &services, &advocate, &reviewer, "Gardening").await;
    let submission = services
        .drafts
        .submit_course_edit(
            &advocate,
            course.id,
            CourseEditRequest {
                title: None,
                changes: CoursePatch {
                    fee: Some(0),
                    ..Default::default()
                },
            },
            Utc::now(),
        )
        .await
        .unwrap();

    services
        .drafts
        .patch(
            &reviewer,
            submission.draft.id,
            review_patch(ReviewDecision::Rejected, Some("fee unclear")),
            Utc::now(),
        )
        .await
        .unwrap();
    let restored = backend.get_course(course.id).await.unwrap().unwrap();
    assert_eq!(restored.status, CourseStatus::Published);

    let resubmitted = services
        .drafts
        .patch(
            &advocate,
            submission.draft.id,
            PatchDraftRequest {
                title: None,
                content: None,
                submit: true,
                decision: None,
                notes: None,
            },
            Utc::now(),
        )
        .await
        .unwrap();
    assert_eq!(resubmitted.status, DraftStatus::Pending);

    // The course goes back under review, exactly as on first submission.
    let hidden = backend.get_course(course.id).await.unwrap().unwrap();
    assert_eq!(hidden.status, CourseStatus::UnderReview);
}

#[tokio::test]
async fn resubmission_respects_the_single_active_edit_rule() {
    let (backend, services) = harness();
    let org = seed_org(&backend, "Org").await;
    let advocate = seed_user(&backend, Role::YouthAdvocate, Some(org)).await;
    let reviewer = seed_user(&backend, Role::OrganizationAdmin, Some(org)).await;

    let course = publish_course(&backend, &services, &advocate, &reviewer, "Painting").await;
    let first = services
        .drafts
        .submit_course_edit(
            &advocate,
            course.id,
            CourseEditRequest {
                title: None,
                changes: CoursePatch::default(),
            },
            Utc::now(),
        )
        .await
        .unwrap();

    services
        .drafts
        .patch(
            &reviewer,
            first.draft.id,
            review_patch(ReviewDecision::Rejected, None),
            Utc::now(),
        )
        .await
        .unwrap();

    // A second edit takes the slot while the first sits rejected.
    let second = services
        .drafts
        .submit_course_edit(
            &advocate,
            course.id,
            CourseEditRequest {
                title: None,
                changes: CoursePatch::default(),
            },
            Utc::now(),
        )
        .await
        .unwrap();

    let err = services
        .drafts
        .patch(
            &advocate,
            first.draft.id,
            PatchDraftRequest {
                title: None,
                content: None,
                submit: true,
                decision: None,
                notes: None,
            },
            Utc::now(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));

    // The failed resubmission persisted nothing: the first draft is still
    // rejected and only the second edit is active.
    let stored = backend.get_draft(first.draft.id).await.unwrap().unwrap();
    assert_eq!(stored.status, DraftStatus::Rejected);
    let active = backend.find_active_edit(course.id).await.unwrap().unwrap();
    assert_eq!(active.id, second.draft.id);
}

// ───── organization drafts ─────

#[tokio::test]
async fn approved_organization_draft_upserts_the_organization() {
    let (backend, services) = harness();
    let platform = seed_user(&backend, Role::PlatformAdmin, None).await;

    let draft = services
        .drafts
        .create(
            &platform,
            CreateDraftRequest {
                title: "New Partner".to_string(),
                content: DraftContent::Organization(OrganizationContent {
                    name: Bilingual::en_only("Bago Learning Hub"),
                    ..Default::default()
                }),
                submit: true,
            },
            Utc::now(),
        )
        .await
        .unwrap();

    services
        .drafts
        .patch(
            &platform,
            draft.id,
            review_patch(ReviewDecision::Approved, None),
            Utc::now(),
        )
        .await
        .unwrap();

    let orgs = backend.list_organizations().await.unwrap();
    assert_eq!(orgs.len(), 1);
    assert_eq!(orgs[0].name.en, "Bago Learning Hub");
}

// ───── advocate profiles & ranking ─────

#[tokio::test]
async fn profile_review_and_ranking_flow() {
    let (backend, services) = harness();
    let org = seed_org(&backend, "Org").await;
    let reviewer = seed_user(&backend, Role::OrganizationAdmin, Some(org)).await;
    let alice = seed_user(&backend, Role::YouthAdvocate, Some(org)).await;
    let bob = seed_user(&backend, Role::YouthAdvocate, Some(org)).await;

    for (actor, name) in [(&alice, "Alice"), (&bob, "Bob")] {
        let profile = services
            .advocates
            .create_profile(
                actor,
                CreateProfileRequest {
                    public_name: name.to_string(),
                    bio: "Community organizer.".to_string(),
                    avatar_url: None,
                    show_organization: false,
                    submit: true,
                },
                Utc::now(),
            )
            .await
            .unwrap();
        assert_eq!(profile.status, ProfileStatus::Pending);
    }

    let pending = services.advocates.list_pending(&reviewer).await.unwrap();
    assert_eq!(pending.len(), 2);
    for profile in pending {
        services
            .advocates
            .review(
                &reviewer,
                profile.id,
                ReviewRequest {
                    decision: ReviewDecision::Approved,
                    notes: None,
                },
                Utc::now(),
            )
            .await
            .unwrap();
    }

    // Alice authors two published courses, Bob one.
    publish_course(&backend, &services, &alice, &reviewer, "Alice One").await;
    publish_course(&backend, &services, &alice, &reviewer, "Alice Two").await;
    publish_course(&backend, &services, &bob, &reviewer, "Bob One").await;

    let ranked = services.advocates.list_public().await.unwrap();
    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0].profile.public_name, "Alice");
    assert_eq!(ranked[0].course_count, 2);
    assert_eq!(ranked[0].rank, 1);
    assert_eq!(ranked[1].profile.public_name, "Bob");

    assert_eq!(services.advocates.my_rank(&alice).await.unwrap(), Some(1));
    assert_eq!(services.advocates.my_rank(&bob).await.unwrap(), Some(2));

    // Hiding removes Alice from the listing and her rank.
    let hidden = services
        .advocates
        .hide_my_profile(&alice, Utc::now())
        .await
        .unwrap();
    assert_eq!(hidden.status, ProfileStatus::Hidden);

    let ranked = services.advocates.list_public().await.unwrap();
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].profile.public_name, "Bob");
    assert_eq!(ranked[0].rank, 1);
    assert_eq!(services.advocates.my_rank(&alice).await.unwrap(), None);

    // Unhide restores the approved listing.
    services
        .advocates
        .unhide_my_profile(&alice, Utc::now())
        .await
        .unwrap();
    assert_eq!(services.advocates.my_rank(&alice).await.unwrap(), Some(1));
}

// ───── admin self-protection ─────

#[tokio::test]
async fn admins_cannot_rewrite_their_own_authority() {
    let (backend, services) = harness();
    let admin = seed_user(&backend, Role::PlatformAdmin, None).await;

    let err = services
        .admin
        .change_role(
            &admin,
            admin.user_id,
            ChangeRoleRequest {
                role: Role::YouthAdvocate,
                organization_id: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err, DomainError::Forbidden);

    let err = services
        .admin
        .deactivate_user(&admin, admin.user_id)
        .await
        .unwrap_err();
    assert_eq!(err, DomainError::Forbidden);
}

#[tokio::test]
async fn the_last_active_platform_admin_is_protected() {
    let (backend, services) = harness();
    let first = seed_user(&backend, Role::PlatformAdmin, None).await;
    let second = seed_user(&backend, Role::PlatformAdmin, None).await;

    // Two active admins: deactivation is allowed.
    services
        .admin
        .deactivate_user(&first, second.user_id)
        .await
        .unwrap();

    // Now `first` is the last active platform admin.
    let err = services
        .admin
        .change_role(
            &second,
            first.user_id,
            ChangeRoleRequest {
                role: Role::YouthAdvocate,
                organization_id: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));

    let err = services
        .admin
        .deactivate_user(&second, first.user_id)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));

    // Reactivation lifts the guard again.
    services
        .admin
        .reactivate_user(&first, second.user_id)
        .await
        .unwrap();
    services
        .admin
        .deactivate_user(&first, second.user_id)
        .await
        .unwrap();
}

#[tokio::test]
async fn organization_delete_is_blocked_while_it_owns_records() {
    let (backend, services) = harness();
    let platform = seed_user(&backend, Role::PlatformAdmin, None).await;
    let org = seed_org(&backend, "Occupied Org").await;
    let _member = seed_user(&backend, Role::OrganizationAdmin, Some(org)).await;

    let err = services
        .admin
        .delete_organization(&platform, org)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));

    let empty = seed_org(&backend, "Empty Org").await;
    services
        .admin
        .delete_organization(&platform, empty)
        .await
        .unwrap();
    let err = services
        .admin
        .get_organization(&platform, empty)
        .await
        .unwrap_err();
    assert_eq!(err, DomainError::NotFound);
}

#[tokio::test]
async fn role_changes_cannot_move_users_across_organizations() {
    let (backend, services) = harness();
    let org_x = seed_org(&backend, "Org X").await;
    let org_y = seed_org(&backend, "Org Y").await;
    let admin_x = seed_user(&backend, Role::OrganizationAdmin, Some(org_x)).await;
    let advocate = seed_user(&backend, Role::YouthAdvocate, Some(org_x)).await;
    let platform = seed_user(&backend, Role::PlatformAdmin, None).await;

    // An org admin has no authority over the destination organization.
    let err = services
        .admin
        .change_role(
            &admin_x,
            advocate.user_id,
            ChangeRoleRequest {
                role: Role::YouthAdvocate,
                organization_id: Some(org_y),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err, DomainError::Forbidden);
    let unchanged = backend.get_user(advocate.user_id).await.unwrap().unwrap();
    assert_eq!(unchanged.organization_id, Some(org_x));

    let moved = services
        .admin
        .change_role(
            &platform,
            advocate.user_id,
            ChangeRoleRequest {
                role: Role::YouthAdvocate,
                organization_id: Some(org_y),
            },
        )
        .await
        .unwrap();
    assert_eq!(moved.organization_id, Some(org_y));
}

#[tokio::test]
async fn bearer_auth_gates_protected_routes() {
    let (backend, services) = harness();
    let advocate = seed_user(&backend, Role::YouthAdvocate, None).await;
    let user = backend.get_user(advocate.user_id).await.unwrap().unwrap();

    let app = crate::app::build_app(Arc::new(services), "test-secret".to_string());

    let res = app
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app
        .clone()
        .oneshot(Request::get("/whoami").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let token = SessionCodec::new(b"test-secret")
        .encode(&claims_for(&user.email))
        .unwrap();
    let res = app
        .oneshot(
            Request::get("/whoami")
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}
