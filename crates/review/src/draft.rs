//! Content drafts and the review state machine.
//!
//! ```text
//!         create(DRAFT)           create(PENDING)
//!    [start] ---------> DRAFT -------------------> PENDING
//!                         |  submit                 /    |
//!                         +------------------------+     | reject
//!                                                        v
//!                       REJECTED <------------------------+
//!                         |
//!                         | edit + resubmit (clears review fields)
//!                         v
//!                      PENDING --approve--> APPROVED (terminal, immutable)
//! ```
//!
//! All transitions are pure methods returning `DomainError` on rule
//! violations; callers persist the mutated entity only on `Ok`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use coursehub_core::{CourseId, DomainError, DomainResult, DraftId, OrganizationId, UserId};

use crate::content::{DraftContent, DraftType};

/// Review status of a draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DraftStatus {
    Draft,
    Pending,
    Approved,
    Rejected,
}

impl DraftStatus {
    /// Active drafts block a second in-flight edit of the same course.
    pub fn is_active(&self) -> bool {
        matches!(self, DraftStatus::Draft | DraftStatus::Pending)
    }
}

/// A reviewer's verdict on a pending submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewDecision {
    Approved,
    Rejected,
}

/// The pending/historical record of a proposed course or organization change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentDraft {
    pub id: DraftId,
    pub title: String,
    pub content: DraftContent,
    pub status: DraftStatus,
    pub created_by: UserId,
    pub organization_id: Option<OrganizationId>,
    /// Set only when this draft is a shadow edit of a published course.
    pub original_course_id: Option<CourseId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<UserId>,
    pub review_notes: Option<String>,
}

impl ContentDraft {
    /// Create a draft. Only `Draft` and `Pending` are legal initial statuses;
    /// submitting at creation stamps `submitted_at`.
    pub fn new(
        created_by: UserId,
        organization_id: Option<OrganizationId>,
        title: String,
        content: DraftContent,
        submit: bool,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if title.trim().is_empty() {
            return Err(DomainError::validation("draft title cannot be empty"));
        }

        Ok(Self {
            id: DraftId::new(),
            title,
            content,
            status: if submit {
                DraftStatus::Pending
            } else {
                DraftStatus::Draft
            },
            created_by,
            organization_id,
            original_course_id: None,
            created_at: now,
            updated_at: now,
            submitted_at: submit.then_some(now),
            reviewed_at: None,
            reviewed_by: None,
            review_notes: None,
        })
    }

    pub fn draft_type(&self) -> DraftType {
        self.content.draft_type()
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Edit path: change title/content while the draft is `Draft` or
    /// `Rejected`. Ownership is the guard's business; state rules are ours.
    pub fn edit(
        &mut self,
        title: Option<String>,
        content: Option<DraftContent>,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        match self.status {
            DraftStatus::Draft | DraftStatus::Rejected => {}
            // Approved drafts are immutable, full stop.
            DraftStatus::Approved => return Err(DomainError::Forbidden),
            DraftStatus::Pending => {
                return Err(DomainError::invalid_transition(
                    "draft is awaiting review and cannot be edited",
                ));
            }
        }

        if let Some(title) = title {
            if title.trim().is_empty() {
                return Err(DomainError::validation("draft title cannot be empty"));
            }
            self.title = title;
        }
        if let Some(content) = content {
            if content.draft_type() != self.draft_type() {
                return Err(DomainError::validation(
                    "draft content type cannot change after creation",
                ));
            }
            self.content = content;
        }
        self.updated_at = now;
        Ok(())
    }

    /// Submit (or resubmit) for review. Resubmission clears the previous
    /// review verdict and stamps a fresh `submitted_at`.
    pub fn submit(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        match self.status {
            DraftStatus::Draft | DraftStatus::Rejected => {
                self.status = DraftStatus::Pending;
                self.submitted_at = Some(now);
                self.reviewed_at = None;
                self.reviewed_by = None;
                self.review_notes = None;
                self.updated_at = now;
                Ok(())
            }
            DraftStatus::Pending => Err(DomainError::invalid_transition(
                "draft is already awaiting review",
            )),
            DraftStatus::Approved => Err(DomainError::Forbidden),
        }
    }

    /// Review path: approve or reject a pending submission.
    pub fn review(
        &mut self,
        decision: ReviewDecision,
        reviewer: UserId,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        if self.status != DraftStatus::Pending {
            return Err(DomainError::invalid_transition(
                "only pending drafts can be reviewed",
            ));
        }

        self.status = match decision {
            ReviewDecision::Approved => DraftStatus::Approved,
            ReviewDecision::Rejected => DraftStatus::Rejected,
        };
        self.reviewed_by = Some(reviewer);
        self.reviewed_at = Some(now);
        self.review_notes = notes;
        self.updated_at = now;
        Ok(())
    }

    /// Produce a copy owned by `new_owner`: fresh id, status forced to
    /// `Draft` regardless of the source status, title prefixed "Copy of ".
    pub fn copy_as(
        &self,
        new_owner: UserId,
        organization_id: Option<OrganizationId>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: DraftId::new(),
            title: format!("Copy of {}", self.title),
            content: self.content.clone(),
            status: DraftStatus::Draft,
            created_by: new_owner,
            organization_id,
            original_course_id: None,
            created_at: now,
            updated_at: now,
            submitted_at: Some(now),
            reviewed_at: None,
            reviewed_by: None,
            review_notes: None,
        }
    }

    /// Whether the creator may delete this draft (anything but approved).
    pub fn is_deletable(&self) -> bool {
        self.status != DraftStatus::Approved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{CourseContent, OrganizationContent};
    use coursehub_catalog::Bilingual;

    fn course_content() -> DraftContent {
        DraftContent::Course(CourseContent {
            title: Bilingual::en_only("Photography"),
            ..Default::default()
        })
    }

    fn new_draft(submit: bool) -> ContentDraft {
        ContentDraft::new(
            UserId::new(),
            None,
            "Photography Course".to_string(),
            course_content(),
            submit,
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn create_as_draft_has_no_submission_stamp() {
        let draft = new_draft(false);
        assert_eq!(draft.status, DraftStatus::Draft);
        assert!(draft.submitted_at.is_none());
    }

    #[test]
    fn create_as_pending_stamps_submitted_at() {
        let draft = new_draft(true);
        assert_eq!(draft.status, DraftStatus::Pending);
        assert!(draft.submitted_at.is_some());
    }

    #[test]
    fn reject_then_resubmit_clears_review_fields() {
        let mut draft = new_draft(true);
        let admin = UserId::new();

        draft
            .review(
                ReviewDecision::Rejected,
                admin,
                Some("missing fee".to_string()),
                Utc::now(),
            )
            .unwrap();
        assert_eq!(draft.status, DraftStatus::Rejected);
        assert_eq!(draft.reviewed_by, Some(admin));
        assert_eq!(draft.review_notes.as_deref(), Some("missing fee"));

        let first_submission = draft.submitted_at;
        draft
            .edit(None, Some(course_content()), Utc::now())
            .unwrap();
        draft.submit(Utc::now()).unwrap();

        assert_eq!(draft.status, DraftStatus::Pending);
        assert!(draft.reviewed_at.is_none());
        assert!(draft.reviewed_by.is_none());
        assert!(draft.review_notes.is_none());
        assert!(draft.submitted_at >= first_submission);
    }

    #[test]
    fn pending_draft_cannot_be_edited() {
        let mut draft = new_draft(true);
        let err = draft
            .edit(Some("New".to_string()), None, Utc::now())
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition(_)));
    }

    #[test]
    fn approved_draft_is_immutable() {
        let mut draft = new_draft(true);
        draft
            .review(ReviewDecision::Approved, UserId::new(), None, Utc::now())
            .unwrap();

        let before = draft.clone();
        assert_eq!(
            draft.edit(Some("X".to_string()), None, Utc::now()),
            Err(DomainError::Forbidden)
        );
        assert_eq!(draft.submit(Utc::now()), Err(DomainError::Forbidden));
        assert!(matches!(
            draft.review(ReviewDecision::Rejected, UserId::new(), None, Utc::now()),
            Err(DomainError::InvalidTransition(_))
        ));
        assert_eq!(draft, before);
        assert!(!draft.is_deletable());
    }

    #[test]
    fn review_requires_pending() {
        let mut draft = new_draft(false);
        assert!(matches!(
            draft.review(ReviewDecision::Approved, UserId::new(), None, Utc::now()),
            Err(DomainError::InvalidTransition(_))
        ));
    }

    #[test]
    fn content_type_is_fixed_at_creation() {
        let mut draft = new_draft(false);
        let err = draft
            .edit(
                None,
                Some(DraftContent::Organization(OrganizationContent::default())),
                Utc::now(),
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn copy_round_trip() {
        let mut source = new_draft(true);
        source
            .review(ReviewDecision::Approved, UserId::new(), None, Utc::now())
            .unwrap();

        let copier = UserId::new();
        let copy = source.copy_as(copier, None, Utc::now());

        assert_ne!(copy.id, source.id);
        assert_eq!(copy.content, source.content);
        assert_eq!(copy.status, DraftStatus::Draft);
        assert_eq!(copy.created_by, copier);
        assert_eq!(copy.title, format!("Copy of {}", source.title));
        assert!(copy.reviewed_by.is_none());
        assert!(copy.original_course_id.is_none());
    }

    mod machine_properties {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Edit,
            Submit,
            Approve,
            Reject,
        }

        fn op_strategy() -> impl Strategy<Value = Op> {
            prop_oneof![
                Just(Op::Edit),
                Just(Op::Submit),
                Just(Op::Approve),
                Just(Op::Reject),
            ]
        }

        proptest! {
            /// Whatever sequence of operations is attempted, the status stays
            /// inside the legal set and an approved draft never changes again.
            #[test]
            fn status_stays_legal_and_approved_is_terminal(
                start_pending: bool,
                ops in proptest::collection::vec(op_strategy(), 1..40),
            ) {
                let mut draft = new_draft(start_pending);
                let reviewer = UserId::new();
                let mut approved_snapshot: Option<ContentDraft> = None;

                for op in ops {
                    let _ = match op {
                        Op::Edit => draft.edit(Some("T".to_string()), None, Utc::now()),
                        Op::Submit => draft.submit(Utc::now()),
                        Op::Approve => {
                            let r = draft.review(ReviewDecision::Approved, reviewer, None, Utc::now());
                            if r.is_ok() {
                                approved_snapshot = Some(draft.clone());
                            }
                            r
                        }
                        Op::Reject => draft.review(ReviewDecision::Rejected, reviewer, None, Utc::now()),
                    };

                    prop_assert!(matches!(
                        draft.status,
                        DraftStatus::Draft
                            | DraftStatus::Pending
                            | DraftStatus::Approved
                            | DraftStatus::Rejected
                    ));
                    if let Some(snapshot) = &approved_snapshot {
                        prop_assert_eq!(&draft, snapshot);
                    }
                }
            }
        }
    }
}
