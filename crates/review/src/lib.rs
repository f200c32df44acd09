//! `coursehub-review` — the draft/review workflow.
//!
//! Holds the [`ContentDraft`] entity with its typed content snapshot, the
//! review state machine shared with [`AdvocateProfile`] moderation, and the
//! public advocate ranking. All transitions are pure; the service layer applies
//! them between guard checks and store writes.

pub mod content;
pub mod draft;
pub mod profile;
pub mod ranking;

pub use content::{CourseContent, CoursePatch, DraftContent, DraftType, OrganizationContent};
pub use draft::{ContentDraft, DraftStatus, ReviewDecision};
pub use profile::{AdvocateProfile, ProfileStatus};
pub use ranking::{my_rank, rank_advocates, RankedAdvocate};
