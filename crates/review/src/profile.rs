//! Advocate profile moderation.
//!
//! Structurally the same review machine as [`crate::draft`], but 1:1 with a
//! user and with `Hidden` standing in for post-approval deletion: an approved
//! profile is immutable, yet its owner can take it off the public listing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use coursehub_core::{DomainError, DomainResult, OrganizationId, ProfileId, UserId};

use crate::draft::ReviewDecision;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProfileStatus {
    Draft,
    Pending,
    Approved,
    Rejected,
    /// Approved but taken off the public listing by its owner.
    Hidden,
}

/// A youth advocate's public-facing bio record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvocateProfile {
    pub id: ProfileId,
    /// Unique: one profile per user.
    pub user_id: UserId,
    /// Denormalized from the user at creation; scopes org-admin review.
    pub organization_id: Option<OrganizationId>,
    pub public_name: String,
    pub bio: String,
    pub avatar_url: Option<String>,
    pub show_organization: bool,
    pub status: ProfileStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<UserId>,
    pub review_notes: Option<String>,
}

impl AdvocateProfile {
    pub fn new(
        user_id: UserId,
        organization_id: Option<OrganizationId>,
        public_name: String,
        bio: String,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if public_name.trim().is_empty() {
            return Err(DomainError::validation("public name cannot be empty"));
        }

        Ok(Self {
            id: ProfileId::new(),
            user_id,
            organization_id,
            public_name,
            bio,
            avatar_url: None,
            show_organization: false,
            status: ProfileStatus::Draft,
            created_at: now,
            updated_at: now,
            submitted_at: None,
            reviewed_at: None,
            reviewed_by: None,
            review_notes: None,
        })
    }

    pub fn is_public(&self) -> bool {
        self.status == ProfileStatus::Approved
    }

    /// Owner edit, allowed while the profile is `Draft` or `Rejected`.
    pub fn edit(
        &mut self,
        public_name: Option<String>,
        bio: Option<String>,
        avatar_url: Option<Option<String>>,
        show_organization: Option<bool>,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        match self.status {
            ProfileStatus::Draft | ProfileStatus::Rejected => {}
            ProfileStatus::Approved | ProfileStatus::Hidden => {
                return Err(DomainError::Forbidden);
            }
            ProfileStatus::Pending => {
                return Err(DomainError::invalid_transition(
                    "profile is awaiting review and cannot be edited",
                ));
            }
        }

        if let Some(public_name) = public_name {
            if public_name.trim().is_empty() {
                return Err(DomainError::validation("public name cannot be empty"));
            }
            self.public_name = public_name;
        }
        if let Some(bio) = bio {
            self.bio = bio;
        }
        if let Some(avatar_url) = avatar_url {
            self.avatar_url = avatar_url;
        }
        if let Some(show_organization) = show_organization {
            self.show_organization = show_organization;
        }
        self.updated_at = now;
        Ok(())
    }

    /// Submit (or resubmit after rejection) for moderation.
    pub fn submit(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        match self.status {
            ProfileStatus::Draft | ProfileStatus::Rejected => {
                self.status = ProfileStatus::Pending;
                self.submitted_at = Some(now);
                self.reviewed_at = None;
                self.reviewed_by = None;
                self.review_notes = None;
                self.updated_at = now;
                Ok(())
            }
            ProfileStatus::Pending => Err(DomainError::invalid_transition(
                "profile is already awaiting review",
            )),
            ProfileStatus::Approved | ProfileStatus::Hidden => Err(DomainError::Forbidden),
        }
    }

    pub fn review(
        &mut self,
        decision: ReviewDecision,
        reviewer: UserId,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        if self.status != ProfileStatus::Pending {
            return Err(DomainError::invalid_transition(
                "only pending profiles can be reviewed",
            ));
        }

        self.status = match decision {
            ReviewDecision::Approved => ProfileStatus::Approved,
            ReviewDecision::Rejected => ProfileStatus::Rejected,
        };
        self.reviewed_by = Some(reviewer);
        self.reviewed_at = Some(now);
        self.review_notes = notes;
        self.updated_at = now;
        Ok(())
    }

    /// Take an approved profile off the public listing (owner's substitute for
    /// deletion).
    pub fn hide(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        if self.status != ProfileStatus::Approved {
            return Err(DomainError::invalid_transition(
                "only approved profiles can be hidden",
            ));
        }
        self.status = ProfileStatus::Hidden;
        self.updated_at = now;
        Ok(())
    }

    /// Put a hidden profile back on the public listing.
    pub fn unhide(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        if self.status != ProfileStatus::Hidden {
            return Err(DomainError::invalid_transition(
                "profile is not hidden",
            ));
        }
        self.status = ProfileStatus::Approved;
        self.updated_at = now;
        Ok(())
    }
}
