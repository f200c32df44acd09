use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use coursehub_core::{CourseId, OrganizationId, UserId};

/// An English/Myanmar text pair.
///
/// The Myanmar side is optional on input forms, so it defaults to empty rather
/// than being an `Option` — display code falls back to English when empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Bilingual {
    pub en: String,
    #[serde(default)]
    pub my: String,
}

impl Bilingual {
    pub fn new(en: impl Into<String>, my: impl Into<String>) -> Self {
        Self {
            en: en.into(),
            my: my.into(),
        }
    }

    pub fn en_only(en: impl Into<String>) -> Self {
        Self {
            en: en.into(),
            my: String::new(),
        }
    }
}

/// Publication status of a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CourseStatus {
    /// Publicly visible.
    Published,
    /// A shadow edit is in flight; the row exists but is hidden from public
    /// listings.
    UnderReview,
}

/// Image attached to a course (already uploaded; only the URL is stored).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseImage {
    pub url: String,
    #[serde(default)]
    pub caption: Option<String>,
}

/// Display badge carried by a course ("Free", "Certificate", ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    pub text: String,
}

impl Badge {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Frequently-asked question entry attached to a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqEntry {
    pub question: String,
    pub answer: String,
}

/// Published, publicly visible unit of content.
///
/// # Invariants
/// - `slug` is unique, derived from title + organization + id (see
///   [`crate::slug`]).
/// - A course with [`CourseStatus::UnderReview`] is excluded from public
///   listings but still exists in storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub slug: String,
    pub title: Bilingual,
    pub description: Bilingual,
    pub district: String,
    pub province: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub apply_by_date: Option<DateTime<Utc>>,
    /// Fee in the smallest currency unit; zero means free.
    pub fee: i64,
    pub status: CourseStatus,
    pub organization_id: OrganizationId,
    pub created_by: UserId,
    pub last_modified_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub images: Vec<CourseImage>,
    pub badges: Vec<Badge>,
    pub faq: Vec<FaqEntry>,
}

impl Course {
    pub fn is_public(&self) -> bool {
        self.status == CourseStatus::Published
    }

    pub fn has_badge(&self, text: &str) -> bool {
        self.badges.iter().any(|b| b.text.eq_ignore_ascii_case(text))
    }
}
