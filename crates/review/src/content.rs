//! Typed draft content snapshots.
//!
//! A draft carries a full snapshot of the proposed entity state. The snapshot
//! is a tagged union keyed by draft type, so a COURSE draft can never be read
//! as an ORGANIZATION one — shape mismatches fail at the type level, not at
//! runtime field access.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use coursehub_catalog::{
    slug, Badge, Bilingual, ContactInfo, Course, CourseImage, CourseStatus, FaqEntry, GeoPoint,
    Organization,
};
use coursehub_core::{CourseId, OrganizationId, UserId};

/// What a draft proposes to create or update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DraftType {
    Course,
    Organization,
}

/// Full snapshot of the proposed entity state, typed per draft kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DraftContent {
    Course(CourseContent),
    Organization(OrganizationContent),
}

impl DraftContent {
    pub fn draft_type(&self) -> DraftType {
        match self {
            DraftContent::Course(_) => DraftType::Course,
            DraftContent::Organization(_) => DraftType::Organization,
        }
    }
}

/// Proposed course state (everything a published course carries except
/// identity, ownership, and status).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CourseContent {
    pub title: Bilingual,
    pub description: Bilingual,
    pub district: String,
    pub province: String,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub apply_by_date: Option<DateTime<Utc>>,
    pub fee: i64,
    pub images: Vec<CourseImage>,
    pub badges: Vec<Badge>,
    pub faq: Vec<FaqEntry>,
}

impl CourseContent {
    /// Snapshot an existing published course (the base of a shadow edit).
    pub fn from_course(course: &Course) -> Self {
        Self {
            title: course.title.clone(),
            description: course.description.clone(),
            district: course.district.clone(),
            province: course.province.clone(),
            start_date: Some(course.start_date),
            end_date: course.end_date,
            apply_by_date: course.apply_by_date,
            fee: course.fee,
            images: course.images.clone(),
            badges: course.badges.clone(),
            faq: course.faq.clone(),
        }
    }

    /// Overlay submitted changes on this snapshot, field by field.
    pub fn merged(mut self, patch: CoursePatch) -> Self {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(district) = patch.district {
            self.district = district;
        }
        if let Some(province) = patch.province {
            self.province = province;
        }
        if let Some(start_date) = patch.start_date {
            self.start_date = Some(start_date);
        }
        if let Some(end_date) = patch.end_date {
            self.end_date = Some(end_date);
        }
        if let Some(apply_by_date) = patch.apply_by_date {
            self.apply_by_date = Some(apply_by_date);
        }
        if let Some(fee) = patch.fee {
            self.fee = fee;
        }
        if let Some(images) = patch.images {
            self.images = images;
        }
        if let Some(badges) = patch.badges {
            self.badges = badges;
        }
        if let Some(faq) = patch.faq {
            self.faq = faq;
        }
        self
    }

    /// Materialize a brand-new published course from this snapshot.
    pub fn into_course(
        self,
        organization_id: OrganizationId,
        organization_name: &str,
        created_by: UserId,
        now: DateTime<Utc>,
    ) -> Course {
        let id = CourseId::new();
        Course {
            id,
            slug: slug::derive(&self.title.en, organization_name, id),
            title: self.title,
            description: self.description,
            district: self.district,
            province: self.province,
            start_date: self.start_date.unwrap_or(now),
            end_date: self.end_date,
            apply_by_date: self.apply_by_date,
            fee: self.fee,
            status: CourseStatus::Published,
            organization_id,
            created_by,
            last_modified_by: created_by,
            created_at: now,
            updated_at: now,
            images: self.images,
            badges: self.badges,
            faq: self.faq,
        }
    }

    /// Overwrite an existing course's public-visible fields with this snapshot
    /// (shadow-edit approval). Identity, slug, and ownership stay put.
    pub fn apply_to(self, course: &mut Course, editor: UserId, now: DateTime<Utc>) {
        course.title = self.title;
        course.description = self.description;
        course.district = self.district;
        course.province = self.province;
        if let Some(start_date) = self.start_date {
            course.start_date = start_date;
        }
        course.end_date = self.end_date;
        course.apply_by_date = self.apply_by_date;
        course.fee = self.fee;
        course.images = self.images;
        course.badges = self.badges;
        course.faq = self.faq;
        course.status = CourseStatus::Published;
        course.last_modified_by = editor;
        course.updated_at = now;
    }
}

/// Submitted field changes for a shadow edit (all optional; unset fields keep
/// the published value).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CoursePatch {
    pub title: Option<Bilingual>,
    pub description: Option<Bilingual>,
    pub district: Option<String>,
    pub province: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub apply_by_date: Option<DateTime<Utc>>,
    pub fee: Option<i64>,
    pub images: Option<Vec<CourseImage>>,
    pub badges: Option<Vec<Badge>>,
    pub faq: Option<Vec<FaqEntry>>,
}

/// Proposed organization state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct OrganizationContent {
    pub name: Bilingual,
    pub description: Bilingual,
    pub contact: ContactInfo,
    pub location: Option<GeoPoint>,
    pub logo_url: Option<String>,
}

impl OrganizationContent {
    pub fn from_organization(org: &Organization) -> Self {
        Self {
            name: org.name.clone(),
            description: org.description.clone(),
            contact: org.contact.clone(),
            location: org.location,
            logo_url: org.logo_url.clone(),
        }
    }

    pub fn into_organization(self, id: OrganizationId, now: DateTime<Utc>) -> Organization {
        Organization {
            id,
            name: self.name,
            description: self.description,
            contact: self.contact,
            location: self.location,
            logo_url: self.logo_url,
            created_at: now,
            updated_at: now,
        }
    }
}
