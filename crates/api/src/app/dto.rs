use serde::Deserialize;
use serde_json::json;

use coursehub_auth::{Invite, Role, User};
use coursehub_catalog::{Course, CourseQuery, CourseStatus, Organization, SortKey};
use coursehub_core::OrganizationId;
use coursehub_review::{
    AdvocateProfile, ContentDraft, CoursePatch, DraftContent, OrganizationContent, RankedAdvocate,
    ReviewDecision,
};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateDraftRequest {
    pub title: String,
    pub content: DraftContent,
    #[serde(default)]
    pub submit: bool,
}

/// One request shape for both patch paths: `decision` routes to review,
/// everything else to the creator's edit/submit path.
#[derive(Debug, Deserialize)]
pub struct PatchDraftRequest {
    pub title: Option<String>,
    pub content: Option<DraftContent>,
    #[serde(default)]
    pub submit: bool,
    pub decision: Option<ReviewDecision>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CourseEditRequest {
    /// Title for the resulting draft; defaults to the course title.
    pub title: Option<String>,
    #[serde(default)]
    pub changes: CoursePatch,
}

#[derive(Debug, Deserialize)]
pub struct CreateProfileRequest {
    pub public_name: String,
    #[serde(default)]
    pub bio: String,
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub show_organization: bool,
    #[serde(default)]
    pub submit: bool,
}

#[derive(Debug, Deserialize)]
pub struct PatchProfileRequest {
    pub public_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub show_organization: Option<bool>,
    #[serde(default)]
    pub submit: bool,
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub decision: ReviewDecision,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InviteRequest {
    pub email: String,
    pub role: Role,
    pub organization_id: Option<OrganizationId>,
}

#[derive(Debug, Deserialize)]
pub struct ChangeRoleRequest {
    pub role: Role,
    pub organization_id: Option<OrganizationId>,
}

#[derive(Debug, Deserialize)]
pub struct OrganizationRequest {
    #[serde(flatten)]
    pub content: OrganizationContent,
}

/// Query string of the public course listing.
#[derive(Debug, Default, Deserialize)]
pub struct CourseListQuery {
    pub search: Option<String>,
    /// Comma-separated badge texts, AND-combined.
    pub badges: Option<String>,
    pub sort: Option<String>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

impl CourseListQuery {
    pub fn into_query(self) -> CourseQuery {
        CourseQuery {
            search: self.search,
            badges: self
                .badges
                .map(|s| {
                    s.split(',')
                        .map(str::trim)
                        .filter(|b| !b.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            sort: self.sort.as_deref().and_then(SortKey::parse).unwrap_or_default(),
            page: self.page.unwrap_or(1),
            page_size: self.page_size.unwrap_or(0),
        }
    }
}

// -------------------------
// Response mapping
// -------------------------

pub fn draft_to_json(draft: &ContentDraft) -> serde_json::Value {
    json!({
        "id": draft.id.to_string(),
        "title": draft.title,
        "type": match draft.content {
            DraftContent::Course(_) => "COURSE",
            DraftContent::Organization(_) => "ORGANIZATION",
        },
        "content": draft.content,
        "status": draft.status,
        "created_by": draft.created_by.to_string(),
        "organization_id": draft.organization_id.map(|id| id.to_string()),
        "original_course_id": draft.original_course_id.map(|id| id.to_string()),
        "created_at": draft.created_at.to_rfc3339(),
        "updated_at": draft.updated_at.to_rfc3339(),
        "submitted_at": draft.submitted_at.map(|d| d.to_rfc3339()),
        "reviewed_at": draft.reviewed_at.map(|d| d.to_rfc3339()),
        "reviewed_by": draft.reviewed_by.map(|id| id.to_string()),
        "review_notes": draft.review_notes,
    })
}

pub fn course_detail_to_json(course: &Course, organization_name: &str) -> serde_json::Value {
    json!({
        "id": course.id.to_string(),
        "slug": course.slug,
        "title": { "en": course.title.en, "my": course.title.my },
        "description": { "en": course.description.en, "my": course.description.my },
        "district": course.district,
        "province": course.province,
        "start_date": course.start_date.to_rfc3339(),
        "end_date": course.end_date.map(|d| d.to_rfc3339()),
        "apply_by_date": course.apply_by_date.map(|d| d.to_rfc3339()),
        "fee": course.fee,
        "status": match course.status {
            CourseStatus::Published => "PUBLISHED",
            CourseStatus::UnderReview => "UNDER_REVIEW",
        },
        "organization_id": course.organization_id.to_string(),
        "organization_name": organization_name,
        "images": course.images,
        "badges": course.badges.iter().map(|b| b.text.clone()).collect::<Vec<_>>(),
        "faq": course.faq,
    })
}

pub fn user_to_json(user: &User) -> serde_json::Value {
    json!({
        "id": user.id.to_string(),
        "email": user.email,
        "display_name": user.display_name,
        "role": user.role.as_str(),
        "organization_id": user.organization_id.map(|id| id.to_string()),
        "status": user.status,
        "created_at": user.created_at.to_rfc3339(),
        "last_login_at": user.last_login_at.map(|d| d.to_rfc3339()),
    })
}

pub fn invite_to_json(invite: &Invite) -> serde_json::Value {
    json!({
        "id": invite.id.to_string(),
        "email": invite.email,
        "role": invite.role.as_str(),
        "organization_id": invite.organization_id.map(|id| id.to_string()),
        "created_at": invite.created_at.to_rfc3339(),
        "accepted_at": invite.accepted_at.map(|d| d.to_rfc3339()),
    })
}

pub fn profile_to_json(profile: &AdvocateProfile) -> serde_json::Value {
    json!({
        "id": profile.id.to_string(),
        "user_id": profile.user_id.to_string(),
        "public_name": profile.public_name,
        "bio": profile.bio,
        "avatar_url": profile.avatar_url,
        "show_organization": profile.show_organization,
        "organization_id": profile.organization_id.map(|id| id.to_string()),
        "status": profile.status,
        "submitted_at": profile.submitted_at.map(|d| d.to_rfc3339()),
        "reviewed_at": profile.reviewed_at.map(|d| d.to_rfc3339()),
        "review_notes": profile.review_notes,
    })
}

pub fn ranked_advocate_to_json(entry: &RankedAdvocate) -> serde_json::Value {
    json!({
        "rank": entry.rank,
        "public_name": entry.profile.public_name,
        "bio": entry.profile.bio,
        "avatar_url": entry.profile.avatar_url,
        "organization_id": entry
            .profile
            .organization_id
            .filter(|_| entry.profile.show_organization)
            .map(|id| id.to_string()),
        "course_count": entry.course_count,
    })
}

pub fn organization_to_json(org: &Organization) -> serde_json::Value {
    json!({
        "id": org.id.to_string(),
        "name": { "en": org.name.en, "my": org.name.my },
        "description": { "en": org.description.en, "my": org.description.my },
        "contact": org.contact,
        "location": org.location,
        "logo_url": org.logo_url,
        "created_at": org.created_at.to_rfc3339(),
        "updated_at": org.updated_at.to_rfc3339(),
    })
}
