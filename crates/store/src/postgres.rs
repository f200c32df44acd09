//! Postgres backend.
//!
//! Plain `sqlx::query` with explicit row mapping; no compile-time query
//! macros, so the crate builds without a live database. Multi-row operations
//! run inside a transaction, and the shadow-edit hide step runs under a
//! savepoint so its failure degrades to the timestamp-only fallback instead
//! of rolling back the draft insert.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Row, Transaction};
use uuid::Uuid;

use coursehub_auth::{Invite, Role, User, UserStatus};
use coursehub_catalog::{
    Bilingual, Course, CourseStatus, GeoPoint, Organization,
};
use coursehub_core::{
    CourseId, DomainError, DomainResult, DraftId, InviteId, OrganizationId, ProfileId, UserId,
};
use coursehub_review::{AdvocateProfile, ContentDraft, DraftStatus, ProfileStatus};

use crate::traits::{
    CourseStore, DraftStore, EditSubmission, HideOutcome, InviteStore, OrganizationStore,
    ProfileStore, ReviewSideEffect, UserStore,
};

/// Postgres-backed implementation of every repository trait.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect and run pending migrations.
    pub async fn connect(database_url: &str) -> DomainResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(internal)?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "migration failed");
                DomainError::internal("migration failed")
            })?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

// ───── error and column mapping ─────

fn internal(err: sqlx::Error) -> DomainError {
    tracing::error!(error = %err, "database error");
    DomainError::internal("database error")
}

/// Unique violations become `Conflict` with the given message; everything
/// else is `Internal`.
fn conflict_or_internal(err: sqlx::Error, conflict_msg: &str) -> DomainError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return DomainError::conflict(conflict_msg);
        }
    }
    internal(err)
}

fn json_column<T: serde::de::DeserializeOwned>(row: &PgRow, column: &str) -> DomainResult<T> {
    let value: serde_json::Value = row.try_get(column).map_err(internal)?;
    serde_json::from_value(value).map_err(|e| {
        tracing::error!(error = %e, column, "malformed json column");
        DomainError::internal("malformed stored data")
    })
}

fn malformed(column: &str, value: &str) -> DomainError {
    tracing::error!(column, value, "unrecognized enum value in row");
    DomainError::internal("malformed stored data")
}

fn user_status_str(status: UserStatus) -> &'static str {
    match status {
        UserStatus::Active => "ACTIVE",
        UserStatus::Inactive => "INACTIVE",
    }
}

fn parse_user_status(s: &str) -> DomainResult<UserStatus> {
    match s {
        "ACTIVE" => Ok(UserStatus::Active),
        "INACTIVE" => Ok(UserStatus::Inactive),
        other => Err(malformed("status", other)),
    }
}

fn course_status_str(status: CourseStatus) -> &'static str {
    match status {
        CourseStatus::Published => "PUBLISHED",
        CourseStatus::UnderReview => "UNDER_REVIEW",
    }
}

fn parse_course_status(s: &str) -> DomainResult<CourseStatus> {
    match s {
        "PUBLISHED" => Ok(CourseStatus::Published),
        "UNDER_REVIEW" => Ok(CourseStatus::UnderReview),
        other => Err(malformed("status", other)),
    }
}

fn draft_status_str(status: DraftStatus) -> &'static str {
    match status {
        DraftStatus::Draft => "DRAFT",
        DraftStatus::Pending => "PENDING",
        DraftStatus::Approved => "APPROVED",
        DraftStatus::Rejected => "REJECTED",
    }
}

fn parse_draft_status(s: &str) -> DomainResult<DraftStatus> {
    match s {
        "DRAFT" => Ok(DraftStatus::Draft),
        "PENDING" => Ok(DraftStatus::Pending),
        "APPROVED" => Ok(DraftStatus::Approved),
        "REJECTED" => Ok(DraftStatus::Rejected),
        other => Err(malformed("status", other)),
    }
}

fn profile_status_str(status: ProfileStatus) -> &'static str {
    match status {
        ProfileStatus::Draft => "DRAFT",
        ProfileStatus::Pending => "PENDING",
        ProfileStatus::Approved => "APPROVED",
        ProfileStatus::Rejected => "REJECTED",
        ProfileStatus::Hidden => "HIDDEN",
    }
}

fn parse_profile_status(s: &str) -> DomainResult<ProfileStatus> {
    match s {
        "DRAFT" => Ok(ProfileStatus::Draft),
        "PENDING" => Ok(ProfileStatus::Pending),
        "APPROVED" => Ok(ProfileStatus::Approved),
        "REJECTED" => Ok(ProfileStatus::Rejected),
        "HIDDEN" => Ok(ProfileStatus::Hidden),
        other => Err(malformed("status", other)),
    }
}

// ───── row mapping ─────

fn user_from_row(row: &PgRow) -> DomainResult<User> {
    let role: String = row.try_get("role").map_err(internal)?;
    let status: String = row.try_get("status").map_err(internal)?;
    Ok(User {
        id: UserId::from_uuid(row.try_get("id").map_err(internal)?),
        email: row.try_get("email").map_err(internal)?,
        display_name: row.try_get("display_name").map_err(internal)?,
        role: Role::parse(&role).ok_or_else(|| malformed("role", &role))?,
        organization_id: row
            .try_get::<Option<Uuid>, _>("organization_id")
            .map_err(internal)?
            .map(OrganizationId::from_uuid),
        status: parse_user_status(&status)?,
        created_at: row.try_get("created_at").map_err(internal)?,
        last_login_at: row.try_get("last_login_at").map_err(internal)?,
    })
}

fn invite_from_row(row: &PgRow) -> DomainResult<Invite> {
    let role: String = row.try_get("role").map_err(internal)?;
    Ok(Invite {
        id: InviteId::from_uuid(row.try_get("id").map_err(internal)?),
        email: row.try_get("email").map_err(internal)?,
        role: Role::parse(&role).ok_or_else(|| malformed("role", &role))?,
        organization_id: row
            .try_get::<Option<Uuid>, _>("organization_id")
            .map_err(internal)?
            .map(OrganizationId::from_uuid),
        created_by: UserId::from_uuid(row.try_get("created_by").map_err(internal)?),
        created_at: row.try_get("created_at").map_err(internal)?,
        accepted_at: row.try_get("accepted_at").map_err(internal)?,
    })
}

fn organization_from_row(row: &PgRow) -> DomainResult<Organization> {
    let latitude: Option<f64> = row.try_get("latitude").map_err(internal)?;
    let longitude: Option<f64> = row.try_get("longitude").map_err(internal)?;
    Ok(Organization {
        id: OrganizationId::from_uuid(row.try_get("id").map_err(internal)?),
        name: Bilingual {
            en: row.try_get("name_en").map_err(internal)?,
            my: row.try_get("name_my").map_err(internal)?,
        },
        description: Bilingual {
            en: row.try_get("description_en").map_err(internal)?,
            my: row.try_get("description_my").map_err(internal)?,
        },
        contact: json_column(row, "contact")?,
        location: latitude
            .zip(longitude)
            .map(|(latitude, longitude)| GeoPoint { latitude, longitude }),
        logo_url: row.try_get("logo_url").map_err(internal)?,
        created_at: row.try_get("created_at").map_err(internal)?,
        updated_at: row.try_get("updated_at").map_err(internal)?,
    })
}

fn course_from_row(row: &PgRow) -> DomainResult<Course> {
    let status: String = row.try_get("status").map_err(internal)?;
    Ok(Course {
        id: CourseId::from_uuid(row.try_get("id").map_err(internal)?),
        slug: row.try_get("slug").map_err(internal)?,
        title: Bilingual {
            en: row.try_get("title_en").map_err(internal)?,
            my: row.try_get("title_my").map_err(internal)?,
        },
        description: Bilingual {
            en: row.try_get("description_en").map_err(internal)?,
            my: row.try_get("description_my").map_err(internal)?,
        },
        district: row.try_get("district").map_err(internal)?,
        province: row.try_get("province").map_err(internal)?,
        start_date: row.try_get("start_date").map_err(internal)?,
        end_date: row.try_get("end_date").map_err(internal)?,
        apply_by_date: row.try_get("apply_by_date").map_err(internal)?,
        fee: row.try_get("fee").map_err(internal)?,
        status: parse_course_status(&status)?,
        organization_id: OrganizationId::from_uuid(
            row.try_get("organization_id").map_err(internal)?,
        ),
        created_by: UserId::from_uuid(row.try_get("created_by").map_err(internal)?),
        last_modified_by: UserId::from_uuid(row.try_get("last_modified_by").map_err(internal)?),
        created_at: row.try_get("created_at").map_err(internal)?,
        updated_at: row.try_get("updated_at").map_err(internal)?,
        images: json_column(row, "images")?,
        badges: json_column(row, "badges")?,
        faq: json_column(row, "faq")?,
    })
}

fn draft_from_row(row: &PgRow) -> DomainResult<ContentDraft> {
    let status: String = row.try_get("status").map_err(internal)?;
    Ok(ContentDraft {
        id: DraftId::from_uuid(row.try_get("id").map_err(internal)?),
        title: row.try_get("title").map_err(internal)?,
        content: json_column(row, "content")?,
        status: parse_draft_status(&status)?,
        created_by: UserId::from_uuid(row.try_get("created_by").map_err(internal)?),
        organization_id: row
            .try_get::<Option<Uuid>, _>("organization_id")
            .map_err(internal)?
            .map(OrganizationId::from_uuid),
        original_course_id: row
            .try_get::<Option<Uuid>, _>("original_course_id")
            .map_err(internal)?
            .map(CourseId::from_uuid),
        created_at: row.try_get("created_at").map_err(internal)?,
        updated_at: row.try_get("updated_at").map_err(internal)?,
        submitted_at: row.try_get("submitted_at").map_err(internal)?,
        reviewed_at: row.try_get("reviewed_at").map_err(internal)?,
        reviewed_by: row
            .try_get::<Option<Uuid>, _>("reviewed_by")
            .map_err(internal)?
            .map(UserId::from_uuid),
        review_notes: row.try_get("review_notes").map_err(internal)?,
    })
}

fn profile_from_row(row: &PgRow) -> DomainResult<AdvocateProfile> {
    let status: String = row.try_get("status").map_err(internal)?;
    Ok(AdvocateProfile {
        id: ProfileId::from_uuid(row.try_get("id").map_err(internal)?),
        user_id: UserId::from_uuid(row.try_get("user_id").map_err(internal)?),
        organization_id: row
            .try_get::<Option<Uuid>, _>("organization_id")
            .map_err(internal)?
            .map(OrganizationId::from_uuid),
        public_name: row.try_get("public_name").map_err(internal)?,
        bio: row.try_get("bio").map_err(internal)?,
        avatar_url: row.try_get("avatar_url").map_err(internal)?,
        show_organization: row.try_get("show_organization").map_err(internal)?,
        status: parse_profile_status(&status)?,
        created_at: row.try_get("created_at").map_err(internal)?,
        updated_at: row.try_get("updated_at").map_err(internal)?,
        submitted_at: row.try_get("submitted_at").map_err(internal)?,
        reviewed_at: row.try_get("reviewed_at").map_err(internal)?,
        reviewed_by: row
            .try_get::<Option<Uuid>, _>("reviewed_by")
            .map_err(internal)?
            .map(UserId::from_uuid),
        review_notes: row.try_get("review_notes").map_err(internal)?,
    })
}

fn to_json<T: serde::Serialize>(value: &T) -> DomainResult<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| {
        tracing::error!(error = %e, "json encode failed");
        DomainError::internal("json encode failed")
    })
}

const SELECT_USER: &str = "SELECT id, email, display_name, role, organization_id, status, \
     created_at, last_login_at FROM users";
const SELECT_INVITE: &str =
    "SELECT id, email, role, organization_id, created_by, created_at, accepted_at FROM invites";
const SELECT_ORGANIZATION: &str = "SELECT id, name_en, name_my, description_en, description_my, \
     contact, latitude, longitude, logo_url, created_at, updated_at FROM organizations";
const SELECT_COURSE: &str = "SELECT id, slug, title_en, title_my, description_en, description_my, \
     district, province, start_date, end_date, apply_by_date, fee, status, organization_id, \
     created_by, last_modified_by, created_at, updated_at, images, badges, faq FROM courses";
const SELECT_DRAFT: &str = "SELECT id, title, content, status, created_by, organization_id, \
     original_course_id, created_at, updated_at, submitted_at, reviewed_at, reviewed_by, \
     review_notes FROM drafts";
const SELECT_PROFILE: &str = "SELECT id, user_id, organization_id, public_name, bio, avatar_url, \
     show_organization, status, created_at, updated_at, submitted_at, reviewed_at, reviewed_by, \
     review_notes FROM advocate_profiles";

// ───── write helpers shared by pool and transaction paths ─────

async fn insert_draft_tx(
    tx: &mut Transaction<'_, sqlx::Postgres>,
    draft: &ContentDraft,
) -> DomainResult<()> {
    sqlx::query(
        "INSERT INTO drafts (id, title, content, status, created_by, organization_id, \
         original_course_id, created_at, updated_at, submitted_at, reviewed_at, reviewed_by, \
         review_notes) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
    )
    .bind(draft.id.as_uuid())
    .bind(&draft.title)
    .bind(to_json(&draft.content)?)
    .bind(draft_status_str(draft.status))
    .bind(draft.created_by.as_uuid())
    .bind(draft.organization_id.map(Uuid::from))
    .bind(draft.original_course_id.map(Uuid::from))
    .bind(draft.created_at)
    .bind(draft.updated_at)
    .bind(draft.submitted_at)
    .bind(draft.reviewed_at)
    .bind(draft.reviewed_by.map(Uuid::from))
    .bind(&draft.review_notes)
    .execute(&mut **tx)
    .await
    .map_err(internal)?;
    Ok(())
}

async fn update_draft_tx(
    tx: &mut Transaction<'_, sqlx::Postgres>,
    draft: &ContentDraft,
) -> DomainResult<()> {
    let result = sqlx::query(
        "UPDATE drafts SET title = $2, content = $3, status = $4, updated_at = $5, \
         submitted_at = $6, reviewed_at = $7, reviewed_by = $8, review_notes = $9 WHERE id = $1",
    )
    .bind(draft.id.as_uuid())
    .bind(&draft.title)
    .bind(to_json(&draft.content)?)
    .bind(draft_status_str(draft.status))
    .bind(draft.updated_at)
    .bind(draft.submitted_at)
    .bind(draft.reviewed_at)
    .bind(draft.reviewed_by.map(Uuid::from))
    .bind(&draft.review_notes)
    .execute(&mut **tx)
    .await
    .map_err(internal)?;
    if result.rows_affected() == 0 {
        return Err(DomainError::NotFound);
    }
    Ok(())
}

async fn update_course_tx(
    tx: &mut Transaction<'_, sqlx::Postgres>,
    course: &Course,
) -> DomainResult<()> {
    let result = sqlx::query(
        "UPDATE courses SET title_en = $2, title_my = $3, description_en = $4, \
         description_my = $5, district = $6, province = $7, start_date = $8, end_date = $9, \
         apply_by_date = $10, fee = $11, status = $12, last_modified_by = $13, updated_at = $14, \
         images = $15, badges = $16, faq = $17 WHERE id = $1",
    )
    .bind(course.id.as_uuid())
    .bind(&course.title.en)
    .bind(&course.title.my)
    .bind(&course.description.en)
    .bind(&course.description.my)
    .bind(&course.district)
    .bind(&course.province)
    .bind(course.start_date)
    .bind(course.end_date)
    .bind(course.apply_by_date)
    .bind(course.fee)
    .bind(course_status_str(course.status))
    .bind(course.last_modified_by.as_uuid())
    .bind(course.updated_at)
    .bind(to_json(&course.images)?)
    .bind(to_json(&course.badges)?)
    .bind(to_json(&course.faq)?)
    .execute(&mut **tx)
    .await
    .map_err(internal)?;
    if result.rows_affected() == 0 {
        return Err(DomainError::NotFound);
    }
    Ok(())
}

async fn insert_course_tx(
    tx: &mut Transaction<'_, sqlx::Postgres>,
    course: &Course,
) -> DomainResult<()> {
    sqlx::query(
        "INSERT INTO courses (id, slug, title_en, title_my, description_en, description_my, \
         district, province, start_date, end_date, apply_by_date, fee, status, organization_id, \
         created_by, last_modified_by, created_at, updated_at, images, badges, faq) VALUES \
         ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, \
         $20, $21)",
    )
    .bind(course.id.as_uuid())
    .bind(&course.slug)
    .bind(&course.title.en)
    .bind(&course.title.my)
    .bind(&course.description.en)
    .bind(&course.description.my)
    .bind(&course.district)
    .bind(&course.province)
    .bind(course.start_date)
    .bind(course.end_date)
    .bind(course.apply_by_date)
    .bind(course.fee)
    .bind(course_status_str(course.status))
    .bind(course.organization_id.as_uuid())
    .bind(course.created_by.as_uuid())
    .bind(course.last_modified_by.as_uuid())
    .bind(course.created_at)
    .bind(course.updated_at)
    .bind(to_json(&course.images)?)
    .bind(to_json(&course.badges)?)
    .bind(to_json(&course.faq)?)
    .execute(&mut **tx)
    .await
    .map_err(|e| conflict_or_internal(e, "course slug already exists"))?;
    Ok(())
}

async fn upsert_organization_tx(
    tx: &mut Transaction<'_, sqlx::Postgres>,
    org: &Organization,
) -> DomainResult<()> {
    sqlx::query(
        "INSERT INTO organizations (id, name_en, name_my, description_en, description_my, \
         contact, latitude, longitude, logo_url, created_at, updated_at) VALUES \
         ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
         ON CONFLICT (id) DO UPDATE SET \
         name_en = EXCLUDED.name_en, name_my = EXCLUDED.name_my, \
         description_en = EXCLUDED.description_en, description_my = EXCLUDED.description_my, \
         contact = EXCLUDED.contact, latitude = EXCLUDED.latitude, \
         longitude = EXCLUDED.longitude, logo_url = EXCLUDED.logo_url, \
         updated_at = EXCLUDED.updated_at",
    )
    .bind(org.id.as_uuid())
    .bind(&org.name.en)
    .bind(&org.name.my)
    .bind(&org.description.en)
    .bind(&org.description.my)
    .bind(to_json(&org.contact)?)
    .bind(org.location.map(|p| p.latitude))
    .bind(org.location.map(|p| p.longitude))
    .bind(&org.logo_url)
    .bind(org.created_at)
    .bind(org.updated_at)
    .execute(&mut **tx)
    .await
    .map_err(internal)?;
    Ok(())
}

#[async_trait]
impl UserStore for PostgresStore {
    async fn insert_user(&self, user: User) -> DomainResult<()> {
        sqlx::query(
            "INSERT INTO users (id, email, display_name, role, organization_id, status, \
             created_at, last_login_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(user.id.as_uuid())
        .bind(&user.email)
        .bind(&user.display_name)
        .bind(user.role.as_str())
        .bind(user.organization_id.map(Uuid::from))
        .bind(user_status_str(user.status))
        .bind(user.created_at)
        .bind(user.last_login_at)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_or_internal(e, "email already registered"))?;
        Ok(())
    }

    async fn get_user(&self, id: UserId) -> DomainResult<Option<User>> {
        let row = sqlx::query(&format!("{SELECT_USER} WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(internal)?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn get_user_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        let row = sqlx::query(&format!("{SELECT_USER} WHERE email = $1"))
            .bind(email.to_lowercase())
            .fetch_optional(&self.pool)
            .await
            .map_err(internal)?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn update_user(&self, user: &User) -> DomainResult<()> {
        let result = sqlx::query(
            "UPDATE users SET display_name = $2, role = $3, organization_id = $4, status = $5, \
             last_login_at = $6 WHERE id = $1",
        )
        .bind(user.id.as_uuid())
        .bind(&user.display_name)
        .bind(user.role.as_str())
        .bind(user.organization_id.map(Uuid::from))
        .bind(user_status_str(user.status))
        .bind(user.last_login_at)
        .execute(&self.pool)
        .await
        .map_err(internal)?;
        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound);
        }
        Ok(())
    }

    async fn list_users(&self) -> DomainResult<Vec<User>> {
        let rows = sqlx::query(&format!("{SELECT_USER} ORDER BY created_at, id"))
            .fetch_all(&self.pool)
            .await
            .map_err(internal)?;
        rows.iter().map(user_from_row).collect()
    }

    async fn list_users_by_organization(&self, org: OrganizationId) -> DomainResult<Vec<User>> {
        let rows = sqlx::query(&format!(
            "{SELECT_USER} WHERE organization_id = $1 ORDER BY created_at, id"
        ))
        .bind(org.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(internal)?;
        rows.iter().map(user_from_row).collect()
    }

    async fn count_active_platform_admins(&self) -> DomainResult<u64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS n FROM users WHERE role = 'PLATFORM_ADMIN' AND status = 'ACTIVE'",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(internal)?;
        let n: i64 = row.try_get("n").map_err(internal)?;
        Ok(n as u64)
    }

    async fn create_user_from_invite(
        &self,
        user: User,
        invite_id: InviteId,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        let mut tx = self.pool.begin().await.map_err(internal)?;

        let invite = sqlx::query("SELECT accepted_at FROM invites WHERE id = $1 FOR UPDATE")
            .bind(invite_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(internal)?
            .ok_or(DomainError::NotFound)?;
        let accepted_at: Option<DateTime<Utc>> =
            invite.try_get("accepted_at").map_err(internal)?;
        if accepted_at.is_some() {
            return Err(DomainError::conflict("invitation already accepted"));
        }

        sqlx::query("UPDATE invites SET accepted_at = $2 WHERE id = $1")
            .bind(invite_id.as_uuid())
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(internal)?;

        sqlx::query(
            "INSERT INTO users (id, email, display_name, role, organization_id, status, \
             created_at, last_login_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(user.id.as_uuid())
        .bind(&user.email)
        .bind(&user.display_name)
        .bind(user.role.as_str())
        .bind(user.organization_id.map(Uuid::from))
        .bind(user_status_str(user.status))
        .bind(user.created_at)
        .bind(user.last_login_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| conflict_or_internal(e, "email already registered"))?;

        tx.commit().await.map_err(internal)
    }

    async fn touch_last_login(&self, id: UserId, at: DateTime<Utc>) -> DomainResult<()> {
        let result = sqlx::query(
            "UPDATE users SET last_login_at = GREATEST(COALESCE(last_login_at, $2), $2) \
             WHERE id = $1",
        )
        .bind(id.as_uuid())
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(internal)?;
        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl InviteStore for PostgresStore {
    async fn insert_invite(&self, invite: Invite) -> DomainResult<()> {
        // A partial unique index on open invites backs the conflict check.
        sqlx::query(
            "INSERT INTO invites (id, email, role, organization_id, created_by, created_at, \
             accepted_at) VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(invite.id.as_uuid())
        .bind(&invite.email)
        .bind(invite.role.as_str())
        .bind(invite.organization_id.map(Uuid::from))
        .bind(invite.created_by.as_uuid())
        .bind(invite.created_at)
        .bind(invite.accepted_at)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_or_internal(e, "open invitation already exists"))?;
        Ok(())
    }

    async fn find_open_invite(&self, email: &str) -> DomainResult<Option<Invite>> {
        let row = sqlx::query(&format!(
            "{SELECT_INVITE} WHERE email = $1 AND accepted_at IS NULL"
        ))
        .bind(email.to_lowercase())
        .fetch_optional(&self.pool)
        .await
        .map_err(internal)?;
        row.as_ref().map(invite_from_row).transpose()
    }

    async fn list_invites(&self) -> DomainResult<Vec<Invite>> {
        let rows = sqlx::query(&format!("{SELECT_INVITE} ORDER BY created_at, id"))
            .fetch_all(&self.pool)
            .await
            .map_err(internal)?;
        rows.iter().map(invite_from_row).collect()
    }
}

#[async_trait]
impl OrganizationStore for PostgresStore {
    async fn upsert_organization(&self, org: Organization) -> DomainResult<()> {
        let mut tx = self.pool.begin().await.map_err(internal)?;
        upsert_organization_tx(&mut tx, &org).await?;
        tx.commit().await.map_err(internal)
    }

    async fn get_organization(&self, id: OrganizationId) -> DomainResult<Option<Organization>> {
        let row = sqlx::query(&format!("{SELECT_ORGANIZATION} WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(internal)?;
        row.as_ref().map(organization_from_row).transpose()
    }

    async fn list_organizations(&self) -> DomainResult<Vec<Organization>> {
        let rows = sqlx::query(&format!("{SELECT_ORGANIZATION} ORDER BY created_at, id"))
            .fetch_all(&self.pool)
            .await
            .map_err(internal)?;
        rows.iter().map(organization_from_row).collect()
    }

    async fn delete_organization(&self, id: OrganizationId) -> DomainResult<()> {
        let mut tx = self.pool.begin().await.map_err(internal)?;

        let exists = sqlx::query("SELECT 1 FROM organizations WHERE id = $1 FOR UPDATE")
            .bind(id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(internal)?;
        if exists.is_none() {
            return Err(DomainError::NotFound);
        }

        let courses = sqlx::query("SELECT 1 FROM courses WHERE organization_id = $1 LIMIT 1")
            .bind(id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(internal)?;
        if courses.is_some() {
            return Err(DomainError::conflict("organization still owns courses"));
        }

        let users = sqlx::query("SELECT 1 FROM users WHERE organization_id = $1 LIMIT 1")
            .bind(id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(internal)?;
        if users.is_some() {
            return Err(DomainError::conflict("organization still owns users"));
        }

        sqlx::query("DELETE FROM organizations WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(internal)?;

        tx.commit().await.map_err(internal)
    }
}

#[async_trait]
impl CourseStore for PostgresStore {
    async fn insert_course(&self, course: Course) -> DomainResult<()> {
        let mut tx = self.pool.begin().await.map_err(internal)?;
        insert_course_tx(&mut tx, &course).await?;
        tx.commit().await.map_err(internal)
    }

    async fn get_course(&self, id: CourseId) -> DomainResult<Option<Course>> {
        let row = sqlx::query(&format!("{SELECT_COURSE} WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(internal)?;
        row.as_ref().map(course_from_row).transpose()
    }

    async fn get_course_by_slug(&self, slug: &str) -> DomainResult<Option<Course>> {
        let row = sqlx::query(&format!("{SELECT_COURSE} WHERE slug = $1"))
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(internal)?;
        row.as_ref().map(course_from_row).transpose()
    }

    async fn update_course(&self, course: &Course) -> DomainResult<()> {
        let mut tx = self.pool.begin().await.map_err(internal)?;
        update_course_tx(&mut tx, course).await?;
        tx.commit().await.map_err(internal)
    }

    async fn list_published_courses(&self) -> DomainResult<Vec<Course>> {
        let rows = sqlx::query(&format!(
            "{SELECT_COURSE} WHERE status = 'PUBLISHED' ORDER BY created_at, id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(internal)?;
        rows.iter().map(course_from_row).collect()
    }

    async fn list_courses_by_organization(
        &self,
        org: OrganizationId,
    ) -> DomainResult<Vec<Course>> {
        let rows = sqlx::query(&format!(
            "{SELECT_COURSE} WHERE organization_id = $1 ORDER BY created_at, id"
        ))
        .bind(org.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(internal)?;
        rows.iter().map(course_from_row).collect()
    }

    async fn count_courses_by_creator(&self, user: UserId) -> DomainResult<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM courses WHERE created_by = $1")
            .bind(user.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(internal)?;
        let n: i64 = row.try_get("n").map_err(internal)?;
        Ok(n as u64)
    }
}

#[async_trait]
impl DraftStore for PostgresStore {
    async fn insert_draft(&self, draft: ContentDraft) -> DomainResult<()> {
        let mut tx = self.pool.begin().await.map_err(internal)?;
        insert_draft_tx(&mut tx, &draft).await?;
        tx.commit().await.map_err(internal)
    }

    async fn get_draft(&self, id: DraftId) -> DomainResult<Option<ContentDraft>> {
        let row = sqlx::query(&format!("{SELECT_DRAFT} WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(internal)?;
        row.as_ref().map(draft_from_row).transpose()
    }

    async fn update_draft(&self, draft: &ContentDraft) -> DomainResult<()> {
        let mut tx = self.pool.begin().await.map_err(internal)?;
        update_draft_tx(&mut tx, draft).await?;
        tx.commit().await.map_err(internal)
    }

    async fn delete_draft(&self, id: DraftId) -> DomainResult<()> {
        let result = sqlx::query("DELETE FROM drafts WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(internal)?;
        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound);
        }
        Ok(())
    }

    async fn list_drafts_by_creator(&self, user: UserId) -> DomainResult<Vec<ContentDraft>> {
        let rows = sqlx::query(&format!(
            "{SELECT_DRAFT} WHERE created_by = $1 ORDER BY created_at, id"
        ))
        .bind(user.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(internal)?;
        rows.iter().map(draft_from_row).collect()
    }

    async fn list_drafts_by_organization(
        &self,
        org: OrganizationId,
    ) -> DomainResult<Vec<ContentDraft>> {
        let rows = sqlx::query(&format!(
            "{SELECT_DRAFT} WHERE organization_id = $1 ORDER BY created_at, id"
        ))
        .bind(org.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(internal)?;
        rows.iter().map(draft_from_row).collect()
    }

    async fn list_pending_drafts(&self) -> DomainResult<Vec<ContentDraft>> {
        let rows = sqlx::query(&format!(
            "{SELECT_DRAFT} WHERE status = 'PENDING' ORDER BY submitted_at, id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(internal)?;
        rows.iter().map(draft_from_row).collect()
    }

    async fn find_active_edit(&self, course: CourseId) -> DomainResult<Option<ContentDraft>> {
        let row = sqlx::query(&format!(
            "{SELECT_DRAFT} WHERE original_course_id = $1 AND status IN ('DRAFT', 'PENDING')"
        ))
        .bind(course.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(internal)?;
        row.as_ref().map(draft_from_row).transpose()
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

        let mut tx = self.pool.begin().await.map_err(internal)?;

        // Lock the course row so concurrent submissions serialize here.
        let course = sqlx::query("SELECT 1 FROM courses WHERE id = $1 FOR UPDATE")
            .bind(course_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(internal)?;
        if course.is_none() {
            return Err(DomainError::NotFound);
        }

        let active = sqlx::query(
            "SELECT 1 FROM drafts WHERE original_course_id = $1 \
             AND status IN ('DRAFT', 'PENDING') LIMIT 1",
        )
        .bind(course_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(internal)?;
        if active.is_some() {
            return Err(DomainError::conflict(
                "an edit for this course is already in flight",
            ));
        }

        insert_draft_tx(&mut tx, &draft).await?;

        // Hide the course under a savepoint: the draft insert must survive a
        // failed hide.
        sqlx::query("SAVEPOINT hide_course")
            .execute(&mut *tx)
            .await
            .map_err(internal)?;
        let hidden = sqlx::query(
            "UPDATE courses SET status = 'UNDER_REVIEW', last_modified_by = $2, updated_at = $3 \
             WHERE id = $1",
        )
        .bind(course_id.as_uuid())
        .bind(editor.as_uuid())
        .bind(now)
        .execute(&mut *tx)
        .await;

        let hide = match hidden {
            Ok(_) => {
                sqlx::query("RELEASE SAVEPOINT hide_course")
                    .execute(&mut *tx)
                    .await
                    .map_err(internal)?;
                HideOutcome::Hidden
            }
            Err(e) => {
                tracing::warn!(error = %e, course_id = %course_id, "course hide failed");
                sqlx::query("ROLLBACK TO SAVEPOINT hide_course")
                    .execute(&mut *tx)
                    .await
                    .map_err(internal)?;
                sqlx::query(
                    "UPDATE courses SET last_modified_by = $2, updated_at = $3 WHERE id = $1",
                )
                .bind(course_id.as_uuid())
                .bind(editor.as_uuid())
                .bind(now)
                .execute(&mut *tx)
                .await
                .map_err(internal)?;
                HideOutcome::TimestampOnly
            }
        };

        tx.commit().await.map_err(internal)?;
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

        let mut tx = self.pool.begin().await.map_err(internal)?;

        let course = sqlx::query("SELECT 1 FROM courses WHERE id = $1 FOR UPDATE")
            .bind(course_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(internal)?;
        if course.is_none() {
            return Err(DomainError::NotFound);
        }

        let other_active = sqlx::query(
            "SELECT 1 FROM drafts WHERE original_course_id = $1 \
             AND status IN ('DRAFT', 'PENDING') AND id <> $2 LIMIT 1",
        )
        .bind(course_id.as_uuid())
        .bind(draft.id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(internal)?;
        if other_active.is_some() {
            return Err(DomainError::conflict(
                "an edit for this course is already in flight",
            ));
        }

        update_draft_tx(&mut tx, draft).await?;

        sqlx::query("SAVEPOINT hide_course")
            .execute(&mut *tx)
            .await
            .map_err(internal)?;
        let hidden = sqlx::query(
            "UPDATE courses SET status = 'UNDER_REVIEW', last_modified_by = $2, updated_at = $3 \
             WHERE id = $1",
        )
        .bind(course_id.as_uuid())
        .bind(editor.as_uuid())
        .bind(now)
        .execute(&mut *tx)
        .await;

        let hide = match hidden {
            Ok(_) => {
                sqlx::query("RELEASE SAVEPOINT hide_course")
                    .execute(&mut *tx)
                    .await
                    .map_err(internal)?;
                HideOutcome::Hidden
            }
            Err(e) => {
                tracing::warn!(error = %e, course_id = %course_id, "course hide failed");
                sqlx::query("ROLLBACK TO SAVEPOINT hide_course")
                    .execute(&mut *tx)
                    .await
                    .map_err(internal)?;
                sqlx::query(
                    "UPDATE courses SET last_modified_by = $2, updated_at = $3 WHERE id = $1",
                )
                .bind(course_id.as_uuid())
                .bind(editor.as_uuid())
                .bind(now)
                .execute(&mut *tx)
                .await
                .map_err(internal)?;
                HideOutcome::TimestampOnly
            }
        };

        tx.commit().await.map_err(internal)?;
        Ok(hide)
    }

    async fn finalize_review(
        &self,
        draft: &ContentDraft,
        side_effect: ReviewSideEffect,
    ) -> DomainResult<()> {
        let mut tx = self.pool.begin().await.map_err(internal)?;

        update_draft_tx(&mut tx, draft).await?;
        match side_effect {
            ReviewSideEffect::None => {}
            ReviewSideEffect::CreateCourse(course) => insert_course_tx(&mut tx, &course).await?,
            ReviewSideEffect::UpdateCourse(course) => update_course_tx(&mut tx, &course).await?,
            ReviewSideEffect::UpsertOrganization(org) => {
                upsert_organization_tx(&mut tx, &org).await?
            }
        }

        tx.commit().await.map_err(internal)
    }
}

#[async_trait]
impl ProfileStore for PostgresStore {
    async fn insert_profile(&self, profile: AdvocateProfile) -> DomainResult<()> {
        sqlx::query(
            "INSERT INTO advocate_profiles (id, user_id, organization_id, public_name, bio, \
             avatar_url, show_organization, status, created_at, updated_at, submitted_at, \
             reviewed_at, reviewed_by, review_notes) VALUES \
             ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
        )
        .bind(profile.id.as_uuid())
        .bind(profile.user_id.as_uuid())
        .bind(profile.organization_id.map(Uuid::from))
        .bind(&profile.public_name)
        .bind(&profile.bio)
        .bind(&profile.avatar_url)
        .bind(profile.show_organization)
        .bind(profile_status_str(profile.status))
        .bind(profile.created_at)
        .bind(profile.updated_at)
        .bind(profile.submitted_at)
        .bind(profile.reviewed_at)
        .bind(profile.reviewed_by.map(Uuid::from))
        .bind(&profile.review_notes)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_or_internal(e, "user already has a profile"))?;
        Ok(())
    }

    async fn get_profile(&self, id: ProfileId) -> DomainResult<Option<AdvocateProfile>> {
        let row = sqlx::query(&format!("{SELECT_PROFILE} WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(internal)?;
        row.as_ref().map(profile_from_row).transpose()
    }

    async fn get_profile_by_user(&self, user: UserId) -> DomainResult<Option<AdvocateProfile>> {
        let row = sqlx::query(&format!("{SELECT_PROFILE} WHERE user_id = $1"))
            .bind(user.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(internal)?;
        row.as_ref().map(profile_from_row).transpose()
    }

    async fn update_profile(&self, profile: &AdvocateProfile) -> DomainResult<()> {
        let result = sqlx::query(
            "UPDATE advocate_profiles SET public_name = $2, bio = $3, avatar_url = $4, \
             show_organization = $5, status = $6, updated_at = $7, submitted_at = $8, \
             reviewed_at = $9, reviewed_by = $10, review_notes = $11 WHERE id = $1",
        )
        .bind(profile.id.as_uuid())
        .bind(&profile.public_name)
        .bind(&profile.bio)
        .bind(&profile.avatar_url)
        .bind(profile.show_organization)
        .bind(profile_status_str(profile.status))
        .bind(profile.updated_at)
        .bind(profile.submitted_at)
        .bind(profile.reviewed_at)
        .bind(profile.reviewed_by.map(Uuid::from))
        .bind(&profile.review_notes)
        .execute(&self.pool)
        .await
        .map_err(internal)?;
        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound);
        }
        Ok(())
    }

    async fn list_approved_profiles(&self) -> DomainResult<Vec<AdvocateProfile>> {
        let rows = sqlx::query(&format!("{SELECT_PROFILE} WHERE status = 'APPROVED'"))
            .fetch_all(&self.pool)
            .await
            .map_err(internal)?;
        rows.iter().map(profile_from_row).collect()
    }

    async fn list_pending_profiles(&self) -> DomainResult<Vec<AdvocateProfile>> {
        let rows = sqlx::query(&format!(
            "{SELECT_PROFILE} WHERE status = 'PENDING' ORDER BY submitted_at, id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(internal)?;
        rows.iter().map(profile_from_row).collect()
    }
}
