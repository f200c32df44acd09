//! Course publication projector.
//!
//! Assembles the public, paginated, filterable view of published courses from
//! relational rows. Pure functions over in-memory rows: the caller fetches
//! candidate rows from the store and the projection depends only on them and
//! the current time, which makes the result safely cacheable for a bounded
//! interval.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use coursehub_core::CourseId;

use crate::course::Course;

/// A course joined with its organization's display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseRow {
    pub course: Course,
    pub organization_name: String,
}

/// Sort order for public listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    StartDateAsc,
    StartDateDesc,
    ApplyByAsc,
    ApplyByDesc,
    /// Storage insertion order (creation time, id as tie-break).
    Insertion,
}

impl SortKey {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "start_date_asc" => Some(SortKey::StartDateAsc),
            "start_date_desc" => Some(SortKey::StartDateDesc),
            "apply_by_asc" => Some(SortKey::ApplyByAsc),
            "apply_by_desc" => Some(SortKey::ApplyByDesc),
            "insertion" => Some(SortKey::Insertion),
            _ => None,
        }
    }
}

/// Query parameters for the public course listing.
#[derive(Debug, Clone, Default)]
pub struct CourseQuery {
    /// Case-insensitive text search, OR-combined across titles (both
    /// languages), district, province, organization name, and badge text.
    pub search: Option<String>,
    /// AND-combined: a course must carry every requested badge.
    pub badges: Vec<String>,
    pub sort: SortKey,
    /// 1-based page number; 0 is treated as 1.
    pub page: usize,
    pub page_size: usize,
}

const DEFAULT_PAGE_SIZE: usize = 12;
const MAX_PAGE_SIZE: usize = 100;

impl CourseQuery {
    fn page(&self) -> usize {
        self.page.max(1)
    }

    fn page_size(&self) -> usize {
        match self.page_size {
            0 => DEFAULT_PAGE_SIZE,
            n => n.min(MAX_PAGE_SIZE),
        }
    }
}

/// Public card for one course. All dates are ISO-8601 strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseCard {
    pub id: CourseId,
    pub slug: String,
    pub title_en: String,
    pub title_my: String,
    pub organization_name: String,
    /// District and province flattened into a single display string.
    pub location: String,
    pub start_date: String,
    pub end_date: Option<String>,
    pub apply_by_date: Option<String>,
    pub fee: i64,
    pub badges: Vec<String>,
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
    pub has_more: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoursePage {
    pub courses: Vec<CourseCard>,
    pub pagination: Pagination,
}

/// Project published rows into the public listing.
///
/// Courses that have already started (`start_date < now`) or are hidden by an
/// in-flight shadow edit never appear, regardless of what the caller fetched.
pub fn list_public(rows: &[CourseRow], query: &CourseQuery, now: DateTime<Utc>) -> CoursePage {
    let mut matching: Vec<&CourseRow> = rows
        .iter()
        .filter(|row| row.course.is_public() && row.course.start_date >= now)
        .filter(|row| matches_search(row, query.search.as_deref()))
        .filter(|row| query.badges.iter().all(|b| row.course.has_badge(b)))
        .collect();

    sort_rows(&mut matching, query.sort);

    let total = matching.len();
    let page = query.page();
    let page_size = query.page_size();
    let offset = (page - 1) * page_size;

    let courses: Vec<CourseCard> = matching
        .into_iter()
        .skip(offset)
        .take(page_size)
        .map(to_card)
        .collect();

    let has_more = offset + courses.len() < total;

    CoursePage {
        courses,
        pagination: Pagination {
            page,
            page_size,
            total,
            has_more,
        },
    }
}

fn matches_search(row: &CourseRow, search: Option<&str>) -> bool {
    let Some(raw) = search else { return true };
    let needle = raw.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }

    let course = &row.course;
    let haystacks = [
        &course.title.en,
        &course.title.my,
        &course.district,
        &course.province,
        &row.organization_name,
    ];
    if haystacks.iter().any(|h| h.to_lowercase().contains(&needle)) {
        return true;
    }
    course
        .badges
        .iter()
        .any(|b| b.text.to_lowercase().contains(&needle))
}

fn sort_rows(rows: &mut [&CourseRow], sort: SortKey) {
    match sort {
        SortKey::StartDateAsc => {
            rows.sort_by_key(|r| (r.course.start_date, r.course.id));
        }
        SortKey::StartDateDesc => {
            rows.sort_by_key(|r| (core::cmp::Reverse(r.course.start_date), r.course.id));
        }
        // Courses without an apply-by date always sort last.
        SortKey::ApplyByAsc => {
            rows.sort_by_key(|r| (r.course.apply_by_date.is_none(), r.course.apply_by_date, r.course.id));
        }
        SortKey::ApplyByDesc => {
            rows.sort_by_key(|r| {
                (
                    r.course.apply_by_date.is_none(),
                    core::cmp::Reverse(r.course.apply_by_date),
                    r.course.id,
                )
            });
        }
        SortKey::Insertion => {
            rows.sort_by_key(|r| (r.course.created_at, r.course.id));
        }
    }
}

fn to_card(row: &CourseRow) -> CourseCard {
    let course = &row.course;
    CourseCard {
        id: course.id,
        slug: course.slug.clone(),
        title_en: course.title.en.clone(),
        title_my: course.title.my.clone(),
        organization_name: row.organization_name.clone(),
        location: display_location(&course.district, &course.province),
        start_date: course.start_date.to_rfc3339(),
        end_date: course.end_date.map(|d| d.to_rfc3339()),
        apply_by_date: course.apply_by_date.map(|d| d.to_rfc3339()),
        fee: course.fee,
        badges: course.badges.iter().map(|b| b.text.clone()).collect(),
        images: course.images.iter().map(|i| i.url.clone()).collect(),
    }
}

fn display_location(district: &str, province: &str) -> String {
    match (district.is_empty(), province.is_empty()) {
        (false, false) => format!("{district}, {province}"),
        (false, true) => district.to_string(),
        (true, false) => province.to_string(),
        (true, true) => String::new(),
    }
}
