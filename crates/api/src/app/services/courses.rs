//! Public course reads: the projected listing and the detail view.

use std::collections::HashMap;

use chrono::Utc;

use coursehub_catalog::{list_public, Course, CoursePage, CourseQuery, CourseRow};
use coursehub_core::{DomainError, DomainResult, OrganizationId};

use super::Stores;

pub struct CourseService {
    stores: Stores,
}

impl CourseService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    /// The public listing. Row fetching is the store's job; filtering,
    /// sorting, and pagination are the pure projector's.
    pub async fn list_public(&self, query: CourseQuery) -> DomainResult<CoursePage> {
        let courses = self.stores.courses.list_published_courses().await?;
        let names = self.organization_names().await?;

        let rows: Vec<CourseRow> = courses
            .into_iter()
            .map(|course| CourseRow {
                organization_name: names
                    .get(&course.organization_id)
                    .cloned()
                    .unwrap_or_default(),
                course,
            })
            .collect();

        Ok(list_public(&rows, &query, Utc::now()))
    }

    /// Detail read by slug. Courses hidden by an in-flight shadow edit do not
    /// resolve.
    pub async fn get_published_by_slug(&self, slug: &str) -> DomainResult<(Course, String)> {
        let course = self
            .stores
            .courses
            .get_course_by_slug(slug)
            .await?
            .filter(Course::is_public)
            .ok_or(DomainError::NotFound)?;

        let name = self
            .stores
            .organizations
            .get_organization(course.organization_id)
            .await?
            .map(|o| o.name.en)
            .unwrap_or_default();

        Ok((course, name))
    }

    async fn organization_names(&self) -> DomainResult<HashMap<OrganizationId, String>> {
        Ok(self
            .stores
            .organizations
            .list_organizations()
            .await?
            .into_iter()
            .map(|o| (o.id, o.name.en))
            .collect())
    }
}
