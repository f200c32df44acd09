//! `coursehub-catalog` — published courses, organizations, and the public
//! course projection.
//!
//! Everything here is pure domain state; persistence lives in
//! `coursehub-store` and orchestration in the API service layer.

pub mod course;
pub mod organization;
pub mod projector;
pub mod slug;

pub use course::{Badge, Bilingual, Course, CourseImage, CourseStatus, FaqEntry};
pub use organization::{ContactInfo, GeoPoint, Organization};
pub use projector::{
    list_public, CourseCard, CoursePage, CourseQuery, CourseRow, Pagination, SortKey,
};
