use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use chrono::Utc;

use coursehub_core::CourseId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::ActorContext;

/// Routes requiring an authenticated actor; the listing and detail reads are
/// wired as public routes in `build_app`.
pub fn protected_router() -> Router {
    Router::new().route("/courses/:id/edits", post(submit_course_edit))
}

pub async fn list_courses(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::CourseListQuery>,
) -> axum::response::Response {
    match services.courses.list_public(query.into_query()).await {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn get_course(
    Extension(services): Extension<Arc<AppServices>>,
    Path(slug): Path<String>,
) -> axum::response::Response {
    match services.courses.get_published_by_slug(&slug).await {
        Ok((course, organization_name)) => (
            StatusCode::OK,
            Json(dto::course_detail_to_json(&course, &organization_name)),
        )
            .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn submit_course_edit(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::CourseEditRequest>,
) -> axum::response::Response {
    let course_id: CourseId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid course id")
        }
    };

    match services
        .drafts
        .submit_course_edit(ctx.actor(), course_id, body, Utc::now())
        .await
    {
        Ok(submission) => (
            StatusCode::CREATED,
            Json(dto::draft_to_json(&submission.draft)),
        )
            .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
