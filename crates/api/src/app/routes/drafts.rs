use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;

use coursehub_core::DraftId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::ActorContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_draft).get(list_drafts))
        .route("/pending", get(list_pending))
        .route(
            "/:id",
            get(get_draft).patch(patch_draft).delete(delete_draft),
        )
        .route("/:id/copy", post(copy_draft))
}

fn parse_id(id: &str) -> Result<DraftId, axum::response::Response> {
    id.parse().map_err(|_| {
        errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid draft id")
    })
}

pub async fn create_draft(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Json(body): Json<dto::CreateDraftRequest>,
) -> axum::response::Response {
    match services.drafts.create(ctx.actor(), body, Utc::now()).await {
        Ok(draft) => (StatusCode::CREATED, Json(dto::draft_to_json(&draft))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn list_drafts(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
) -> axum::response::Response {
    match services.drafts.list_mine(ctx.actor()).await {
        Ok(drafts) => (
            StatusCode::OK,
            Json(drafts.iter().map(dto::draft_to_json).collect::<Vec<_>>()),
        )
            .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn list_pending(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
) -> axum::response::Response {
    match services.drafts.list_pending(ctx.actor()).await {
        Ok(drafts) => (
            StatusCode::OK,
            Json(drafts.iter().map(dto::draft_to_json).collect::<Vec<_>>()),
        )
            .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn get_draft(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.drafts.get(ctx.actor(), id).await {
        Ok(draft) => (StatusCode::OK, Json(dto::draft_to_json(&draft))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn patch_draft(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::PatchDraftRequest>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.drafts.patch(ctx.actor(), id, body, Utc::now()).await {
        Ok(draft) => (StatusCode::OK, Json(dto::draft_to_json(&draft))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn copy_draft(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.drafts.copy(ctx.actor(), id, Utc::now()).await {
        Ok(copy) => (StatusCode::CREATED, Json(dto::draft_to_json(&copy))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn delete_draft(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.drafts.delete(ctx.actor(), id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
