use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use chrono::Utc;

use coursehub_core::ProfileId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::ActorContext;

/// The actor's own profile (nested at `/profile`).
pub fn profile_router() -> Router {
    Router::new()
        .route("/", post(create_profile).get(my_profile).patch(patch_profile))
        .route("/hide", post(hide_profile))
        .route("/unhide", post(unhide_profile))
        .route("/rank", get(my_rank))
}

/// Moderation endpoints (merged into the protected router).
pub fn protected_router() -> Router {
    Router::new()
        .route("/advocates/pending", get(list_pending))
        .route("/advocates/:id/review", patch(review_profile))
}

pub async fn list_advocates(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.advocates.list_public().await {
        Ok(ranked) => (
            StatusCode::OK,
            Json(
                ranked
                    .iter()
                    .map(dto::ranked_advocate_to_json)
                    .collect::<Vec<_>>(),
            ),
        )
            .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn create_profile(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Json(body): Json<dto::CreateProfileRequest>,
) -> axum::response::Response {
    match services
        .advocates
        .create_profile(ctx.actor(), body, Utc::now())
        .await
    {
        Ok(profile) => (StatusCode::CREATED, Json(dto::profile_to_json(&profile))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn my_profile(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
) -> axum::response::Response {
    match services.advocates.my_profile(ctx.actor()).await {
        Ok(profile) => (StatusCode::OK, Json(dto::profile_to_json(&profile))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn patch_profile(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Json(body): Json<dto::PatchProfileRequest>,
) -> axum::response::Response {
    match services
        .advocates
        .patch_my_profile(ctx.actor(), body, Utc::now())
        .await
    {
        Ok(profile) => (StatusCode::OK, Json(dto::profile_to_json(&profile))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn hide_profile(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
) -> axum::response::Response {
    match services.advocates.hide_my_profile(ctx.actor(), Utc::now()).await {
        Ok(profile) => (StatusCode::OK, Json(dto::profile_to_json(&profile))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn unhide_profile(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
) -> axum::response::Response {
    match services
        .advocates
        .unhide_my_profile(ctx.actor(), Utc::now())
        .await
    {
        Ok(profile) => (StatusCode::OK, Json(dto::profile_to_json(&profile))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn my_rank(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
) -> axum::response::Response {
    match services.advocates.my_rank(ctx.actor()).await {
        Ok(rank) => (StatusCode::OK, Json(serde_json::json!({ "rank": rank }))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn list_pending(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
) -> axum::response::Response {
    match services.advocates.list_pending(ctx.actor()).await {
        Ok(profiles) => (
            StatusCode::OK,
            Json(profiles.iter().map(dto::profile_to_json).collect::<Vec<_>>()),
        )
            .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn review_profile(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::ReviewRequest>,
) -> axum::response::Response {
    let id: ProfileId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid profile id")
        }
    };

    match services.advocates.review(ctx.actor(), id, body, Utc::now()).await {
        Ok(profile) => (StatusCode::OK, Json(dto::profile_to_json(&profile))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
