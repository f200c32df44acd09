use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;

use coursehub_core::OrganizationId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::ActorContext;

pub fn router() -> Router {
    Router::new().route("/:id", get(get_organization).patch(update_organization))
}

fn parse_id(id: &str) -> Result<OrganizationId, axum::response::Response> {
    id.parse().map_err(|_| {
        errors::json_error(
            StatusCode::BAD_REQUEST,
            "invalid_id",
            "invalid organization id",
        )
    })
}

pub async fn get_organization(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.admin.get_organization(ctx.actor(), id).await {
        Ok(org) => (StatusCode::OK, Json(dto::organization_to_json(&org))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn update_organization(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::OrganizationRequest>,
) -> axum::response::Response {
    let id = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services
        .admin
        .update_organization(ctx.actor(), id, body.content, Utc::now())
        .await
    {
        Ok(org) => (StatusCode::OK, Json(dto::organization_to_json(&org))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
