use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, patch, post},
    Json, Router,
};
use chrono::Utc;

use coursehub_core::{OrganizationId, UserId};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::ActorContext;

pub fn router() -> Router {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/:id/role", patch(change_role))
        .route("/users/:id/deactivate", post(deactivate_user))
        .route("/users/:id/reactivate", post(reactivate_user))
        .route("/invites", get(list_invites).post(create_invite))
        .route(
            "/organizations",
            get(list_organizations).post(create_organization),
        )
        .route("/organizations/:id", delete(delete_organization))
}

fn parse_user_id(id: &str) -> Result<UserId, axum::response::Response> {
    id.parse()
        .map_err(|_| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid user id"))
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
) -> axum::response::Response {
    match services.admin.list_users(ctx.actor()).await {
        Ok(users) => (
            StatusCode::OK,
            Json(users.iter().map(dto::user_to_json).collect::<Vec<_>>()),
        )
            .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn change_role(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::ChangeRoleRequest>,
) -> axum::response::Response {
    let id = match parse_user_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.admin.change_role(ctx.actor(), id, body).await {
        Ok(user) => (StatusCode::OK, Json(dto::user_to_json(&user))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn deactivate_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_user_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.admin.deactivate_user(ctx.actor(), id).await {
        Ok(user) => (StatusCode::OK, Json(dto::user_to_json(&user))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn reactivate_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_user_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.admin.reactivate_user(ctx.actor(), id).await {
        Ok(user) => (StatusCode::OK, Json(dto::user_to_json(&user))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn create_invite(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Json(body): Json<dto::InviteRequest>,
) -> axum::response::Response {
    match services.admin.invite(ctx.actor(), body, Utc::now()).await {
        Ok(invite) => (StatusCode::CREATED, Json(dto::invite_to_json(&invite))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn list_invites(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
) -> axum::response::Response {
    match services.admin.list_invites(ctx.actor()).await {
        Ok(invites) => (
            StatusCode::OK,
            Json(invites.iter().map(dto::invite_to_json).collect::<Vec<_>>()),
        )
            .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn list_organizations(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
) -> axum::response::Response {
    match services.admin.list_organizations(ctx.actor()).await {
        Ok(orgs) => (
            StatusCode::OK,
            Json(orgs.iter().map(dto::organization_to_json).collect::<Vec<_>>()),
        )
            .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn create_organization(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Json(body): Json<dto::OrganizationRequest>,
) -> axum::response::Response {
    match services
        .admin
        .create_organization(ctx.actor(), body.content, Utc::now())
        .await
    {
        Ok(org) => (StatusCode::CREATED, Json(dto::organization_to_json(&org))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn delete_organization(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<ActorContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: OrganizationId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "invalid_id",
                "invalid organization id",
            )
        }
    };

    match services.admin.delete_organization(ctx.actor(), id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
