use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};

use crate::context::ActorContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(Extension(ctx): Extension<ActorContext>) -> impl IntoResponse {
    let actor = ctx.actor();
    Json(serde_json::json!({
        "user_id": actor.user_id.to_string(),
        "role": actor.role.as_str(),
        "organization_id": actor.organization_id.map(|id| id.to_string()),
    }))
}
