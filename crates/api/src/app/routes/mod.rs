use axum::{routing::get, Router};

pub mod admin;
pub mod advocates;
pub mod courses;
pub mod drafts;
pub mod organizations;
pub mod system;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/drafts", drafts::router())
        .nest("/profile", advocates::profile_router())
        .nest("/organizations", organizations::router())
        .nest("/admin", admin::router())
        .merge(courses::protected_router())
        .merge(advocates::protected_router())
}
