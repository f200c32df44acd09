//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services/`: service layer (identity, drafts, courses, advocates, admin)
//! - `routes/`: HTTP routes + handlers (one file per domain area)
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};

use crate::middleware;
use crate::session::SessionCodec;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(services: Arc<services::AppServices>, session_secret: String) -> Router {
    let sessions = Arc::new(SessionCodec::new(session_secret.as_bytes()));
    let auth_state = middleware::AuthState {
        sessions,
        services: services.clone(),
    };

    // Protected routes: require a resolved actor.
    let protected = routes::router().layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    Router::new()
        .route("/health", get(routes::system::health))
        .route("/courses", get(routes::courses::list_courses))
        .route("/courses/:slug", get(routes::courses::get_course))
        .route("/advocates", get(routes::advocates::list_advocates))
        .merge(protected)
        .layer(Extension(services))
}
