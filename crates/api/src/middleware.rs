use std::sync::Arc;

use axum::{
    extract::State,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use coursehub_auth::SessionClaims;
use coursehub_core::DomainError;

use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::ActorContext;
use crate::session::SessionCodec;

#[derive(Clone)]
pub struct AuthState {
    pub sessions: Arc<SessionCodec>,
    pub services: Arc<AppServices>,
}

/// Resolve the bearer token into an [`ActorContext`] or fail with 401.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    // Decode before any await so no header borrow crosses a suspension point.
    let claims = match decode_bearer(&state, req.headers()) {
        Ok(claims) => claims,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match state.services.identity.resolve(&claims, Utc::now()).await {
        Ok(actor) => {
            req.extensions_mut().insert(ActorContext::new(actor));
            next.run(req).await
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

fn decode_bearer(state: &AuthState, headers: &HeaderMap) -> Result<SessionClaims, DomainError> {
    let token = extract_bearer(headers)?;
    state.sessions.decode(token)
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, DomainError> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or(DomainError::Unauthenticated)?;

    let header = header.to_str().map_err(|_| DomainError::Unauthenticated)?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or(DomainError::Unauthenticated)?
        .trim();
    if token.is_empty() {
        return Err(DomainError::Unauthenticated);
    }

    Ok(token)
}
