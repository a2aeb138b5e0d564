use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use tienda_auth::{Role, SessionStore, SessionToken};

use crate::app::errors;
use crate::context::PrincipalContext;

#[derive(Clone)]
pub struct AuthState {
    pub sessions: Arc<SessionStore>,
}

/// Require a valid admin session (`Authorization: Bearer <token>`).
///
/// Catalog mutations are the only admin-gated surface; everything else is
/// open or keyed by explicit request fields.
pub async fn require_admin(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let token = extract_bearer(req.headers())
        .ok_or_else(|| errors::json_error(StatusCode::UNAUTHORIZED, "missing session token"))?;

    let token: SessionToken = token
        .parse()
        .map_err(|_| errors::json_error(StatusCode::UNAUTHORIZED, "invalid session token"))?;

    let session = state
        .sessions
        .resolve(token)
        .map_err(|_| errors::json_error(StatusCode::UNAUTHORIZED, "invalid session token"))?;

    if session.role != Role::Admin {
        return Err(errors::json_error(StatusCode::FORBIDDEN, "forbidden"));
    }

    req.extensions_mut().insert(PrincipalContext::new(
        session.user_id,
        session.username.clone(),
        session.role,
    ));

    Ok(next.run(req).await)
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(axum::http::header::AUTHORIZATION)?;
    let header = header.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() { None } else { Some(token) }
}
