use std::sync::Arc;

use axum::{
    extract::State,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use atrium_auth::JwtVerifier;
use atrium_core::SystemType;

use crate::app::errors::ApiError;
use crate::context::{AuthSubject, ScopeContext};

/// Stamp the system scope derived from the request path prefix. Applied
/// outermost so it observes the un-stripped URI.
pub async fn scope_middleware(
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let scope = SystemType::from_path(req.uri().path());
    req.extensions_mut().insert(ScopeContext(scope));
    next.run(req).await
}

#[derive(Clone)]
pub struct AuthState {
    pub jwt: Arc<dyn JwtVerifier>,
}

/// Bearer-token gate for protected routes: verifies the token and inserts
/// the subject. Fails closed with a structured 401.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(req.headers())?;

    let claims = state
        .jwt
        .verify(token, Utc::now())
        .map_err(|_| ApiError::unauthorized("Invalid token"))?;

    req.extensions_mut().insert(AuthSubject(claims.sub));

    Ok(next.run(req).await)
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, ApiError> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| ApiError::unauthorized("Invalid token"))?;

    let header = header
        .to_str()
        .map_err(|_| ApiError::unauthorized("Invalid token"))?;

    let header = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::unauthorized("Invalid token"))?;

    let token = header.trim();
    if token.is_empty() {
        return Err(ApiError::unauthorized("Invalid token"));
    }

    Ok(token)
}
