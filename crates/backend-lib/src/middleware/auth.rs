// ============================
// santhe-backend-lib/src/middleware/auth.rs
// ============================
//! Bearer token authentication and role gating.
//!
//! `require_auth` resolves the token's subject against the credential store
//! on every request, so role changes and renames take effect immediately.
//! `require_subject` and `optional_subject` only check the token and can run
//! in any service that holds the signing secret.
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use santhe_common::Role;
use tracing::debug;

use crate::auth::guard;
use crate::error::AppError;
use crate::user::User;
use crate::AppState;

/// The authenticated caller, as currently stored
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Username carried by a verified token, not checked against the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSubject(pub String);

/// Pull the token out of an `Authorization: Bearer <token>` header.
/// The scheme is matched case-insensitively.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return None;
    }
    Some(token)
}

/// Reject the request unless it carries a valid token for an existing user
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(token) = extract_bearer_token(request.headers()) else {
        debug!(path = %request.uri().path(), "missing bearer token");
        return Err(AppError::Unauthenticated);
    };
    let user = state.auth.authenticate(token).await?;

    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}

/// Reject the request unless it carries a valid token. No store lookup.
pub async fn require_subject(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer_token(request.headers()).ok_or(AppError::Unauthenticated)?;
    let claims = state.auth.verify_token(token)?;

    request.extensions_mut().insert(AuthSubject(claims.sub));
    Ok(next.run(request).await)
}

/// Attach the token's subject when there is a valid one; never rejects
pub async fn optional_subject(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let subject = extract_bearer_token(request.headers())
        .and_then(|token| state.auth.verify_token(token).ok())
        .map(|claims| AuthSubject(claims.sub));

    request.extensions_mut().insert(subject);
    next.run(request).await
}

/// Allow the request only if the caller's role is in `allowed`.
/// Must run after [`require_auth`]; without a resolved caller it answers 401.
pub async fn require_roles(
    allowed: &'static [Role],
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(CurrentUser(user)) = request.extensions().get::<CurrentUser>() else {
        return Err(AppError::Unauthenticated);
    };
    guard::require(user.role, allowed)?;
    Ok(next.run(request).await)
}

/// [`require_roles`] for administrators only
pub async fn require_admin(request: Request, next: Next) -> Result<Response, AppError> {
    require_roles(&[Role::Admin], request, next).await
}
