// ============================
// santhe-backend-lib/src/handlers/users.rs
// ============================
//! User registration, profile and role endpoints.
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use santhe_common::{
    RegisterRequest, RegisterResponse, Role, RoleUpdateRequest, RoleUpdateResponse,
    UpdateProfileRequest, UserResponse,
};
use tracing::info;

use crate::auth::guard;
use crate::error::AppError;
use crate::extract::{AppJson, AppPath};
use crate::middleware::CurrentUser;
use crate::validation::{parse_role, validate_profile_update};
use crate::AppState;

/// `POST /api/users/register`
pub async fn register(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let user = state.auth.register(req).await?;
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User created successfully".to_string(),
            user_id: user.id,
        }),
    ))
}

/// `POST /api/users/admin-register`
///
/// Only insists that the payload asks for the admin role. Whether the caller
/// must itself be an admin is decided by the router from configuration.
pub async fn admin_register(
    state: State<Arc<AppState>>,
    AppJson(req): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    guard::require_requested_role(parse_role(&req.role)?, Role::Admin)?;
    register(state, AppJson(req)).await
}

/// `GET /api/users/me`
pub async fn get_me(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<UserResponse> {
    Json(user.to_response())
}

/// `PATCH /api/users/me`
pub async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    AppJson(req): AppJson<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, AppError> {
    validate_profile_update(&req)?;
    let updated = state.store.update(&user, req.into()).await?;
    info!(user_id = updated.id, "profile updated");
    Ok(Json(updated.to_response()))
}

/// `GET /api/users/{id}`
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<i64>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state
        .store
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(Json(user.to_response()))
}

/// `PATCH /api/users/{id}/role`
pub async fn update_role(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<i64>,
    AppJson(req): AppJson<RoleUpdateRequest>,
) -> Result<Json<RoleUpdateResponse>, AppError> {
    let user = state
        .store
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    let role = parse_role(&req.role)?;

    let updated = state.store.update_role(&user, role).await?;
    info!(user_id = updated.id, from = %user.role, to = %updated.role, "role changed");
    Ok(Json(RoleUpdateResponse {
        message: "Role updated successfully".to_string(),
        new_role: updated.role,
    }))
}
