// ============================
// santhe-backend-lib/src/handlers/system.rs
// ============================
//! Service metadata and the password-reset acknowledgement.
use axum::Json;
use santhe_common::{ForgotPasswordRequest, MessageResponse, Role, RolesResponse};
use serde_json::{json, Value};
use tracing::debug;

use crate::error::AppError;
use crate::extract::AppJson;
use crate::validation::validate_email;

pub async fn root() -> Json<MessageResponse> {
    Json(MessageResponse::new("User Service API"))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// `GET /api/roles`
pub async fn list_roles() -> Json<RolesResponse> {
    Json(RolesResponse {
        roles: Role::ALL.to_vec(),
    })
}

/// `POST /api/password/forgot`
///
/// Answers the same for known and unknown addresses. No mail is sent.
pub async fn forgot_password(
    AppJson(req): AppJson<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    validate_email(&req.email)?;
    debug!("password reset requested");
    Ok(Json(MessageResponse::new(
        "If the email is registered, a reset link has been sent.",
    )))
}
