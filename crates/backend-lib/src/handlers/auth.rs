// ============================
// santhe-backend-lib/src/handlers/auth.rs
// ============================
//! Login and logout.
use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use santhe_common::{LoginRequest, MessageResponse, TokenResponse};
use tracing::info;

use crate::error::AppError;
use crate::extract::AppJson;
use crate::middleware::AuthSubject;
use crate::AppState;

/// `POST /api/auth/login`
pub async fn login(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let access_token = state.auth.login(req).await?;
    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}

/// `POST /api/auth/logout`
///
/// Tokens are stateless and stay valid until they expire; the client is
/// expected to discard its copy.
pub async fn logout(
    Extension(subject): Extension<Option<AuthSubject>>,
) -> Json<MessageResponse> {
    if let Some(AuthSubject(username)) = subject {
        info!(%username, "logout");
    }
    Json(MessageResponse::new("Logout successful"))
}
