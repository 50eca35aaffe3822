// ============================
// santhe-backend-lib/src/middleware/mod.rs
// ============================
//! Middleware for the Santhe user service.

pub mod auth;

pub use auth::{
    extract_bearer_token, optional_subject, require_admin, require_auth, require_roles,
    require_subject, AuthSubject, CurrentUser,
};
