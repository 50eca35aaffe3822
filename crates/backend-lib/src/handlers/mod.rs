// ============================
// santhe-backend-lib/src/handlers/mod.rs
// ============================
//! HTTP handlers, grouped by resource.

pub mod auth;
pub mod system;
pub mod users;
