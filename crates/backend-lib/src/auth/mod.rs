// ============================
// santhe-backend-lib/src/auth/mod.rs
// ============================
//! Authentication module.

pub mod guard;
pub mod password;
pub mod token;
mod service;
mod service_impl;

pub use password::{validate_password_strength, HashError, PasswordHasher};
pub use service::AuthService;
pub use service_impl::DefaultAuth;
pub use token::{Claims, TokenError, TokenIssuer, TokenVerifier};
