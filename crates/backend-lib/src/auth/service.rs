// =============
// crates/backend-lib/src/auth/service.rs
// =============
//! The `AuthService` trait: registration, login, and token-to-user resolution.
use async_trait::async_trait;
use santhe_common::{LoginRequest, RegisterRequest};

use super::token::{Claims, TokenError};
use crate::error::AppError;
use crate::user::User;

#[async_trait]
pub trait AuthService: Send + Sync {
    /// Validate, hash and store a new user
    async fn register(&self, req: RegisterRequest) -> Result<User, AppError>;

    /// Check a username/password pair and issue an access token.
    /// Unknown user and wrong password fail identically.
    async fn login(&self, req: LoginRequest) -> Result<String, AppError>;

    /// Verify a bearer token and resolve its subject to the current user record
    async fn authenticate(&self, token: &str) -> Result<User, AppError>;

    /// Verify a bearer token without touching the credential store
    fn verify_token(&self, token: &str) -> Result<Claims, TokenError>;
}
