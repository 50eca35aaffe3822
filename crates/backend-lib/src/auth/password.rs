// ============================
// santhe-backend-lib/src/auth/password.rs
// ============================
//! Password hashing and verification.
use std::sync::Arc;

use thiserror::Error;

use crate::config::PasswordRequirements;
use crate::error::AppError;

/// Hashing failed; verification never fails, it only says no
#[derive(Error, Debug)]
#[error("password hashing failed: {0}")]
pub struct HashError(#[from] bcrypt::BcryptError);

impl From<HashError> for AppError {
    fn from(err: HashError) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// Longest password bcrypt can hash without dropping input. Its 72-byte
/// key includes a terminating NUL.
pub const MAX_PASSWORD_BYTES: usize = 71;

/// bcrypt hasher with a fixed cost factor.
///
/// Inputs longer than [`MAX_PASSWORD_BYTES`] are refused rather than
/// truncated, so two passwords sharing a long prefix never collide. The
/// work per call is set by the cost alone.
#[derive(Clone)]
pub struct PasswordHasher {
    cost: u32,
    /// Hash verified against when the user does not exist, so an unknown
    /// username costs as much as a wrong password.
    dummy_hash: Arc<str>,
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher")
            .field("cost", &self.cost)
            .finish_non_exhaustive()
    }
}

impl PasswordHasher {
    /// Create a hasher. Computes one hash up front.
    pub fn new(cost: u32) -> Result<Self, HashError> {
        let dummy_hash = bcrypt::non_truncating_hash("santhe-unknown-user", cost)?;
        Ok(Self {
            cost,
            dummy_hash: dummy_hash.into(),
        })
    }

    /// Hash a password with a fresh salt. Output is `$2b$<cost>$<salt><digest>`.
    /// Fails for passwords longer than [`MAX_PASSWORD_BYTES`].
    pub fn hash(&self, plain: &str) -> Result<String, HashError> {
        Ok(bcrypt::non_truncating_hash(plain, self.cost)?)
    }

    /// Verify a password against a stored hash. A malformed hash or an
    /// over-long password is a mismatch.
    pub fn verify(&self, plain: &str, hash: &str) -> bool {
        bcrypt::non_truncating_verify(plain, hash).unwrap_or(false)
    }

    /// Burn one verification's worth of work for a user that does not exist
    pub fn verify_unknown_user(&self, plain: &str) -> bool {
        let _ = bcrypt::non_truncating_verify(plain, &self.dummy_hash);
        false
    }
}

/// Check if a password meets the complexity requirements
pub fn validate_password_strength(password: &str, requirements: &PasswordRequirements) -> bool {
    if password.chars().count() < requirements.min_length {
        return false;
    }

    if requirements.require_uppercase && !password.chars().any(char::is_uppercase) {
        return false;
    }

    if requirements.require_lowercase && !password.chars().any(char::is_lowercase) {
        return false;
    }

    if requirements.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
        return false;
    }

    if requirements.require_special && !password.chars().any(|c| !c.is_alphanumeric()) {
        return false;
    }

    true
}
