//! Role authorization.
use santhe_common::Role;
use tracing::debug;

use crate::error::AppError;

/// Allow the call only if `role` is in `allowed`. An empty allow-list denies everyone.
pub fn require(role: Role, allowed: &[Role]) -> Result<(), AppError> {
    if allowed.contains(&role) {
        Ok(())
    } else {
        debug!(%role, ?allowed, "role not permitted");
        Err(AppError::Forbidden)
    }
}

/// Check the role *requested in a payload*, not the caller's own role.
/// Used by admin provisioning, which only insists that the body asks for `expected`.
pub fn require_requested_role(requested: Role, expected: Role) -> Result<(), AppError> {
    if requested == expected {
        Ok(())
    } else {
        Err(AppError::validation(format!(
            "Role must be '{expected}' for this endpoint"
        )))
    }
}
