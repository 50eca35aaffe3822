// ============================
// crates/backend-lib/src/validation/mod.rs
// ============================
//! Request validation module.

use std::sync::LazyLock;

use regex::Regex;
use santhe_common::{ProfileFields, RegisterRequest, Role, UpdateProfileRequest};
use thiserror::Error;

use crate::auth::password::MAX_PASSWORD_BYTES;
use crate::auth::validate_password_strength;
use crate::config::PasswordRequirements;
use crate::error::AppError;

const MAX_USERNAME_LENGTH: usize = 50;
const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321 SMTP limit
const MAX_PROFILE_FIELD_LENGTH: usize = 255;

static USERNAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.-]+$").expect("valid username regex"));
static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email regex")
});

/// Possible validation errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid username: {0}")]
    InvalidUsername(String),

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Invalid password: {0}")]
    InvalidPassword(String),

    #[error("Invalid role '{0}'. Must be one of {roles:?}", roles = Role::names())]
    InvalidRole(String),

    #[error("Invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err.to_string())
    }
}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Parse a role name against the closed role set.
/// Shared by registration and role update.
pub fn parse_role(role: &str) -> ValidationResult<Role> {
    role.parse()
        .map_err(|_| ValidationError::InvalidRole(role.to_string()))
}

/// Validate a username
pub fn validate_username(username: &str) -> ValidationResult<&str> {
    if username.is_empty() {
        return Err(ValidationError::InvalidUsername(
            "Username must not be empty".to_string(),
        ));
    }

    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(ValidationError::InvalidUsername(format!(
            "Username cannot exceed {MAX_USERNAME_LENGTH} characters"
        )));
    }

    if !USERNAME_REGEX.is_match(username) {
        return Err(ValidationError::InvalidUsername(
            "Username may only contain letters, digits, '.', '_' and '-'".to_string(),
        ));
    }

    Ok(username)
}

/// Validate an email address
pub fn validate_email(email: &str) -> ValidationResult<&str> {
    if email.is_empty() {
        return Err(ValidationError::InvalidEmail(
            "Email address cannot be empty".to_string(),
        ));
    }

    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::InvalidEmail(format!(
            "Email address cannot exceed {MAX_EMAIL_LENGTH} characters"
        )));
    }

    if !EMAIL_REGEX.is_match(email) {
        return Err(ValidationError::InvalidEmail(
            "Invalid email address format".to_string(),
        ));
    }

    Ok(email)
}

/// Validate a new password against the configured requirements
pub fn validate_password<'a>(
    password: &'a str,
    requirements: &PasswordRequirements,
) -> ValidationResult<&'a str> {
    // bcrypt's input limit is in bytes, not characters
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(ValidationError::InvalidPassword(format!(
            "Password cannot exceed {MAX_PASSWORD_BYTES} bytes"
        )));
    }

    if !validate_password_strength(password, requirements) {
        let mut rules = vec![format!("at least {} characters", requirements.min_length)];
        if requirements.require_uppercase {
            rules.push("an uppercase letter".to_string());
        }
        if requirements.require_lowercase {
            rules.push("a lowercase letter".to_string());
        }
        if requirements.require_digit {
            rules.push("a digit".to_string());
        }
        if requirements.require_special {
            rules.push("a special character".to_string());
        }
        return Err(ValidationError::InvalidPassword(format!(
            "Password must contain {}",
            rules.join(", ")
        )));
    }

    Ok(password)
}

fn validate_optional_field(field: &'static str, value: Option<&str>) -> ValidationResult<()> {
    match value {
        Some(v) if v.chars().count() > MAX_PROFILE_FIELD_LENGTH => {
            Err(ValidationError::InvalidField {
                field,
                reason: format!("cannot exceed {MAX_PROFILE_FIELD_LENGTH} characters"),
            })
        },
        _ => Ok(()),
    }
}

fn validate_profile(profile: &ProfileFields) -> ValidationResult<()> {
    validate_optional_field("first_name", profile.first_name.as_deref())?;
    validate_optional_field("last_name", profile.last_name.as_deref())?;
    validate_optional_field("phone", profile.phone.as_deref())?;
    validate_optional_field("address", profile.address.as_deref())?;
    validate_optional_field("payment_token", profile.payment_token.as_deref())?;
    Ok(())
}

/// Validate a registration payload, returning its parsed role
pub fn validate_registration(
    req: &RegisterRequest,
    requirements: &PasswordRequirements,
) -> ValidationResult<Role> {
    validate_username(&req.username)?;
    validate_email(&req.email)?;
    let role = parse_role(&req.role)?;
    validate_password(&req.password, requirements)?;
    validate_profile(&req.profile)?;
    Ok(role)
}

/// Validate a partial profile update
pub fn validate_profile_update(req: &UpdateProfileRequest) -> ValidationResult<()> {
    if let Some(username) = &req.username {
        validate_username(username)?;
    }
    if let Some(email) = &req.email {
        validate_email(email)?;
    }
    let fields = [
        ("first_name", &req.first_name),
        ("last_name", &req.last_name),
        ("phone", &req.phone),
        ("address", &req.address),
        ("payment_token", &req.payment_token),
    ];
    for (field, value) in fields {
        validate_optional_field(field, value.as_ref().and_then(|v| v.as_deref()))?;
    }
    Ok(())
}
