// ============================
// santhe-backend-lib/src/user.rs
// ============================
//! The persisted user record and the partial update applied to it.
use std::fmt;

use chrono::NaiveDate;
use santhe_common::{ProfileFields, Role, UpdateProfileRequest, UserResponse};
use serde::{Deserialize, Serialize};

/// A registered user as held by the credential store
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    /// bcrypt string, never the plaintext and never empty
    pub password_hash: String,
    pub role: Role,
    #[serde(flatten)]
    pub profile: ProfileFields,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

impl User {
    /// Public view, without the password hash or payment token
    pub fn to_response(&self) -> UserResponse {
        UserResponse {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            role: self.role,
            first_name: self.profile.first_name.clone(),
            last_name: self.profile.last_name.clone(),
            phone: self.profile.phone.clone(),
            address: self.profile.address.clone(),
            date_of_birth: self.profile.date_of_birth,
        }
    }
}

/// Everything needed to create a user; the store assigns the id
#[derive(Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub profile: ProfileFields,
}

/// Fields to change on an existing user. `None` leaves a field untouched;
/// for profile fields `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<Option<String>>,
    pub last_name: Option<Option<String>>,
    pub phone: Option<Option<String>>,
    pub address: Option<Option<String>>,
    pub date_of_birth: Option<Option<NaiveDate>>,
    pub payment_token: Option<Option<String>>,
}

impl UserPatch {
    /// Apply the present fields to `user`
    pub fn apply_to(&self, user: &mut User) {
        if let Some(username) = &self.username {
            user.username = username.clone();
        }
        if let Some(email) = &self.email {
            user.email = email.clone();
        }
        let profile = &mut user.profile;
        if let Some(v) = &self.first_name {
            profile.first_name = v.clone();
        }
        if let Some(v) = &self.last_name {
            profile.last_name = v.clone();
        }
        if let Some(v) = &self.phone {
            profile.phone = v.clone();
        }
        if let Some(v) = &self.address {
            profile.address = v.clone();
        }
        if let Some(v) = self.date_of_birth {
            profile.date_of_birth = v;
        }
        if let Some(v) = &self.payment_token {
            profile.payment_token = v.clone();
        }
    }
}

impl From<UpdateProfileRequest> for UserPatch {
    fn from(req: UpdateProfileRequest) -> Self {
        Self {
            username: req.username,
            email: req.email,
            first_name: req.first_name,
            last_name: req.last_name,
            phone: req.phone,
            address: req.address,
            date_of_birth: req.date_of_birth,
            payment_token: req.payment_token,
        }
    }
}
