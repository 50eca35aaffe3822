// ============================
// santhe-backend-lib/src/storage/mod.rs
// ============================
//! Credential store abstraction with in-memory and flat-file implementations.
//!
//! Both backends keep the whole user table behind one lock, so the
//! uniqueness check and the insert of a registration are a single atomic
//! step: two concurrent registrations of the same username yield exactly one
//! user and one [`StoreError::Conflict`].
use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use santhe_common::Role;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::AppError;
use crate::user::{NewUser, User, UserPatch};

mod flat_file;
mod memory;

pub use flat_file::FlatFileCredentialStore;
pub use memory::MemoryCredentialStore;

/// Errors raised by a credential store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("username or email already exists")]
    Conflict,

    #[error("user {0} not found")]
    NotFound(i64),

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt user table: {0}")]
    Corrupt(#[from] serde_json::Error),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict => AppError::Conflict,
            StoreError::NotFound(_) => AppError::NotFound("User not found".to_string()),
            StoreError::Io(e) => AppError::Io(e),
            StoreError::Corrupt(e) => AppError::Json(e),
        }
    }
}

/// Persistence of user records
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Insert a new user, failing with `Conflict` if the username or email is taken
    async fn create(&self, new_user: NewUser) -> Result<User, StoreError>;

    /// Look a user up by exact username
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    /// Look a user up by id
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError>;

    /// Apply the present fields of `patch` to `user`
    async fn update(&self, user: &User, patch: UserPatch) -> Result<User, StoreError>;

    /// Replace the role of `user`. The caller has already validated `role`.
    async fn update_role(&self, user: &User, role: Role) -> Result<User, StoreError>;
}

/// The user table shared by both backends, with unique indexes
#[derive(Debug, Clone, Default)]
pub(crate) struct UserTable {
    users: BTreeMap<i64, User>,
    by_username: HashMap<String, i64>,
    by_email: HashMap<String, i64>,
    next_id: i64,
}

/// On-disk form of [`UserTable`]; the indexes are rebuilt on load
#[derive(Serialize, Deserialize)]
pub(crate) struct UserTableFile {
    next_id: i64,
    users: Vec<User>,
}

/// Emails compare case-insensitively
fn email_key(email: &str) -> String {
    email.to_lowercase()
}

impl UserTable {
    pub(crate) fn new() -> Self {
        Self {
            next_id: 1,
            ..Default::default()
        }
    }

    pub(crate) fn insert(&mut self, new_user: NewUser) -> Result<User, StoreError> {
        let email = email_key(&new_user.email);
        if self.by_username.contains_key(&new_user.username) || self.by_email.contains_key(&email)
        {
            return Err(StoreError::Conflict);
        }

        let id = self.next_id;
        self.next_id += 1;

        let user = User {
            id,
            username: new_user.username,
            email: new_user.email,
            password_hash: new_user.password_hash,
            role: new_user.role,
            profile: new_user.profile,
        };
        self.by_username.insert(user.username.clone(), id);
        self.by_email.insert(email, id);
        self.users.insert(id, user.clone());
        Ok(user)
    }

    pub(crate) fn by_username(&self, username: &str) -> Option<User> {
        self.by_username
            .get(username)
            .and_then(|id| self.users.get(id))
            .cloned()
    }

    pub(crate) fn by_id(&self, id: i64) -> Option<User> {
        self.users.get(&id).cloned()
    }

    pub(crate) fn patch(&mut self, id: i64, patch: &UserPatch) -> Result<User, StoreError> {
        let current = self.users.get(&id).ok_or(StoreError::NotFound(id))?;

        let mut updated = current.clone();
        patch.apply_to(&mut updated);

        let taken = |index: &HashMap<String, i64>, key: &str| {
            index.get(key).is_some_and(|owner| *owner != id)
        };
        if taken(&self.by_username, &updated.username)
            || taken(&self.by_email, &email_key(&updated.email))
        {
            return Err(StoreError::Conflict);
        }

        self.by_username.remove(&current.username);
        self.by_email.remove(&email_key(&current.email));
        self.by_username.insert(updated.username.clone(), id);
        self.by_email.insert(email_key(&updated.email), id);
        self.users.insert(id, updated.clone());
        Ok(updated)
    }

    pub(crate) fn set_role(&mut self, id: i64, role: Role) -> Result<User, StoreError> {
        let user = self.users.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        user.role = role;
        Ok(user.clone())
    }

    pub(crate) fn len(&self) -> usize {
        self.users.len()
    }

    pub(crate) fn to_file(&self) -> UserTableFile {
        UserTableFile {
            next_id: self.next_id,
            users: self.users.values().cloned().collect(),
        }
    }

    pub(crate) fn from_file(file: UserTableFile) -> Result<Self, StoreError> {
        let mut table = UserTable::new();
        for user in file.users {
            let email = email_key(&user.email);
            if table.by_username.contains_key(&user.username) || table.by_email.contains_key(&email)
            {
                return Err(StoreError::Conflict);
            }
            table.by_username.insert(user.username.clone(), user.id);
            table.by_email.insert(email, user.id);
            table.users.insert(user.id, user);
        }
        let max_id = table.users.keys().next_back().copied().unwrap_or(0);
        table.next_id = file.next_id.max(max_id + 1);
        Ok(table)
    }
}
