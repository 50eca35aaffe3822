//! Process-local credential store.
use async_trait::async_trait;
use parking_lot::RwLock;
use santhe_common::Role;

use super::{CredentialStore, StoreError, UserTable};
use crate::user::{NewUser, User, UserPatch};

/// Credential store that lives only as long as the process
#[derive(Debug)]
pub struct MemoryCredentialStore {
    table: RwLock<UserTable>,
}

impl Default for MemoryCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self {
            table: RwLock::new(UserTable::new()),
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        self.table.write().insert(new_user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self.table.read().by_username(username))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        Ok(self.table.read().by_id(id))
    }

    async fn update(&self, user: &User, patch: UserPatch) -> Result<User, StoreError> {
        self.table.write().patch(user.id, &patch)
    }

    async fn update_role(&self, user: &User, role: Role) -> Result<User, StoreError> {
        self.table.write().set_role(user.id, role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_support::new_user;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_create_and_find() {
        let store = MemoryCredentialStore::new();
        let alice = store.create(new_user("alice", "a@x.com")).await.unwrap();

        let found = store.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(found, alice);
        assert_eq!(store.find_by_id(alice.id).await.unwrap(), Some(alice));
        assert!(store.find_by_username("bob").await.unwrap().is_none());
        assert!(store.find_by_id(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_role() {
        let store = MemoryCredentialStore::new();
        let alice = store.create(new_user("alice", "a@x.com")).await.unwrap();

        let updated = store.update_role(&alice, Role::Middleman).await.unwrap();
        assert_eq!(updated.role, Role::Middleman);
        assert_eq!(
            store.find_by_id(alice.id).await.unwrap().unwrap().role,
            Role::Middleman
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_duplicate_registration_creates_one_user() {
        let store = Arc::new(MemoryCredentialStore::new());

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .create(new_user("alice", &format!("alice{i}@x.com")))
                    .await
            }));
        }

        let mut created = 0;
        let mut conflicts = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => created += 1,
                Err(StoreError::Conflict) => conflicts += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!(created, 1);
        assert_eq!(conflicts, 15);
    }
}
