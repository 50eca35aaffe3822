// ============================
// santhe-backend-lib/src/storage/flat_file.rs
// ============================
//! Credential store persisted as a single JSON document.
//!
//! Every mutation is applied to a copy of the table, written to
//! `users.json.tmp`, and renamed over `users.json`. The in-memory table is
//! only replaced once the rename succeeds, so a failed write leaves both the
//! file and the served state unchanged.
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use santhe_common::Role;
use tokio::{fs as tokio_fs, io::AsyncWriteExt, sync::RwLock};
use tracing::{debug, info};

use super::{CredentialStore, StoreError, UserTable, UserTableFile};
use crate::user::{NewUser, User, UserPatch};

const USERS_FILE: &str = "users.json";
const USERS_TMP_FILE: &str = "users.json.tmp";

/// Flat-file implementation of [`CredentialStore`]
#[derive(Debug)]
pub struct FlatFileCredentialStore {
    root: PathBuf,
    table: RwLock<UserTable>,
}

impl FlatFileCredentialStore {
    /// Open the store rooted at `root`, loading `users.json` if it exists
    pub async fn open<P: AsRef<Path>>(root: P) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        tokio_fs::create_dir_all(&root).await?;

        let path = root.join(USERS_FILE);
        let table = match tokio_fs::read_to_string(&path).await {
            Ok(content) => {
                let file: UserTableFile = serde_json::from_str(&content)?;
                UserTable::from_file(file)?
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => UserTable::new(),
            Err(e) => return Err(e.into()),
        };
        info!(path = %path.display(), users = table.len(), "credential store opened");

        Ok(Self {
            root,
            table: RwLock::new(table),
        })
    }

    async fn persist(&self, table: &UserTable) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(&table.to_file())?;
        let tmp = self.root.join(USERS_TMP_FILE);

        let mut file = tokio_fs::File::create(&tmp).await?;
        file.write_all(&json).await?;
        file.sync_all().await?;
        drop(file);

        tokio_fs::rename(&tmp, self.root.join(USERS_FILE)).await?;
        debug!(users = table.len(), "user table written");
        Ok(())
    }

    /// Run `mutate` against a copy of the table and commit it once persisted
    async fn commit<F>(&self, mutate: F) -> Result<User, StoreError>
    where
        F: FnOnce(&mut UserTable) -> Result<User, StoreError> + Send,
    {
        let mut table = self.table.write().await;
        let mut next = table.clone();
        let user = mutate(&mut next)?;
        self.persist(&next).await?;
        *table = next;
        Ok(user)
    }
}

#[async_trait]
impl CredentialStore for FlatFileCredentialStore {
    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        self.commit(move |table| table.insert(new_user)).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self.table.read().await.by_username(username))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        Ok(self.table.read().await.by_id(id))
    }

    async fn update(&self, user: &User, patch: UserPatch) -> Result<User, StoreError> {
        let id = user.id;
        self.commit(move |table| table.patch(id, &patch)).await
    }

    async fn update_role(&self, user: &User, role: Role) -> Result<User, StoreError> {
        let id = user.id;
        self.commit(move |table| table.set_role(id, role)).await
    }
}
