// ============================
// santhe-backend-lib/src/lib.rs
// ============================
//! Core of the Santhe user service: credential storage, password hashing,
//! bearer token issuing and verification, and the HTTP surface built on them.

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod router;
pub mod storage;
pub mod telemetry;
pub mod user;
pub mod validation;

use std::sync::Arc;

use tracing::{info, warn};

use crate::auth::{AuthService, DefaultAuth};
use crate::config::{Settings, StorageBackend};
use crate::error::AppError;
use crate::storage::{CredentialStore, FlatFileCredentialStore, MemoryCredentialStore};

pub use crate::router::create_router;

/// Secrets shorter than this are accepted but logged as weak
const RECOMMENDED_SECRET_LEN: usize = 32;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Registration, login and token resolution
    pub auth: Arc<dyn AuthService>,
    /// Storage backend
    pub store: Arc<dyn CredentialStore>,
    /// Immutable after startup
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Open the configured storage backend and build the state around it
    pub async fn new(settings: Settings) -> anyhow::Result<Self> {
        let store: Arc<dyn CredentialStore> = match settings.storage.backend {
            StorageBackend::Memory => Arc::new(MemoryCredentialStore::new()),
            StorageBackend::File => {
                Arc::new(FlatFileCredentialStore::open(&settings.storage.data_dir).await?)
            },
        };
        info!(backend = ?settings.storage.backend, "credential store ready");
        Ok(Self::with_store(store, settings)?)
    }

    /// Build the state around an already opened store
    pub fn with_store(store: Arc<dyn CredentialStore>, settings: Settings) -> Result<Self, AppError> {
        if settings.auth.jwt_secret.len() < RECOMMENDED_SECRET_LEN {
            warn!(
                len = settings.auth.jwt_secret.len(),
                "signing secret is shorter than {RECOMMENDED_SECRET_LEN} bytes"
            );
        }

        let auth = Arc::new(DefaultAuth::new(store.clone(), &settings)?);
        Ok(Self {
            auth,
            store,
            settings: Arc::new(settings),
        })
    }
}
