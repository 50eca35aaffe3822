use std::sync::Arc;

use ::metrics::counter;
use async_trait::async_trait;
use santhe_common::{LoginRequest, RegisterRequest};
use tracing::{debug, info, warn};

use crate::auth::{AuthService, Claims, PasswordHasher, TokenError, TokenIssuer, TokenVerifier};
use crate::config::{PasswordRequirements, Settings};
use crate::error::AppError;
use crate::metrics;
use crate::storage::{CredentialStore, StoreError};
use crate::user::{NewUser, User};
use crate::validation::validate_registration;

pub struct DefaultAuth {
    store: Arc<dyn CredentialStore>,
    hasher: PasswordHasher,
    issuer: TokenIssuer,
    verifier: TokenVerifier,
    password_requirements: PasswordRequirements,
}

impl DefaultAuth {
    pub fn new(store: Arc<dyn CredentialStore>, settings: &Settings) -> Result<Self, AppError> {
        Ok(Self {
            store,
            hasher: PasswordHasher::new(settings.auth.bcrypt_cost)?,
            issuer: TokenIssuer::from_settings(&settings.auth),
            verifier: TokenVerifier::from_settings(&settings.auth),
            password_requirements: settings.password_requirements.clone(),
        })
    }
}

#[async_trait]
impl AuthService for DefaultAuth {
    async fn register(&self, req: RegisterRequest) -> Result<User, AppError> {
        let role = validate_registration(&req, &self.password_requirements)?;

        // Cheap rejection before paying for a hash; the store re-checks atomically
        if self.store.find_by_username(&req.username).await?.is_some() {
            counter!(metrics::REGISTRATION_CONFLICT).increment(1);
            return Err(AppError::Conflict);
        }

        let hasher = self.hasher.clone();
        let password = req.password;
        let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&password)).await??;

        let user = self
            .store
            .create(NewUser {
                username: req.username,
                email: req.email,
                password_hash,
                role,
                profile: req.profile,
            })
            .await
            .inspect_err(|e| {
                if matches!(e, StoreError::Conflict) {
                    counter!(metrics::REGISTRATION_CONFLICT).increment(1);
                }
            })?;

        counter!(metrics::USER_REGISTERED).increment(1);
        info!(user_id = user.id, username = %user.username, role = %user.role, "user registered");
        Ok(user)
    }

    async fn login(&self, req: LoginRequest) -> Result<String, AppError> {
        let user = self.store.find_by_username(&req.username).await?;

        let hasher = self.hasher.clone();
        let stored_hash = user.as_ref().map(|u| u.password_hash.clone());
        let password = req.password;
        let verified = tokio::task::spawn_blocking(move || match stored_hash {
            Some(hash) => hasher.verify(&password, &hash),
            None => hasher.verify_unknown_user(&password),
        })
        .await?;

        let user = match user {
            Some(user) if verified => user,
            _ => {
                counter!(metrics::LOGIN_FAILURE).increment(1);
                warn!(username = %req.username, "login failed");
                return Err(AppError::InvalidCredentials);
            },
        };

        let token = self.issuer.issue(&user.username)?;
        counter!(metrics::LOGIN_SUCCESS).increment(1);
        counter!(metrics::TOKEN_ISSUED).increment(1);
        info!(user_id = user.id, username = %user.username, "login succeeded");
        Ok(token)
    }

    async fn authenticate(&self, token: &str) -> Result<User, AppError> {
        let claims = self.verify_token(token)?;

        self.store
            .find_by_username(&claims.sub)
            .await?
            .ok_or_else(|| {
                counter!(metrics::TOKEN_REJECTED).increment(1);
                debug!(subject = %claims.sub, "token subject no longer exists");
                AppError::Unauthenticated
            })
    }

    fn verify_token(&self, token: &str) -> Result<Claims, TokenError> {
        self.verifier.verify(token).inspect_err(|e| {
            counter!(metrics::TOKEN_REJECTED).increment(1);
            debug!(reason = %e, "token rejected");
        })
    }
}
