// ============================
// santhe-backend-lib/src/config.rs
// ============================
//! Configuration management.
//!
//! Settings are loaded once at startup and shared behind an `Arc`; nothing
//! mutates them afterwards. Sources, later ones winning:
//! built-in defaults, a TOML file, the shared `SECRET_KEY` variable, and
//! `SANTHE_`-prefixed environment variables (`__` separates nested keys).
use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Secret shared with the other services that verify our tokens
const SHARED_SECRET_VAR: &str = "SECRET_KEY";
const ENV_PREFIX: &str = "SANTHE_";
const SECRET_KEY_PATH: &str = "auth.jwt_secret";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Cost bounds accepted by bcrypt
pub const MIN_BCRYPT_COST: u32 = 4;
pub const MAX_BCRYPT_COST: u32 = 31;

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Log level, used when `RUST_LOG` is not set
    pub log_level: String,
    /// Log output format
    pub log_format: LogFormat,
    /// Credential store settings
    pub storage: StorageSettings,
    /// Token and hashing settings
    pub auth: AuthSettings,
    /// Password requirements enforced at registration
    pub password_requirements: PasswordRequirements,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-local, lost on restart
    Memory,
    /// `users.json` under `data_dir`
    File,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub backend: StorageBackend,
    pub data_dir: PathBuf,
}

/// Token signing and password hashing parameters
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// HMAC-SHA256 signing secret shared with every service that verifies tokens
    pub jwt_secret: String,
    /// Lifetime of an access token in seconds
    pub token_ttl_secs: u64,
    /// bcrypt cost factor
    pub bcrypt_cost: u32,
    /// Require an authenticated admin caller on `/api/users/admin-register`
    pub admin_register_requires_admin: bool,
    /// Require an authenticated admin caller on `PATCH /api/users/{id}/role`
    pub role_update_requires_admin: bool,
}

/// Password complexity requirements
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordRequirements {
    /// Minimum password length
    pub min_length: usize,
    /// Require uppercase letters
    pub require_uppercase: bool,
    /// Require lowercase letters
    pub require_lowercase: bool,
    /// Require digits
    pub require_digit: bool,
    /// Require special characters
    pub require_special: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            storage: StorageSettings::default(),
            auth: AuthSettings::default(),
            password_requirements: PasswordRequirements::default(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::File,
            data_dir: PathBuf::from("data"),
        }
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl_secs: 30 * 60,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            admin_register_requires_admin: false,
            role_update_requires_admin: false,
        }
    }
}

impl fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSettings")
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field(
                "admin_register_requires_admin",
                &self.admin_register_requires_admin,
            )
            .field("role_update_requires_admin", &self.role_update_requires_admin)
            .finish()
    }
}

impl Default for PasswordRequirements {
    fn default() -> Self {
        Self {
            min_length: 8,
            require_uppercase: false,
            require_lowercase: false,
            require_digit: false,
            require_special: false,
        }
    }
}

impl Settings {
    /// Load settings from `config.toml` and the environment
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load settings from the given TOML file and the environment.
    /// A missing file is not an error; the other sources still apply.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let settings: Settings = Self::figment(path.as_ref()).extract()?;
        settings.validate()?;
        Ok(settings)
    }

    fn figment(path: &Path) -> Figment {
        let mut figment =
            Figment::from(Serialized::defaults(Settings::default())).merge(Toml::file(path));

        // Secrets are read verbatim: figment's Env provider would turn a
        // numeric secret into an integer and drop leading zeros.
        if let Ok(secret) = std::env::var(SHARED_SECRET_VAR) {
            figment = figment.merge(Serialized::default(SECRET_KEY_PATH, secret));
        }
        figment = figment.merge(
            Env::prefixed(ENV_PREFIX)
                .ignore(&["AUTH__JWT_SECRET"])
                .split("__"),
        );
        if let Ok(secret) = std::env::var(format!("{ENV_PREFIX}AUTH__JWT_SECRET")) {
            figment = figment.merge(Serialized::default(SECRET_KEY_PATH, secret));
        }
        figment
    }

    /// Check invariants that the type system does not
    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.is_empty() {
            bail!("auth.jwt_secret must be set (SECRET_KEY or SANTHE_AUTH__JWT_SECRET)");
        }
        if self.auth.token_ttl_secs == 0 {
            bail!("auth.token_ttl_secs must be greater than zero");
        }
        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&self.auth.bcrypt_cost) {
            bail!("auth.bcrypt_cost must be between {MIN_BCRYPT_COST} and {MAX_BCRYPT_COST}");
        }
        if !LOG_LEVELS.contains(&self.log_level.to_ascii_lowercase().as_str()) {
            bail!("log_level must be one of {LOG_LEVELS:?}");
        }
        if self.password_requirements.min_length < 4 {
            bail!("password_requirements.min_length must be at least 4");
        }
        Ok(())
    }
}
