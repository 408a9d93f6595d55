// ============================
// crates/backend-lib/src/config.rs
// ============================
//! Configuration management.
//!
//! Sources, later ones winning: built-in defaults, a TOML file, then
//! `ACCOUNTS_`-prefixed environment variables (`__` separates nested keys,
//! e.g. `ACCOUNTS_TOKENS__HMAC_SECRET`).
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::auth::{HashAlgorithm, ACCESS_TOKEN_TTL_SECS, MIN_PASSWORD_LENGTH, REFRESH_SESSION_TTL_SECS};

/// Default config file looked up by `Settings::load`
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "ACCOUNTS_";

/// Placeholder secrets; the server warns when they are still in use
pub const DEFAULT_HMAC_SECRET: &str = "accounts-default-hmac-secret-change-me";
pub const DEFAULT_PASSWORD_SALT: &str = "accounts-default-salt-change-me";

const MIN_HMAC_SECRET_LENGTH: usize = 32;
const MAX_TOKEN_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;
const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Log level used when `RUST_LOG` is unset
    pub log_level: String,
    /// Log output format
    pub log_format: LogFormat,
    /// Per-request deadline enforced by the HTTP layer
    pub request_timeout_secs: u64,
    /// How long in-flight requests may run after a shutdown signal
    pub shutdown_grace_secs: u64,
    pub storage: StorageSettings,
    pub password: PasswordSettings,
    pub tokens: TokenSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Where users and refresh sessions live
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageSettings {
    pub backend: StorageBackend,
    /// Data directory (flat-file backend only)
    pub path: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    Memory,
    FlatFile,
}

/// Password hashing and policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PasswordSettings {
    pub algorithm: HashAlgorithm,
    /// Global salt shared by every stored hash
    pub salt: String,
    /// Minimum password length
    pub min_length: usize,
}

/// Token issuance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenSettings {
    pub provider: TokenProviderKind,
    /// HMAC secret (local provider)
    pub hmac_secret: String,
    /// Access token lifetime in seconds (local provider)
    pub access_ttl_secs: u64,
    /// Refresh session lifetime in seconds (local provider)
    pub refresh_ttl_secs: u64,
    /// Invalidate a refresh token when it is redeemed (local provider)
    pub single_use_refresh: bool,
    /// Deadline for any store or remote call, in milliseconds
    pub call_timeout_ms: u64,
    /// gRPC endpoint of the token service (remote provider)
    pub remote_endpoint: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenProviderKind {
    Local,
    Remote,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            request_timeout_secs: 15,
            shutdown_grace_secs: 15,
            storage: StorageSettings::default(),
            password: PasswordSettings::default(),
            tokens: TokenSettings::default(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            path: PathBuf::from("data"),
        }
    }
}

impl Default for PasswordSettings {
    fn default() -> Self {
        Self {
            algorithm: HashAlgorithm::Sha256,
            salt: DEFAULT_PASSWORD_SALT.to_string(),
            min_length: MIN_PASSWORD_LENGTH,
        }
    }
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            provider: TokenProviderKind::Local,
            hmac_secret: DEFAULT_HMAC_SECRET.to_string(),
            access_ttl_secs: ACCESS_TOKEN_TTL_SECS,
            refresh_ttl_secs: REFRESH_SESSION_TTL_SECS,
            single_use_refresh: true,
            call_timeout_ms: 5_000,
            remote_endpoint: None,
        }
    }
}

impl Settings {
    /// Load from `config.toml` (if present) and the environment
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load from an explicit TOML file (if present) and the environment
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let settings: Settings = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values the server cannot run with
    pub fn validate(&self) -> Result<()> {
        if !VALID_LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            bail!("invalid log level: {}", self.log_level);
        }
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be positive");
        }
        if self.password.min_length < MIN_PASSWORD_LENGTH {
            bail!("password.min_length must be at least {MIN_PASSWORD_LENGTH}");
        }
        if self.password.salt.is_empty() {
            bail!("password.salt must not be empty");
        }
        if self.tokens.call_timeout_ms == 0 {
            bail!("tokens.call_timeout_ms must be positive");
        }
        match self.tokens.provider {
            TokenProviderKind::Local => {
                if self.tokens.hmac_secret.len() < MIN_HMAC_SECRET_LENGTH {
                    bail!("tokens.hmac_secret must be at least {MIN_HMAC_SECRET_LENGTH} bytes");
                }
                for ttl in [self.tokens.access_ttl_secs, self.tokens.refresh_ttl_secs] {
                    if ttl == 0 || ttl > MAX_TOKEN_TTL_SECS {
                        bail!("token lifetimes must be between 1 and {MAX_TOKEN_TTL_SECS} seconds");
                    }
                }
            },
            TokenProviderKind::Remote => {
                if self.tokens.remote_endpoint.as_deref().map_or(true, str::is_empty) {
                    bail!("tokens.remote_endpoint is required for the remote provider");
                }
            },
        }
        Ok(())
    }

    /// Per-request deadline
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Grace period for shutdown
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }

    /// Deadline for store and remote calls
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.tokens.call_timeout_ms)
    }

    /// Access token lifetime
    pub fn access_ttl(&self) -> chrono::Duration {
        ttl(self.tokens.access_ttl_secs)
    }

    /// Refresh session lifetime
    pub fn refresh_ttl(&self) -> chrono::Duration {
        ttl(self.tokens.refresh_ttl_secs)
    }

    /// Whether a placeholder secret or salt is still configured
    pub fn uses_default_secrets(&self) -> bool {
        self.password.salt == DEFAULT_PASSWORD_SALT
            || (self.tokens.provider == TokenProviderKind::Local
                && self.tokens.hmac_secret == DEFAULT_HMAC_SECRET)
    }
}

fn ttl(secs: u64) -> chrono::Duration {
    chrono::Duration::seconds(secs.min(MAX_TOKEN_TTL_SECS) as i64)
}
