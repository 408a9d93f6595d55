// ============================
// accounts-backend-lib/src/lib.rs
// ============================
//! Core functionality for the accounts server: sign-up, sign-in, access
//! tokens and refresh-session rotation behind an axum router.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod router;
pub mod storage;
pub mod user;
pub mod validation;

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use crate::auth::{build_hasher, AuthService, DefaultAuth, LocalSigner, RemoteSigner, TokenProvider};
use crate::config::{Settings, StorageBackend, TokenProviderKind};
use crate::storage::{CredentialStore, FlatFileStorage, MemoryStore, SessionStore};
use crate::validation::InputValidator;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Authentication service
    pub auth: Arc<dyn AuthService>,
    /// Settings the server was started with
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Create a new application state around an existing auth service
    pub fn new(auth: Arc<dyn AuthService>, settings: Settings) -> Self {
        Self {
            auth,
            settings: Arc::new(settings),
        }
    }

    /// Wire storage, hasher and token provider from settings.
    ///
    /// Must run inside a tokio runtime when the remote provider is selected.
    pub fn from_settings(settings: Settings) -> anyhow::Result<Self> {
        settings.validate()?;
        if settings.uses_default_secrets() {
            warn!("running with a built-in secret or salt; override it before deploying");
        }

        let call_timeout = settings.call_timeout();

        let (credentials, sessions): (Arc<dyn CredentialStore>, Arc<dyn SessionStore>) =
            match settings.storage.backend {
                StorageBackend::Memory => {
                    let store = MemoryStore::new();
                    (Arc::new(store.clone()), Arc::new(store))
                },
                StorageBackend::FlatFile => {
                    let store = FlatFileStorage::new(&settings.storage.path).with_context(|| {
                        format!("opening data directory {}", settings.storage.path.display())
                    })?;
                    (Arc::new(store.clone()), Arc::new(store))
                },
            };

        let hasher = build_hasher(settings.password.algorithm, &settings.password.salt)?;

        let tokens: Arc<dyn TokenProvider> = match settings.tokens.provider {
            TokenProviderKind::Local => Arc::new(
                LocalSigner::new(settings.tokens.hmac_secret.as_bytes(), sessions)
                    .with_access_ttl(settings.access_ttl())
                    .with_refresh_ttl(settings.refresh_ttl())
                    .with_single_use_refresh(settings.tokens.single_use_refresh)
                    .with_call_timeout(call_timeout),
            ),
            TokenProviderKind::Remote => {
                let endpoint = settings
                    .tokens
                    .remote_endpoint
                    .as_deref()
                    .context("tokens.remote_endpoint is not set")?;
                Arc::new(RemoteSigner::connect_lazy(endpoint, call_timeout)?)
            },
        };

        let validator = InputValidator::new(settings.password.min_length)?;
        let auth = DefaultAuth::new(credentials, hasher, tokens, validator)
            .with_call_timeout(call_timeout);

        info!(
            storage = ?settings.storage.backend,
            provider = ?settings.tokens.provider,
            algorithm = ?settings.password.algorithm,
            "application state ready"
        );

        Ok(Self::new(Arc::new(auth), settings))
    }
}
