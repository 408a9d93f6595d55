// ============================
// crates/backend-lib/src/storage/mod.rs
// ============================
//! Storage abstraction for user credentials and refresh sessions.
//!
//! The core only talks to the two traits below. Each backend is responsible
//! for its own per-record atomicity; the core performs no locking.

mod flat_file;
mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::auth::RefreshSession;
use crate::user::{NewUser, User};

pub use flat_file::FlatFileStorage;
pub use memory::MemoryStore;

/// Failure reported by a store. `NotFound` is kept distinct so callers can
/// turn it into a domain error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            StoreError::NotFound
        } else {
            StoreError::Backend(err.to_string())
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Backend(format!("corrupt record: {err}"))
    }
}

/// Persists users and looks them up by credentials
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Insert a new user. Rejects a duplicate email with `StoreError::Conflict`.
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError>;

    /// Find the user whose email and password hash both match
    async fn get_by_credentials(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<User, StoreError>;
}

/// Persists refresh sessions keyed by their opaque token
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Store a freshly issued session
    async fn create_session(&self, session: RefreshSession) -> Result<(), StoreError>;

    /// Read a session without consuming it
    async fn get_session(&self, token: &str) -> Result<RefreshSession, StoreError>;

    /// Remove and return a session. At most one concurrent caller succeeds
    /// for a given token.
    async fn take_session(&self, token: &str) -> Result<RefreshSession, StoreError>;
}
