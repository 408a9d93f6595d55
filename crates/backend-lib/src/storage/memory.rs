//! In-memory store backed by `DashMap`, used for development and tests.
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::{mapref::entry::Entry, DashMap};

use super::{CredentialStore, SessionStore, StoreError};
use crate::auth::RefreshSession;
use crate::user::{NewUser, User};

/// Users keyed by email, sessions keyed by token
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    users: Arc<DashMap<String, User>>,
    sessions: Arc<DashMap<String, RefreshSession>>,
    last_id: Arc<AtomicI64>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions, stale ones included
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        match self.users.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict(format!(
                "email {} already registered",
                user.email
            ))),
            Entry::Vacant(slot) => {
                let id = self.last_id.fetch_add(1, Ordering::SeqCst) + 1;
                let user = user.into_user(id, Utc::now());
                slot.insert(user.clone());
                Ok(user)
            },
        }
    }

    async fn get_by_credentials(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<User, StoreError> {
        self.users
            .get(email)
            .filter(|user| user.password_hash == password_hash)
            .map(|user| user.value().clone())
            .ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn create_session(&self, session: RefreshSession) -> Result<(), StoreError> {
        match self.sessions.entry(session.token.clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict("refresh token collision".to_string())),
            Entry::Vacant(slot) => {
                slot.insert(session);
                Ok(())
            },
        }
    }

    async fn get_session(&self, token: &str) -> Result<RefreshSession, StoreError> {
        self.sessions
            .get(token)
            .map(|session| session.value().clone())
            .ok_or(StoreError::NotFound)
    }

    async fn take_session(&self, token: &str) -> Result<RefreshSession, StoreError> {
        self.sessions
            .remove(token)
            .map(|(_, session)| session)
            .ok_or(StoreError::NotFound)
    }
}
