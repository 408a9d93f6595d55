// ============================
// crates/backend-lib/src/storage/flat_file.rs
// ============================
//! Flat-file implementation of the credential and session stores.
//!
//! Layout:
//! ```text
//! root/
//! ├── users/      one JSON file per user, named by sha256(email)
//! └── sessions/   one JSON file per refresh session, named by sha256(token)
//! ```
//! Records are written to a temporary file first and then published with a
//! hard link (users, fails if the email exists) or a rename (sessions).
use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicI64, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use chrono::Utc;
use sha2::{Digest, Sha256};
use tokio::fs as tokio_fs;
use tracing::{debug, warn};

use super::{CredentialStore, SessionStore, StoreError};
use crate::auth::RefreshSession;
use crate::user::{NewUser, User};

const USERS_DIR: &str = "users";
const SESSIONS_DIR: &str = "sessions";

/// Flat-file store rooted at a data directory
#[derive(Debug, Clone)]
pub struct FlatFileStorage {
    root: PathBuf,
    last_id: Arc<AtomicI64>,
}

impl FlatFileStorage {
    /// Open (or create) a store under `root`, resuming id assignment after
    /// the highest id already on disk.
    pub fn new<P: AsRef<Path>>(root: P) -> anyhow::Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join(USERS_DIR))?;
        fs::create_dir_all(root.join(SESSIONS_DIR))?;

        let last_id = highest_user_id(&root.join(USERS_DIR))?;
        debug!(root = %root.display(), last_id, "flat-file store opened");

        Ok(Self {
            root,
            last_id: Arc::new(AtomicI64::new(last_id)),
        })
    }

    fn user_path(&self, email: &str) -> PathBuf {
        self.root
            .join(USERS_DIR)
            .join(format!("{}.json", record_key(email)))
    }

    fn session_path(&self, token: &str) -> PathBuf {
        self.root
            .join(SESSIONS_DIR)
            .join(format!("{}.json", record_key(token)))
    }

    async fn read_session(&self, path: &Path) -> Result<RefreshSession, StoreError> {
        let content = tokio_fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// File name for a record key. Hashing keeps client-supplied strings out of paths.
fn record_key(value: &str) -> String {
    hex::encode(Sha256::digest(value.as_bytes()))
}

fn highest_user_id(dir: &Path) -> anyhow::Result<i64> {
    let mut highest = 0;
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }
        let user: User = serde_json::from_str(&fs::read_to_string(&path)?)?;
        highest = highest.max(user.id);
    }
    Ok(highest)
}

#[async_trait]
impl CredentialStore for FlatFileStorage {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let path = self.user_path(&user.email);
        if tokio_fs::try_exists(&path).await? {
            return Err(StoreError::Conflict(format!(
                "email {} already registered",
                user.email
            )));
        }

        let id = self.last_id.fetch_add(1, Ordering::SeqCst) + 1;
        let user = user.into_user(id, Utc::now());
        let tmp = path.with_extension(format!("{id}.tmp"));
        tokio_fs::write(&tmp, serde_json::to_vec_pretty(&user)?).await?;

        // hard_link refuses to overwrite, so a concurrent sign-up for the same
        // email loses here
        let published = tokio_fs::hard_link(&tmp, &path).await;
        if let Err(e) = tokio_fs::remove_file(&tmp).await {
            warn!(error = %e, path = %tmp.display(), "failed to remove temporary user file");
        }
        match published {
            Ok(()) => Ok(user),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(StoreError::Conflict(format!(
                "email {} already registered",
                user.email
            ))),
            Err(e) => Err(StoreError::Backend(e.to_string())),
        }
    }

    async fn get_by_credentials(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<User, StoreError> {
        let content = tokio_fs::read_to_string(self.user_path(email)).await?;
        let user: User = serde_json::from_str(&content)?;
        if user.password_hash != password_hash {
            return Err(StoreError::NotFound);
        }
        Ok(user)
    }
}

#[async_trait]
impl SessionStore for FlatFileStorage {
    async fn create_session(&self, session: RefreshSession) -> Result<(), StoreError> {
        let path = self.session_path(&session.token);
        let tmp = path.with_extension("tmp");
        tokio_fs::write(&tmp, serde_json::to_vec_pretty(&session)?).await?;
        tokio_fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn get_session(&self, token: &str) -> Result<RefreshSession, StoreError> {
        self.read_session(&self.session_path(token)).await
    }

    async fn take_session(&self, token: &str) -> Result<RefreshSession, StoreError> {
        let path = self.session_path(token);
        let session = self.read_session(&path).await?;
        // only one remover wins; the others see NotFound
        tokio_fs::remove_file(&path).await?;
        Ok(session)
    }
}
