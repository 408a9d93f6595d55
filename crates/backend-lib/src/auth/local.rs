// ============================
// crates/backend-lib/src/auth/local.rs
// ============================
//! In-process token signer: HMAC-signed JWT access tokens plus random
//! refresh tokens tracked in a `SessionStore`.
use std::sync::Arc;
use std::time::Duration as StdDuration;

use accounts_common::UserId;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::provider::{TokenPair, TokenProvider};
use super::session::{RefreshSession, ACCESS_TOKEN_TTL_SECS, REFRESH_SESSION_TTL_SECS};
use super::token_generator::generate_refresh_token;
use crate::error::{AppError, AppResult};
use crate::storage::{SessionStore, StoreError};

/// Default deadline for a single session-store call
const DEFAULT_CALL_TIMEOUT: StdDuration = StdDuration::from_secs(5);

/// Claims carried by an access token
#[derive(Debug, Serialize, Deserialize)]
struct AccessClaims {
    /// Subject (user id as a decimal string)
    sub: String,
    /// Issued at (Unix timestamp)
    iat: i64,
    /// Expiry (Unix timestamp)
    exp: i64,
}

/// Signs and verifies tokens with a process-held HMAC secret
pub struct LocalSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
    single_use_refresh: bool,
    call_timeout: StdDuration,
    sessions: Arc<dyn SessionStore>,
}

impl LocalSigner {
    /// Create a signer with the default lifetimes (15h access, 30d refresh)
    /// and single-use refresh rotation.
    pub fn new(secret: &[u8], sessions: Arc<dyn SessionStore>) -> Self {
        // Only the HMAC family is accepted; anything else in the header is
        // rejected before the signature is looked at.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            access_ttl: Duration::seconds(ACCESS_TOKEN_TTL_SECS as i64),
            refresh_ttl: Duration::seconds(REFRESH_SESSION_TTL_SECS as i64),
            single_use_refresh: true,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            sessions,
        }
    }

    /// Override the access token lifetime
    pub fn with_access_ttl(mut self, ttl: Duration) -> Self {
        self.access_ttl = ttl;
        self
    }

    /// Override the refresh session lifetime
    pub fn with_refresh_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_ttl = ttl;
        self
    }

    /// When false, a redeemed refresh token stays usable until it expires
    pub fn with_single_use_refresh(mut self, single_use: bool) -> Self {
        self.single_use_refresh = single_use;
        self
    }

    /// Deadline applied to every session-store call
    pub fn with_call_timeout(mut self, call_timeout: StdDuration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    fn sign_access_token(&self, user_id: UserId) -> AppResult<String> {
        let now = Utc::now();
        let claims = AccessClaims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + self.access_ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("failed to sign access token: {e}")))
    }
}

impl LocalSigner {
    /// Put back a session taken for a rotation that could not complete, so the
    /// caller can retry with the same refresh token.
    async fn restore_session(&self, session: RefreshSession) {
        let user_id = session.user_id;
        match timeout(self.call_timeout, self.sessions.create_session(session)).await {
            Ok(Ok(())) => warn!(user_id, "rotation failed, refresh session restored"),
            Ok(Err(e)) => warn!(user_id, error = %e, "rotation failed, refresh session lost"),
            Err(_) => warn!(user_id, "rotation failed, restoring refresh session timed out"),
        }
    }
}

fn classify_jwt_error(err: jsonwebtoken::errors::Error) -> AppError {
    match err.kind() {
        ErrorKind::ExpiredSignature => AppError::TokenExpired,
        ErrorKind::InvalidAlgorithm => {
            AppError::TokenInvalid("unexpected signing algorithm".to_string())
        },
        ErrorKind::InvalidSignature => AppError::TokenInvalid("signature mismatch".to_string()),
        _ => AppError::TokenInvalid(err.to_string()),
    }
}

#[async_trait]
impl TokenProvider for LocalSigner {
    async fn issue_pair(&self, user_id: UserId) -> AppResult<TokenPair> {
        let access_token = self.sign_access_token(user_id)?;
        let refresh_token = generate_refresh_token()?;

        let session = RefreshSession::new(user_id, refresh_token.clone(), self.refresh_ttl);
        timeout(self.call_timeout, self.sessions.create_session(session)).await??;

        debug!(user_id, "issued token pair");
        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    async fn validate(&self, access_token: &str) -> AppResult<UserId> {
        let claims = decode::<AccessClaims>(access_token, &self.decoding_key, &self.validation)
            .map_err(classify_jwt_error)?
            .claims;

        claims
            .sub
            .parse::<UserId>()
            .map_err(|_| AppError::TokenInvalid("subject is not a user id".to_string()))
    }

    async fn refresh(&self, refresh_token: &str) -> AppResult<TokenPair> {
        let lookup = if self.single_use_refresh {
            timeout(self.call_timeout, self.sessions.take_session(refresh_token)).await?
        } else {
            timeout(self.call_timeout, self.sessions.get_session(refresh_token)).await?
        };

        let session = lookup.map_err(|e| match e {
            StoreError::NotFound => AppError::SessionNotFound,
            other => other.into(),
        })?;

        if session.is_expired() {
            return Err(AppError::SessionExpired);
        }

        info!(user_id = session.user_id, "refresh session redeemed");
        match self.issue_pair(session.user_id).await {
            Ok(pair) => Ok(pair),
            Err(e) if self.single_use_refresh => {
                self.restore_session(session).await;
                Err(e)
            },
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
    use std::sync::atomic::{AtomicBool, Ordering};

    const SECRET: &[u8] = b"test-secret-hmac-key-min-32-chars!!";

    fn signer(store: &MemoryStore) -> LocalSigner {
        LocalSigner::new(SECRET, Arc::new(store.clone()))
    }

    fn forge(header: &str, payload: &str) -> String {
        format!(
            "{}.{}.{}",
            URL_SAFE_NO_PAD.encode(header),
            URL_SAFE_NO_PAD.encode(payload),
            URL_SAFE_NO_PAD.encode("not-a-signature")
        )
    }

    fn future_exp() -> i64 {
        (Utc::now() + Duration::hours(1)).timestamp()
    }

    #[tokio::test]
    async fn test_issue_and_validate() {
        let store = MemoryStore::new();
        let signer = signer(&store);

        let pair = signer.issue_pair(42).await.unwrap();
        assert_eq!(signer.validate(&pair.access_token).await.unwrap(), 42);
        assert_eq!(pair.refresh_token.len(), 64);

        let session = store.get_session(&pair.refresh_token).await.unwrap();
        assert_eq!(session.user_id, 42);
        assert!(session.expires_at > Utc::now() + Duration::days(29));
    }

    #[tokio::test]
    async fn test_expired_access_token() {
        let store = MemoryStore::new();
        let signer = signer(&store).with_access_ttl(Duration::seconds(-60));

        let pair = signer.issue_pair(1).await.unwrap();
        assert!(matches!(
            signer.validate(&pair.access_token).await,
            Err(AppError::TokenExpired)
        ));
    }

    #[tokio::test]
    async fn test_wrong_secret_and_tampering() {
        let store = MemoryStore::new();
        let pair = signer(&store).issue_pair(1).await.unwrap();

        let other = LocalSigner::new(b"another-secret-another-secret-xx", Arc::new(store.clone()));
        assert!(matches!(
            other.validate(&pair.access_token).await,
            Err(AppError::TokenInvalid(_))
        ));

        let mut tampered = pair.access_token.clone();
        tampered.push('x');
        assert!(matches!(
            signer(&store).validate(&tampered).await,
            Err(AppError::TokenInvalid(_))
        ));

        assert!(matches!(
            signer(&store).validate("invalid.token.here").await,
            Err(AppError::TokenInvalid(_))
        ));
    }

    #[tokio::test]
    async fn test_rejects_foreign_algorithms() {
        let store = MemoryStore::new();
        let signer = signer(&store);
        let payload = format!(r#"{{"sub":"1","iat":0,"exp":{}}}"#, future_exp());

        let rs256 = forge(r#"{"alg":"RS256","typ":"JWT"}"#, &payload);
        assert!(matches!(
            signer.validate(&rs256).await,
            Err(AppError::TokenInvalid(_))
        ));

        let none = forge(r#"{"alg":"none","typ":"JWT"}"#, &payload);
        assert!(matches!(
            signer.validate(&none).await,
            Err(AppError::TokenInvalid(_))
        ));
    }

    #[tokio::test]
    async fn test_accepts_other_hmac_variants() {
        let store = MemoryStore::new();
        let claims = AccessClaims {
            sub: "9".to_string(),
            iat: Utc::now().timestamp(),
            exp: future_exp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();
        assert_eq!(signer(&store).validate(&token).await.unwrap(), 9);
    }

    #[tokio::test]
    async fn test_subject_must_be_integer() {
        let store = MemoryStore::new();
        let key = EncodingKey::from_secret(SECRET);

        let claims = AccessClaims {
            sub: "alice".to_string(),
            iat: Utc::now().timestamp(),
            exp: future_exp(),
        };
        let token = encode(&Header::default(), &claims, &key).unwrap();
        assert!(matches!(
            signer(&store).validate(&token).await,
            Err(AppError::TokenInvalid(_))
        ));

        let no_subject = serde_json::json!({ "iat": 0, "exp": future_exp() });
        let token = encode(&Header::default(), &no_subject, &key).unwrap();
        assert!(matches!(
            signer(&store).validate(&token).await,
            Err(AppError::TokenInvalid(_))
        ));
    }

    #[tokio::test]
    async fn test_refresh_rotates_single_use() {
        let store = MemoryStore::new();
        let signer = signer(&store);

        let first = signer.issue_pair(5).await.unwrap();
        let second = signer.refresh(&first.refresh_token).await.unwrap();
        assert_ne!(first.refresh_token, second.refresh_token);
        assert_eq!(signer.validate(&second.access_token).await.unwrap(), 5);

        assert!(matches!(
            signer.refresh(&first.refresh_token).await,
            Err(AppError::SessionNotFound)
        ));
        assert!(signer.refresh(&second.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn test_refresh_without_revocation() {
        let store = MemoryStore::new();
        let signer = signer(&store).with_single_use_refresh(false);

        let first = signer.issue_pair(5).await.unwrap();
        signer.refresh(&first.refresh_token).await.unwrap();
        assert!(signer.refresh(&first.refresh_token).await.is_ok());
        assert_eq!(store.session_count(), 3);
    }

    /// Delegates to a `MemoryStore` but fails the next `create_session` on demand
    #[derive(Clone, Default)]
    struct FlakyStore {
        inner: MemoryStore,
        fail_next_create: Arc<AtomicBool>,
    }

    #[async_trait]
    impl SessionStore for FlakyStore {
        async fn create_session(&self, session: RefreshSession) -> Result<(), StoreError> {
            if self.fail_next_create.swap(false, Ordering::SeqCst) {
                return Err(StoreError::Backend("write failed".to_string()));
            }
            self.inner.create_session(session).await
        }

        async fn get_session(&self, token: &str) -> Result<RefreshSession, StoreError> {
            self.inner.get_session(token).await
        }

        async fn take_session(&self, token: &str) -> Result<RefreshSession, StoreError> {
            self.inner.take_session(token).await
        }
    }

    #[tokio::test]
    async fn test_failed_rotation_keeps_session() {
        let store = FlakyStore::default();
        let signer = LocalSigner::new(SECRET, Arc::new(store.clone()));

        let pair = signer.issue_pair(5).await.unwrap();
        store.fail_next_create.store(true, Ordering::SeqCst);
        assert!(matches!(
            signer.refresh(&pair.refresh_token).await,
            Err(AppError::Upstream(_))
        ));
        assert_eq!(store.inner.session_count(), 1);

        // Store recovered: the same refresh token still works, once
        let renewed = signer.refresh(&pair.refresh_token).await.unwrap();
        assert_eq!(signer.validate(&renewed.access_token).await.unwrap(), 5);
        assert!(matches!(
            signer.refresh(&pair.refresh_token).await,
            Err(AppError::SessionNotFound)
        ));
    }

    #[tokio::test]
    async fn test_refresh_expired_and_unknown() {
        let store = MemoryStore::new();
        let signer = signer(&store).with_refresh_ttl(Duration::days(-1));

        let pair = signer.issue_pair(5).await.unwrap();
        assert!(matches!(
            signer.refresh(&pair.refresh_token).await,
            Err(AppError::SessionExpired)
        ));
        assert!(matches!(
            signer.refresh("deadbeef").await,
            Err(AppError::SessionNotFound)
        ));
    }
}
