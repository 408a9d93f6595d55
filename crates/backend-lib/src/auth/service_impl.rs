use std::sync::Arc;
use std::time::Duration;

use accounts_common::{SignInRequest, SignUpRequest, UserId};
use async_trait::async_trait;
use metrics::counter;
use tokio::time::timeout;
use tracing::{info, warn};
use zeroize::Zeroize;

use super::password::PasswordHasher;
use super::provider::{TokenPair, TokenProvider};
use super::AuthService;
use crate::error::{AppError, AppResult};
use crate::metrics::{AUTH_REFRESH, AUTH_SIGN_IN, AUTH_SIGN_UP, AUTH_TOKEN_REJECTED};
use crate::storage::{CredentialStore, StoreError};
use crate::user::{normalize_email, NewUser, User};
use crate::validation::InputValidator;

/// Default deadline for a single credential-store call
const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(5);

/// Composes the credential store, password hasher and token provider.
/// Holds no per-call state; every method can run concurrently.
pub struct DefaultAuth {
    credentials: Arc<dyn CredentialStore>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenProvider>,
    validator: InputValidator,
    call_timeout: Duration,
}

impl DefaultAuth {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn TokenProvider>,
        validator: InputValidator,
    ) -> Self {
        Self {
            credentials,
            hasher,
            tokens,
            validator,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    /// Deadline applied to every credential-store call
    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    /// Hash off the async workers and wipe the plaintext afterwards
    async fn hash_password(&self, mut plain: String) -> AppResult<String> {
        let hasher = Arc::clone(&self.hasher);
        tokio::task::spawn_blocking(move || {
            let digest = hasher.hash(&plain);
            plain.zeroize();
            digest
        })
        .await
        .map_err(|e| AppError::Internal(format!("hashing task failed: {e}")))?
    }
}

#[async_trait]
impl AuthService for DefaultAuth {
    async fn sign_up(&self, mut input: SignUpRequest) -> AppResult<User> {
        if let Err(e) = self.validator.validate_sign_up(&input) {
            input.password.zeroize();
            return Err(e.into());
        }

        let SignUpRequest {
            name,
            email,
            password,
        } = input;
        let password_hash = self.hash_password(password).await?;
        let new_user = NewUser {
            name: name.trim().to_string(),
            email: normalize_email(&email),
            password_hash,
        };

        let user = match timeout(self.call_timeout, self.credentials.create_user(new_user)).await? {
            Ok(user) => user,
            Err(StoreError::Conflict(msg)) => {
                info!("sign-up rejected: email already registered");
                return Err(AppError::Conflict(msg));
            },
            Err(e) => return Err(e.into()),
        };

        counter!(AUTH_SIGN_UP).increment(1);
        info!(user_id = user.id, "user registered");
        Ok(user)
    }

    async fn sign_in(&self, mut input: SignInRequest) -> AppResult<TokenPair> {
        if let Err(e) = self.validator.validate_sign_in(&input) {
            input.password.zeroize();
            return Err(e.into());
        }

        let email = normalize_email(&input.email);
        let password_hash = self.hash_password(input.password).await?;

        let user = timeout(
            self.call_timeout,
            self.credentials.get_by_credentials(&email, &password_hash),
        )
        .await?
        .map_err(|e| match e {
            StoreError::NotFound => AppError::UserNotFound,
            other => other.into(),
        });

        let user = match user {
            Ok(user) => user,
            Err(e) => {
                counter!(AUTH_SIGN_IN, "outcome" => "rejected").increment(1);
                if !e.is_client_error() {
                    warn!(error = %e, "credential lookup failed");
                }
                return Err(e);
            },
        };

        let pair = self.tokens.issue_pair(user.id).await?;
        counter!(AUTH_SIGN_IN, "outcome" => "success").increment(1);
        info!(user_id = user.id, "sign-in succeeded");
        Ok(pair)
    }

    async fn validate_access_token(&self, token: &str) -> AppResult<UserId> {
        self.tokens.validate(token).await.inspect_err(|_| {
            counter!(AUTH_TOKEN_REJECTED).increment(1);
        })
    }

    async fn refresh_tokens(&self, refresh_token: &str) -> AppResult<TokenPair> {
        let pair = self.tokens.refresh(refresh_token).await?;
        counter!(AUTH_REFRESH).increment(1);
        Ok(pair)
    }
}
