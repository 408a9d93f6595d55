//! Token issuance capability shared by the local and delegated signers.
use accounts_common::UserId;
use async_trait::async_trait;

use crate::error::AppResult;

/// Access token plus the refresh token that can renew it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Mints, validates and rotates tokens.
///
/// Implementations report failures with the same error kinds:
/// `TokenInvalid`/`TokenExpired` from `validate`, `SessionNotFound`/
/// `SessionExpired` from `refresh`, and `Upstream` for storage or network
/// failures.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Issue a fresh access/refresh pair for `user_id`
    async fn issue_pair(&self, user_id: UserId) -> AppResult<TokenPair>;

    /// Resolve an access token to the user id it was issued for
    async fn validate(&self, access_token: &str) -> AppResult<UserId>;

    /// Redeem a refresh token for a new pair
    async fn refresh(&self, refresh_token: &str) -> AppResult<TokenPair>;
}
