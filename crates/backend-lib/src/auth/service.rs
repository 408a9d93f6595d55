// =============
// crates/backend-lib/src/auth/service.rs
// =============
//! This module defines the `AuthService` trait, the operations the HTTP layer consumes
use accounts_common::{SignInRequest, SignUpRequest, UserId};
use async_trait::async_trait;

use super::provider::TokenPair;
use crate::error::AppResult;
use crate::user::User;

#[async_trait]
pub trait AuthService: Send + Sync {
    /// Validate, hash and persist a new account
    async fn sign_up(&self, input: SignUpRequest) -> AppResult<User>;

    /// Check credentials and issue a token pair
    async fn sign_in(&self, input: SignInRequest) -> AppResult<TokenPair>;

    /// Resolve a bearer token to its user id
    async fn validate_access_token(&self, token: &str) -> AppResult<UserId>;

    /// Exchange a refresh token for a new pair
    async fn refresh_tokens(&self, refresh_token: &str) -> AppResult<TokenPair>;
}
