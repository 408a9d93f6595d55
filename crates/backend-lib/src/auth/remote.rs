// ============================
// crates/backend-lib/src/auth/remote.rs
// ============================
//! Delegated signer: forwards every token operation to a remote token
//! service over gRPC and treats its answers as authoritative.
use std::fmt;
use std::time::Duration;

use accounts_common::UserId;
use async_trait::async_trait;
use tokio::time::timeout;
use tonic::{transport::Endpoint, Code, Request, Status};
use tracing::warn;

use super::proto::{TokenRequest, TokenServiceClient, Tokens, UserData};
use super::provider::{TokenPair, TokenProvider};
use crate::error::{AppError, AppResult};

/// Remote procedures, used to pick the local error kind for a failed call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteCall {
    ParseToken,
    GenerateToken,
    RefreshToken,
}

impl fmt::Display for RemoteCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ParseToken => "ParseToken",
            Self::GenerateToken => "GenerateToken",
            Self::RefreshToken => "RefreshToken",
        })
    }
}

/// Translate a remote status into the error kinds the local signer uses.
/// Only `Unauthenticated` is meaningful to callers; everything else is an
/// upstream failure.
pub fn map_status(call: RemoteCall, status: &Status) -> AppError {
    match (status.code(), call) {
        (Code::Unauthenticated, RemoteCall::RefreshToken) => AppError::SessionExpired,
        (Code::Unauthenticated, _) => AppError::TokenInvalid(status.message().to_string()),
        (code, _) => AppError::Upstream(format!(
            "{call} failed with {code:?}: {}",
            status.message()
        )),
    }
}

/// Token provider backed by a long-lived gRPC channel
#[derive(Debug, Clone)]
pub struct RemoteSigner {
    client: TokenServiceClient,
    call_timeout: Duration,
}

impl RemoteSigner {
    /// Build the channel once. The connection is established on first use and
    /// re-established by the channel if it drops.
    pub fn connect_lazy(endpoint: &str, call_timeout: Duration) -> AppResult<Self> {
        let channel = Endpoint::from_shared(endpoint.to_string())
            .map_err(|e| AppError::Internal(format!("invalid token service endpoint: {e}")))?
            .connect_timeout(call_timeout)
            .timeout(call_timeout)
            .connect_lazy();

        Ok(Self {
            client: TokenServiceClient::new(channel),
            call_timeout,
        })
    }

    fn request<T>(&self, message: T) -> Request<T> {
        let mut request = Request::new(message);
        request.set_timeout(self.call_timeout);
        request
    }

    fn failed(&self, call: RemoteCall, status: Status) -> AppError {
        let err = map_status(call, &status);
        if matches!(err, AppError::Upstream(_)) {
            warn!(%call, code = ?status.code(), "token service call failed");
        }
        err
    }
}

impl From<Tokens> for TokenPair {
    fn from(tokens: Tokens) -> Self {
        TokenPair {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        }
    }
}

#[async_trait]
impl TokenProvider for RemoteSigner {
    async fn issue_pair(&self, user_id: UserId) -> AppResult<TokenPair> {
        let mut client = self.client.clone();
        let request = self.request(UserData { id: user_id });
        timeout(self.call_timeout, client.generate_token(request))
            .await?
            .map(|response| response.into_inner().into())
            .map_err(|status| self.failed(RemoteCall::GenerateToken, status))
    }

    async fn validate(&self, access_token: &str) -> AppResult<UserId> {
        let mut client = self.client.clone();
        let request = self.request(TokenRequest {
            token: access_token.to_string(),
        });
        timeout(self.call_timeout, client.parse_token(request))
            .await?
            .map(|response| response.into_inner().id)
            .map_err(|status| self.failed(RemoteCall::ParseToken, status))
    }

    async fn refresh(&self, refresh_token: &str) -> AppResult<TokenPair> {
        let mut client = self.client.clone();
        let request = self.request(TokenRequest {
            token: refresh_token.to_string(),
        });
        timeout(self.call_timeout, client.refresh_token(request))
            .await?
            .map(|response| response.into_inner().into())
            .map_err(|status| self.failed(RemoteCall::RefreshToken, status))
    }
}
