//! Bearer-token guard for protected routes.
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use accounts_common::UserId;
use tracing::debug;

use crate::{error::AppError, AppState};

const BEARER_PREFIX: &str = "Bearer ";

/// Authenticated caller, inserted into request extensions by `require_auth`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub UserId);

/// Pull the token out of an `Authorization: Bearer <token>` header value
pub fn bearer_token(header: &str) -> Option<&str> {
    let token = header.strip_prefix(BEARER_PREFIX)?.trim();
    (!token.is_empty()).then_some(token)
}

/// Reject the request unless it carries a valid access token
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(bearer_token)
        .ok_or_else(|| AppError::TokenInvalid("missing bearer token".to_string()))?;

    let user_id = state.auth.validate_access_token(token).await.inspect_err(|e| {
        debug!(error = %e, "access token rejected");
    })?;

    request.extensions_mut().insert(AuthUser(user_id));
    Ok(next.run(request).await)
}
