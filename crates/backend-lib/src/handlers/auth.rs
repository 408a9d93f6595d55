// ============================
// crates/backend-lib/src/handlers/auth.rs
// ============================
//! Account and token endpoints.
use accounts_common::{
    SignInRequest, SignUpRequest, TokenResponse, UserIdResponse, REFRESH_COOKIE,
};
use axum::{
    extract::State,
    http::{
        header::{COOKIE, SET_COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
    Extension, Json,
};

use crate::auth::TokenPair;
use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::AppState;

/// `POST /auth/sign-up`
pub async fn sign_up(
    State(state): State<AppState>,
    Json(input): Json<SignUpRequest>,
) -> AppResult<(StatusCode, Json<UserIdResponse>)> {
    let user = state.auth.sign_up(input).await?;
    Ok((StatusCode::CREATED, Json(UserIdResponse { id: user.id })))
}

/// `POST /auth/sign-in`
pub async fn sign_in(
    State(state): State<AppState>,
    Json(input): Json<SignInRequest>,
) -> AppResult<Response> {
    let pair = state.auth.sign_in(input).await?;
    token_response(&state, pair)
}

/// `GET /auth/refresh`, redeeming the refresh cookie
pub async fn refresh(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    let token = refresh_cookie(&headers).ok_or(AppError::SessionNotFound)?;
    let pair = state.auth.refresh_tokens(token).await?;
    token_response(&state, pair)
}

/// `GET /users/me`
pub async fn me(Extension(AuthUser(id)): Extension<AuthUser>) -> Json<UserIdResponse> {
    Json(UserIdResponse { id })
}

/// `GET /health`
pub async fn health() -> &'static str {
    "ok"
}

/// Access token in the body, refresh token in an HTTP-only cookie
fn token_response(state: &AppState, pair: TokenPair) -> AppResult<Response> {
    let cookie = refresh_cookie_header(&pair.refresh_token, state.settings.tokens.refresh_ttl_secs)?;
    let mut response = Json(TokenResponse {
        access_token: pair.access_token,
    })
    .into_response();
    response.headers_mut().insert(SET_COOKIE, cookie);
    Ok(response)
}

/// Build the `Set-Cookie` value for a refresh token
pub fn refresh_cookie_header(token: &str, max_age_secs: u64) -> AppResult<HeaderValue> {
    HeaderValue::from_str(&format!(
        "{REFRESH_COOKIE}={token}; HttpOnly; Path=/auth; SameSite=Strict; Max-Age={max_age_secs}"
    ))
    .map_err(|e| AppError::Internal(format!("unencodable refresh cookie: {e}")))
}

/// Find the refresh token among the request cookies
pub fn refresh_cookie(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == REFRESH_COOKIE)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(cookies: &[&str]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for cookie in cookies {
            map.append(COOKIE, HeaderValue::from_str(cookie).unwrap());
        }
        map
    }

    #[test]
    fn test_refresh_cookie_lookup() {
        assert_eq!(refresh_cookie(&headers(&["refresh-token=abc"])), Some("abc"));
        assert_eq!(
            refresh_cookie(&headers(&["theme=dark; refresh-token=abc; lang=en"])),
            Some("abc")
        );
        assert_eq!(
            refresh_cookie(&headers(&["theme=dark", "refresh-token=def"])),
            Some("def")
        );
        assert_eq!(refresh_cookie(&headers(&["refresh-token="])), None);
        assert_eq!(refresh_cookie(&headers(&["other-refresh-token=abc"])), None);
        assert_eq!(refresh_cookie(&HeaderMap::new()), None);
    }

    #[test]
    fn test_cookie_attributes() {
        let value = refresh_cookie_header("abc", 60).unwrap();
        assert_eq!(
            value.to_str().unwrap(),
            "refresh-token=abc; HttpOnly; Path=/auth; SameSite=Strict; Max-Age=60"
        );
        assert!(refresh_cookie_header("bad\ntoken", 60).is_err());
    }
}
