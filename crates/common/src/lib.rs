// ================
// common/src/lib.rs
// ================
//! Common types and structures
//! used for communication between account clients and the server.
//! This module defines the JSON bodies of the `/auth` and `/users` endpoints.

use serde::{Deserialize, Serialize};

/// Numeric user identifier assigned by the credential store
pub type UserId = i64;

/// Name of the cookie carrying the refresh token
pub const REFRESH_COOKIE: &str = "refresh-token";

/// Body of `POST /auth/sign-up`
/// # Fields
/// * `name` - Display name (min 2 chars)
/// * `email` - Unique, well-formed email address
/// * `password` - Plaintext password, hashed before it is stored
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SignUpRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Body of `POST /auth/sign-in`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// Returned by sign-in and refresh. The refresh token travels in an
/// HTTP-only cookie and is never part of the body.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TokenResponse {
    pub access_token: String,
}

/// Returned by sign-up and `GET /users/me`
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserIdResponse {
    pub id: UserId,
}

/// Error envelope rendered for every failed request
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

/// Machine-readable code plus a human message
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_up_request_shape() {
        let req: SignUpRequest = serde_json::from_str(
            r#"{"name":"Ann","email":"ann@x.com","password":"secret1"}"#,
        )
        .unwrap();
        assert_eq!(req.name, "Ann");
        assert_eq!(req.email, "ann@x.com");
        assert_eq!(req.password, "secret1");
    }

    #[test]
    fn test_error_envelope_shape() {
        let body = serde_json::json!({
            "error": { "code": "AUTH_001", "message": "Invalid email or password" }
        });
        let parsed: ErrorResponse = serde_json::from_value(body).unwrap();
        assert_eq!(parsed.error.code, "AUTH_001");
    }
}
