// crates/backend-lib/src/error.rs

//! Central error type + Axum integration.
use accounts_common::{ErrorDetail, ErrorResponse};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::storage::StoreError;
use crate::validation::ValidationError;

/// Application error types with error codes and context
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Credential lookup miss. Covers both an unknown email and a wrong password.
    #[error("User not found")]
    UserNotFound,

    #[error("Token invalid: {0}")]
    TokenInvalid(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("Refresh session not found")]
    SessionNotFound,

    #[error("Refresh session expired")]
    SessionExpired,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Upstream failure: {0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result alias used throughout the crate
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::UserNotFound => StatusCode::BAD_REQUEST,
            AppError::TokenInvalid(_)
            | AppError::TokenExpired
            | AppError::SessionNotFound
            | AppError::SessionExpired => StatusCode::UNAUTHORIZED,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VAL_001",
            AppError::UserNotFound => "AUTH_001",
            AppError::TokenInvalid(_) => "AUTH_002",
            AppError::TokenExpired => "AUTH_003",
            AppError::SessionNotFound => "AUTH_004",
            AppError::SessionExpired => "AUTH_005",
            AppError::Conflict(_) => "USER_001",
            AppError::Upstream(_) => "UP_001",
            AppError::Internal(_) => "INT_001",
        }
    }

    /// Get a sanitized message suitable for production use
    pub fn sanitized_message(&self) -> String {
        match self {
            AppError::Validation(msg) => msg.clone(),
            AppError::UserNotFound => "Invalid email or password".to_string(),
            AppError::TokenInvalid(_) | AppError::TokenExpired => {
                "Authentication required".to_string()
            },
            AppError::SessionNotFound | AppError::SessionExpired => {
                "Session is no longer valid, please sign in again".to_string()
            },
            AppError::Conflict(_) => "Account could not be created".to_string(),
            AppError::Upstream(_) => "A dependency failed, please retry later".to_string(),
            AppError::Internal(_) => "An internal server error occurred".to_string(),
        }
    }

    /// Whether the error was caused by the caller rather than by the service
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "request failed");
        } else {
            tracing::debug!(code = self.error_code(), error = %self, "request rejected");
        }

        // Use detailed messages in development, sanitized in production.
        // `UserNotFound` is always sanitized so responses never reveal whether an email exists.
        let message = if cfg!(debug_assertions) && !matches!(self, AppError::UserNotFound) {
            self.to_string()
        } else {
            self.sanitized_message()
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message,
            },
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => AppError::Conflict(msg),
            StoreError::NotFound => AppError::Upstream("record not found".to_string()),
            StoreError::Backend(msg) => AppError::Upstream(msg),
        }
    }
}

impl From<tokio::time::error::Elapsed> for AppError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        AppError::Upstream("call deadline exceeded".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use http_body_util::BodyExt;

    #[test]
    fn test_app_error_display() {
        let err = AppError::TokenInvalid("bad signature".to_string());
        assert_eq!(err.to_string(), "Token invalid: bad signature");
        assert_eq!(AppError::SessionExpired.to_string(), "Refresh session expired");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(AppError::UserNotFound.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::TokenExpired.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::SessionNotFound.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::Conflict("dup".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Upstream("db down".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert!(AppError::UserNotFound.is_client_error());
        assert!(!AppError::Internal("x".into()).is_client_error());
    }

    #[test]
    fn test_store_error_conversion() {
        let err: AppError = StoreError::Conflict("email taken".into()).into();
        assert!(matches!(err, AppError::Conflict(_)));

        let err: AppError = StoreError::Backend("io".into()).into();
        assert!(matches!(err, AppError::Upstream(_)));
    }

    #[tokio::test]
    async fn test_user_not_found_body_is_generic() {
        let response = AppError::UserNotFound.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.error.code, "AUTH_001");
        assert_eq!(body.error.message, "Invalid email or password");
    }

    #[tokio::test]
    async fn test_error_serialization() {
        let response = AppError::TokenExpired.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response
            .headers()
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap()
            .contains("application/json"));
    }
}
