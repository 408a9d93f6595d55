// ============================
// crates/backend-lib/src/validation/mod.rs
// ============================
//! Input validation for sign-up and sign-in requests.
//!
//! `InputValidator` is built once at startup and owned by the auth service;
//! it holds no mutable state.

use accounts_common::{SignInRequest, SignUpRequest};
use regex::Regex;
use thiserror::Error;

use crate::auth::MIN_PASSWORD_LENGTH;

// Common validation constants
const MIN_NAME_LENGTH: usize = 2;
const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321 SMTP limit

// WHATWG form-validation address syntax; the domain needs at least one dot
const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+$";

/// Possible validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Invalid password: {0}")]
    InvalidPassword(String),
}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Stateless rule set for account inputs
#[derive(Debug, Clone)]
pub struct InputValidator {
    email: Regex,
    min_password_length: usize,
}

impl InputValidator {
    /// Compile the rules. `min_password_length` is raised to the built-in
    /// minimum if configured lower.
    pub fn new(min_password_length: usize) -> Result<Self, regex::Error> {
        Ok(Self {
            email: Regex::new(EMAIL_PATTERN)?,
            min_password_length: min_password_length.max(MIN_PASSWORD_LENGTH),
        })
    }

    /// Minimum accepted password length
    pub fn min_password_length(&self) -> usize {
        self.min_password_length
    }

    /// Validate a display name
    pub fn validate_name<'a>(&self, name: &'a str) -> ValidationResult<&'a str> {
        let len = name.trim().chars().count();
        if len < MIN_NAME_LENGTH {
            return Err(ValidationError::InvalidName(format!(
                "Name must be at least {MIN_NAME_LENGTH} characters"
            )));
        }
        Ok(name)
    }

    /// Validate an email address
    pub fn validate_email<'a>(&self, email: &'a str) -> ValidationResult<&'a str> {
        let email_trimmed = email.trim();
        if email_trimmed.is_empty() {
            return Err(ValidationError::InvalidEmail(
                "Email must not be empty".to_string(),
            ));
        }
        if email_trimmed.len() > MAX_EMAIL_LENGTH {
            return Err(ValidationError::InvalidEmail(format!(
                "Email must be at most {MAX_EMAIL_LENGTH} characters"
            )));
        }
        if !self.email.is_match(email_trimmed) {
            return Err(ValidationError::InvalidEmail(
                "Email is not well-formed".to_string(),
            ));
        }
        Ok(email)
    }

    /// Validate a password. Only the minimum length is checked.
    pub fn validate_password<'a>(&self, password: &'a str) -> ValidationResult<&'a str> {
        let len = password.chars().count();
        if len < self.min_password_length {
            return Err(ValidationError::InvalidPassword(format!(
                "Password must be at least {} characters",
                self.min_password_length
            )));
        }
        Ok(password)
    }

    /// Validate a sign-up request
    pub fn validate_sign_up(&self, input: &SignUpRequest) -> ValidationResult<()> {
        self.validate_name(&input.name)?;
        self.validate_email(&input.email)?;
        self.validate_password(&input.password)?;
        Ok(())
    }

    /// Validate a sign-in request
    pub fn validate_sign_in(&self, input: &SignInRequest) -> ValidationResult<()> {
        self.validate_email(&input.email)?;
        self.validate_password(&input.password)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> InputValidator {
        InputValidator::new(MIN_PASSWORD_LENGTH).unwrap()
    }

    fn sign_up(name: &str, email: &str, password: &str) -> SignUpRequest {
        SignUpRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_validate_sign_up() {
        let v = validator();
        assert!(v.validate_sign_up(&sign_up("Ann", "ann@x.com", "secret1")).is_ok());

        assert!(matches!(
            v.validate_sign_up(&sign_up("A", "ann@x.com", "secret1")),
            Err(ValidationError::InvalidName(_))
        ));
        assert!(matches!(
            v.validate_sign_up(&sign_up("Ann", "ann-at-x.com", "secret1")),
            Err(ValidationError::InvalidEmail(_))
        ));
        assert!(matches!(
            v.validate_sign_up(&sign_up("Ann", "ann@x.com", "short")),
            Err(ValidationError::InvalidPassword(_))
        ));
    }

    #[test]
    fn test_validate_sign_in() {
        let v = validator();
        let ok = SignInRequest {
            email: "ann@x.com".to_string(),
            password: "secret1".to_string(),
        };
        assert!(v.validate_sign_in(&ok).is_ok());

        let empty = SignInRequest {
            email: String::new(),
            password: "secret1".to_string(),
        };
        assert!(matches!(
            v.validate_sign_in(&empty),
            Err(ValidationError::InvalidEmail(_))
        ));
    }

    #[test]
    fn test_email_edge_cases() {
        let v = validator();
        assert!(v.validate_email("a.b+tag@sub.example.org").is_ok());
        assert!(v.validate_email("ann@localhost").is_err());
        assert!(v.validate_email("@x.com").is_err());
        assert!(v.validate_email("o'brien@x.com").is_ok());
        assert!(v.validate_email("ann@-x.com").is_err());
        assert!(v.validate_email("ann smith@x.com").is_err());

        let long = format!("{}@x.com", "a".repeat(MAX_EMAIL_LENGTH));
        assert!(v.validate_email(&long).is_err());
    }

    #[test]
    fn test_no_upper_bound_on_name_or_password() {
        let v = validator();
        let name = "N".repeat(101);
        let password = "p".repeat(129);
        assert!(v.validate_sign_up(&sign_up(&name, "ann@x.com", &password)).is_ok());
    }

    #[test]
    fn test_configured_minimum_never_below_builtin() {
        let v = InputValidator::new(2).unwrap();
        assert_eq!(v.min_password_length(), MIN_PASSWORD_LENGTH);
        let v = InputValidator::new(10).unwrap();
        assert!(v.validate_password("secret1").is_err());
        assert!(v.validate_password("secret1234").is_ok());
    }
}
