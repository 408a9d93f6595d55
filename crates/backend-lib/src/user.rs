// ============================
// crates/backend-lib/src/user.rs
// ============================
//! User records as seen by the authentication core.
use accounts_common::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered account. Only the password hash is ever stored.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub registered_at: DateTime<Utc>,
}

/// Record handed to the credential store on sign-up.
/// The store assigns `id` and `registered_at`.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

impl NewUser {
    /// Materialize the stored record
    pub fn into_user(self, id: UserId, registered_at: DateTime<Utc>) -> User {
        User {
            id,
            name: self.name,
            email: self.email,
            password_hash: self.password_hash,
            registered_at,
        }
    }
}

/// Canonical form of an email used for storage keys and lookups
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Ann@X.com "), "ann@x.com");
    }
}
