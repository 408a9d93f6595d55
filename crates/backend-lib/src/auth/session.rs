// ============================
// crates/backend-lib/src/auth/session.rs
// ============================
//! Refresh sessions and access-token lifetimes.
use accounts_common::UserId;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Access token TTL (15 hours)
pub const ACCESS_TOKEN_TTL_SECS: u64 = 60 * 60 * 15;

/// Refresh session TTL (30 days)
pub const REFRESH_SESSION_TTL_SECS: u64 = 60 * 60 * 24 * 30;

/// Server-side record behind a refresh token.
/// A new one is created on every issuance; existing records are never extended.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RefreshSession {
    pub user_id: UserId,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl RefreshSession {
    /// Create a session for `user_id` expiring `ttl` from now
    pub fn new(user_id: UserId, token: String, ttl: Duration) -> Self {
        Self {
            user_id,
            token,
            expires_at: Utc::now() + ttl,
        }
    }

    /// A session is usable only while `now < expires_at`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Check expiry against the current time
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_expiry_boundary() {
        let session = RefreshSession::new(1, "t".into(), Duration::days(30));
        assert!(!session.is_expired());
        assert!(session.is_expired_at(session.expires_at));
        assert!(!session.is_expired_at(session.expires_at - Duration::seconds(1)));
    }

    #[test]
    fn test_negative_ttl_is_expired() {
        let session = RefreshSession::new(1, "t".into(), Duration::seconds(-5));
        assert!(session.is_expired());
    }
}
