// ============================
// crates/backend-lib/src/auth/password.rs
// ============================
//! Password hashing.
//!
//! Sign-in authenticates by hashing the candidate password and asking the
//! credential store for a row matching `(email, hash)`. That only works if
//! hashing is deterministic, so both implementations use a single salt taken
//! from configuration rather than a per-user random salt.
//!
//! **Known weakness:** a global salt lets an attacker holding the user table
//! attack every account with one precomputation, and `DigestHasher` is a fast
//! hash. `Argon2Hasher` makes each guess expensive but keeps the global salt.
//! Moving to per-user salts changes the stored record shape and the
//! credential lookup contract.
use std::sync::Arc;

use argon2::{
    password_hash::{PasswordHasher as PhcHasher, SaltString},
    Argon2,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{AppError, AppResult};

/// Minimum password length
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Salt bounds accepted by `Argon2Hasher`
pub const ARGON2_MIN_SALT: usize = 8;
pub const ARGON2_MAX_SALT: usize = 48;

/// Which hash function turns passwords into stored digests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    Sha256,
    Argon2,
}

/// Deterministic one-way transform used both to store and to verify passwords
pub trait PasswordHasher: Send + Sync + std::fmt::Debug {
    /// Hash a plaintext password. Equal inputs always produce equal digests.
    fn hash(&self, plain: &str) -> AppResult<String>;

    /// Short name for logs
    fn algorithm(&self) -> HashAlgorithm;
}

/// SHA-256 over `salt || password`, hex encoded
#[derive(Debug, Clone)]
pub struct DigestHasher {
    salt: String,
}

impl DigestHasher {
    pub fn new(salt: impl Into<String>) -> Self {
        Self { salt: salt.into() }
    }
}

impl PasswordHasher for DigestHasher {
    fn hash(&self, plain: &str) -> AppResult<String> {
        let digest = Sha256::new()
            .chain_update(self.salt.as_bytes())
            .chain_update(plain.as_bytes())
            .finalize();
        Ok(hex::encode(digest))
    }

    fn algorithm(&self) -> HashAlgorithm {
        HashAlgorithm::Sha256
    }
}

/// Argon2id with default parameters and the configured global salt.
/// Output is a PHC string.
#[derive(Debug, Clone)]
pub struct Argon2Hasher {
    salt: SaltString,
}

impl Argon2Hasher {
    /// The salt must be 8 to 48 bytes long
    pub fn new(salt: &str) -> AppResult<Self> {
        if !(ARGON2_MIN_SALT..=ARGON2_MAX_SALT).contains(&salt.len()) {
            return Err(AppError::Internal(format!(
                "argon2 salt must be {ARGON2_MIN_SALT}..={ARGON2_MAX_SALT} bytes"
            )));
        }
        let salt = SaltString::encode_b64(salt.as_bytes())
            .map_err(|e| AppError::Internal(format!("invalid password salt: {e}")))?;
        Ok(Self { salt })
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, plain: &str) -> AppResult<String> {
        let hash = Argon2::default()
            .hash_password(plain.as_bytes(), &self.salt)
            .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))?;
        Ok(hash.to_string())
    }

    fn algorithm(&self) -> HashAlgorithm {
        HashAlgorithm::Argon2
    }
}

/// Build the configured hasher
pub fn build_hasher(algorithm: HashAlgorithm, salt: &str) -> AppResult<Arc<dyn PasswordHasher>> {
    Ok(match algorithm {
        HashAlgorithm::Sha256 => Arc::new(DigestHasher::new(salt)),
        HashAlgorithm::Argon2 => Arc::new(Argon2Hasher::new(salt)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SALT: &str = "RqijtrEJTQ0wtqTEsGNHrownSaltIGj";

    #[test]
    fn test_digest_is_deterministic() {
        let hasher = DigestHasher::new(SALT);
        let first = hasher.hash("secret1").unwrap();
        assert_eq!(first, hasher.hash("secret1").unwrap());
        assert_ne!(first, hasher.hash("secret2").unwrap());
        assert_ne!(first, "secret1");
        assert_eq!(first.len(), 64);
    }

    #[test]
    fn test_digest_depends_on_salt() {
        let a = DigestHasher::new("salt-one").hash("secret1").unwrap();
        let b = DigestHasher::new("salt-two").hash("secret1").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_argon2_is_deterministic() {
        let hasher = Argon2Hasher::new(SALT).unwrap();
        let first = hasher.hash("secret1").unwrap();
        assert!(first.starts_with("$argon2id$"));
        assert_eq!(first, hasher.hash("secret1").unwrap());
        assert_ne!(first, hasher.hash("wrong12").unwrap());
    }

    #[test]
    fn test_argon2_rejects_short_salt() {
        assert!(Argon2Hasher::new("ab").is_err());
    }

    #[test]
    fn test_build_hasher() {
        let hasher = build_hasher(HashAlgorithm::Sha256, SALT).unwrap();
        assert_eq!(hasher.algorithm(), HashAlgorithm::Sha256);
        let hasher = build_hasher(HashAlgorithm::Argon2, SALT).unwrap();
        assert_eq!(hasher.algorithm(), HashAlgorithm::Argon2);
    }
}
