// ============================
// crates/backend-lib/src/auth/token_generator.rs
// ============================
/** Secure token generation for refresh sessions
Refresh tokens are drawn from the operating system's CSPRNG and
hex-encoded, so they are safe to use as lookup keys and cookie values. */
use rand::{rngs::OsRng, TryRngCore};

use crate::error::{AppError, AppResult};

/// Default token size in bytes (32 bytes = 256 bits of entropy)
pub const REFRESH_TOKEN_BYTES: usize = 32;

/** Generate a refresh token
# Returns
64 lowercase hex characters */
pub fn generate_refresh_token() -> AppResult<String> {
    generate_refresh_token_with_size(REFRESH_TOKEN_BYTES)
}

/** Generate a refresh token with the specified size
# Arguments
* `bytes` - The size of the random token in bytes, never below `REFRESH_TOKEN_BYTES` */
pub fn generate_refresh_token_with_size(bytes: usize) -> AppResult<String> {
    let mut buffer = vec![0u8; bytes.max(REFRESH_TOKEN_BYTES)];
    OsRng
        .try_fill_bytes(&mut buffer)
        .map_err(|e| AppError::Internal(format!("entropy source unavailable: {e}")))?;
    Ok(hex::encode(buffer))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_generation() {
        let token1 = generate_refresh_token().unwrap();
        let token2 = generate_refresh_token().unwrap();

        assert_ne!(token1, token2);
        assert_eq!(token1.len(), REFRESH_TOKEN_BYTES * 2);
        assert!(token1.chars().all(|c| c.is_ascii_hexdigit()));

        // Never shorter than the minimum
        let small = generate_refresh_token_with_size(8).unwrap();
        assert_eq!(small.len(), REFRESH_TOKEN_BYTES * 2);

        let large = generate_refresh_token_with_size(64).unwrap();
        assert_eq!(large.len(), 128);
    }
}
