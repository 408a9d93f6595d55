// ==============
// crates/backend-lib/src/metrics.rs

//! Central place for metric keys
pub const AUTH_SIGN_UP: &str = "auth.sign_up";
pub const AUTH_SIGN_IN: &str = "auth.sign_in";
pub const AUTH_TOKEN_REJECTED: &str = "auth.token.rejected";
pub const AUTH_REFRESH: &str = "auth.refresh";
