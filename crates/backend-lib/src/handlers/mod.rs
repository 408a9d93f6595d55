//! HTTP handlers.
pub mod auth;

pub use auth::{health, me, refresh, sign_in, sign_up};
