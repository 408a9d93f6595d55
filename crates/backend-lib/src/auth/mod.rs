// ============================
// crates/backend-lib/src/auth/mod.rs
// ============================
//! Authentication module.

pub mod password;
pub mod proto;
pub mod session;
pub mod token_generator;
mod local;
mod provider;
mod remote;
mod service;
mod service_impl;

pub use local::LocalSigner;
pub use password::{build_hasher, Argon2Hasher, DigestHasher, HashAlgorithm, PasswordHasher, MIN_PASSWORD_LENGTH};
pub use provider::{TokenPair, TokenProvider};
pub use remote::{map_status, RemoteCall, RemoteSigner};
pub use service::AuthService;
pub use service_impl::DefaultAuth;
pub use session::{RefreshSession, ACCESS_TOKEN_TTL_SECS, REFRESH_SESSION_TTL_SECS};
pub use token_generator::generate_refresh_token;
