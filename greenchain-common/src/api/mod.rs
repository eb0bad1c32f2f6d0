//! Shared HTTP API helpers
//!
//! Pure functions only (no HTTP framework dependencies). The service crate
//! wraps these with Axum middleware.

pub mod auth;

pub use auth::{
    generate_token, hash_password, hash_token, parse_bearer, verify_password, ApiAuthError,
};
