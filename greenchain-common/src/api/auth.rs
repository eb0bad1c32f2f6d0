//! Credential and bearer-token helpers
//!
//! # Scheme
//!
//! - Passwords: Argon2id with the crate defaults, stored as a PHC string
//!   (algorithm, parameters and salt travel inside the string)
//! - Bearer tokens: 32 random bytes as hex; only SHA-256(token) is persisted
//! - Requests carry `Authorization: Bearer <token>`

use crate::Error;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::RngCore;
use sha2::{Digest, Sha256};

// ========================================
// Error Types
// ========================================

/// Authentication error types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiAuthError {
    /// No Authorization header on the request
    MissingToken,

    /// Header present but not `Bearer <token>`
    MalformedHeader(String),

    /// Token unknown or expired
    InvalidToken,
}

impl std::fmt::Display for ApiAuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiAuthError::MissingToken => write!(f, "Missing bearer token"),
            ApiAuthError::MalformedHeader(reason) => {
                write!(f, "Malformed Authorization header: {}", reason)
            }
            ApiAuthError::InvalidToken => write!(f, "Invalid or expired token"),
        }
    }
}

impl std::error::Error for ApiAuthError {}

// ========================================
// Header Parsing
// ========================================

/// Extract the token from an `Authorization` header value
///
/// # Examples
///
/// ```
/// use greenchain_common::api::auth::parse_bearer;
///
/// assert_eq!(parse_bearer("Bearer abc123").unwrap(), "abc123");
/// assert!(parse_bearer("Basic abc123").is_err());
/// assert!(parse_bearer("Bearer ").is_err());
/// ```
pub fn parse_bearer(header_value: &str) -> Result<&str, ApiAuthError> {
    let mut parts = header_value.trim().splitn(2, ' ');
    let scheme = parts.next().unwrap_or_default();
    let token = parts.next().map(str::trim).unwrap_or_default();

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(ApiAuthError::MalformedHeader(format!(
            "unsupported scheme {:?}",
            scheme
        )));
    }
    if token.is_empty() {
        return Err(ApiAuthError::MalformedHeader("empty token".to_string()));
    }

    Ok(token)
}

// ========================================
// Passwords
// ========================================

/// Hash a password into a PHC string with a fresh random salt
///
/// CPU-heavy; async callers should run it on a blocking thread.
///
/// # Examples
///
/// ```
/// use greenchain_common::api::auth::{hash_password, verify_password};
///
/// let stored = hash_password("secret").unwrap();
/// assert!(stored.starts_with("$argon2id$"));
/// assert!(verify_password("secret", &stored));
/// assert_ne!(stored, hash_password("secret").unwrap());
/// ```
pub fn hash_password(password: &str) -> crate::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::Internal(format!("Failed to hash password: {}", e)))
}

/// Check a password against a stored PHC string
///
/// An unparseable stored hash never verifies.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

// ========================================
// Tokens
// ========================================

/// Generate a new opaque bearer token
pub fn generate_token() -> String {
    random_hex(32)
}

/// Digest under which a token is persisted
pub fn hash_token(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

fn random_hex(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bearer_accepts_case_insensitive_scheme() {
        assert_eq!(parse_bearer("bearer tok").unwrap(), "tok");
        assert_eq!(parse_bearer("  Bearer   tok  ").unwrap(), "tok");
    }

    #[test]
    fn test_parse_bearer_rejects_other_schemes() {
        assert!(matches!(
            parse_bearer("Token abc"),
            Err(ApiAuthError::MalformedHeader(_))
        ));
        assert!(matches!(
            parse_bearer("Bearer"),
            Err(ApiAuthError::MalformedHeader(_))
        ));
    }

    #[test]
    fn test_verify_password_round_trip() {
        let stored = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &stored));
        assert!(!verify_password("wrong horse", &stored));
    }

    #[test]
    fn test_hash_is_phc_string_with_own_salt() {
        let a = hash_password("correct horse").unwrap();
        let b = hash_password("correct horse").unwrap();
        assert!(a.starts_with("$argon2id$"));
        assert_ne!(a, b);
        assert!(verify_password("correct horse", &b));
    }

    #[test]
    fn test_malformed_stored_hash_never_verifies() {
        assert!(!verify_password("correct horse", ""));
        assert!(!verify_password("correct horse", "short"));
        assert!(!verify_password(
            "correct horse",
            "5e884898da28047151d0e56f8dc6292773603d0d6aabbdd62a11ef721d1542d8"
        ));
    }

    #[test]
    fn test_tokens_are_unique_and_hashed() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
        assert_ne!(hash_token(&a), a);
        assert_eq!(hash_token(&a), hash_token(&a));
    }
}
