//! Observability helpers for the auth service.
//!
//! Spans use `#[instrument(skip_all)]` with explicitly allow-listed fields.
//! Emails are logged only through [`hash_for_correlation`]. Tokens, passwords
//! and key material are never logged.

pub mod metrics;

use crate::errors::AuthError;
use sha2::{Digest, Sha256};

/// Hash a field value for correlation in logs (SHA-256, first 8 hex chars)
///
/// One-way and truncated. Good enough to follow one principal through a
/// burst of log lines, not to identify it.
pub fn hash_for_correlation(value: &str) -> String {
    let digest = Sha256::digest(value.as_bytes());
    hex::encode(digest.get(..4).unwrap_or_default())
}

/// Error categories for metrics labels (bounded cardinality)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Missing credentials, bad password, unknown principal
    Authentication,
    /// Expired token
    Expired,
    /// Bad signature, malformed token, rotated refresh token
    Cryptographic,
    /// Storage, key, or other server-side failures
    Internal,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Authentication => "authentication",
            ErrorCategory::Expired => "expired",
            ErrorCategory::Cryptographic => "cryptographic",
            ErrorCategory::Internal => "internal",
        }
    }
}

impl From<&AuthError> for ErrorCategory {
    fn from(err: &AuthError) -> Self {
        match err {
            AuthError::AuthenticationRequired
            | AuthError::PrincipalNotFound
            | AuthError::InvalidCredentials
            | AuthError::InvalidRequest(_)
            | AuthError::NotFound => ErrorCategory::Authentication,
            AuthError::TokenExpired => ErrorCategory::Expired,
            AuthError::TokenInvalid(_) | AuthError::RefreshMismatch => ErrorCategory::Cryptographic,
            AuthError::KeyLoadFailure(_)
            | AuthError::Database(_)
            | AuthError::Crypto(_)
            | AuthError::Internal => ErrorCategory::Internal,
        }
    }
}
