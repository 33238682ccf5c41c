//! JWT helpers shared by the token verifier and the test tooling.
//!
//! - Size limit checked before any parsing
//! - Clock skew bounds for `iat` validation
//! - `kid` extraction from an unverified header
//! - Unsigned big-endian integer encoding used by RSA JWKs (`n`, `e`)
//!
//! Every [`JwtValidationError`] renders the same generic message. Specific
//! reasons are logged at debug level only.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Maximum accepted JWT size in bytes (8KB).
///
/// An RS256 access token with this service's claims is well under 1KB.
/// Anything over the limit is rejected before base64 decoding or signature
/// work.
pub const MAX_JWT_SIZE_BYTES: usize = 8192;

/// Default tolerance for an `iat` in the future (5 minutes).
pub const DEFAULT_CLOCK_SKEW: Duration = Duration::from_secs(300);

/// Upper bound for a configured clock skew tolerance (10 minutes).
pub const MAX_CLOCK_SKEW: Duration = Duration::from_secs(600);

// =============================================================================
// Errors
// =============================================================================

/// Structural failures detected before or after signature verification.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwtValidationError {
    /// Token exceeds [`MAX_JWT_SIZE_BYTES`].
    #[error("The token is invalid or expired")]
    TokenTooLarge,

    /// Not three dot-separated segments, or the header is not base64url JSON.
    #[error("The token is invalid or expired")]
    MalformedToken,

    /// Header has no non-empty string `kid`.
    #[error("The token is invalid or expired")]
    MissingKid,

    /// `iat` lies further in the future than the allowed clock skew.
    #[error("The token is invalid or expired")]
    IatTooFarInFuture,
}

// =============================================================================
// Header inspection
// =============================================================================

/// Reads the `kid` from a JWT header without verifying the signature.
///
/// The result is only good for selecting a key. The token must still be
/// verified against that key.
///
/// # Errors
///
/// - `TokenTooLarge` when the token exceeds [`MAX_JWT_SIZE_BYTES`]
/// - `MalformedToken` for wrong segment count, bad base64 or bad JSON
/// - `MissingKid` when the header carries no usable `kid`
pub fn extract_kid(token: &str) -> Result<String, JwtValidationError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "common.jwt",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(JwtValidationError::TokenTooLarge);
    }

    let mut segments = token.split('.');
    let (Some(header_part), Some(_), Some(_), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        tracing::debug!(target: "common.jwt", "Token rejected: not a three-segment JWT");
        return Err(JwtValidationError::MalformedToken);
    };

    let header_bytes = URL_SAFE_NO_PAD.decode(header_part).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to decode JWT header base64");
        JwtValidationError::MalformedToken
    })?;

    let header: serde_json::Value = serde_json::from_slice(&header_bytes).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to parse JWT header JSON");
        JwtValidationError::MalformedToken
    })?;

    header
        .get("kid")
        .and_then(serde_json::Value::as_str)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .ok_or(JwtValidationError::MissingKid)
}

// =============================================================================
// iat validation
// =============================================================================

/// Rejects tokens whose `iat` is more than `clock_skew` ahead of now.
///
/// # Errors
///
/// Returns `IatTooFarInFuture` when `iat > now + clock_skew`.
pub fn validate_iat(iat: i64, clock_skew: Duration) -> Result<(), JwtValidationError> {
    validate_iat_at(iat, clock_skew, chrono::Utc::now().timestamp())
}

/// [`validate_iat`] against an explicit `now`, for boundary tests.
pub(crate) fn validate_iat_at(
    iat: i64,
    clock_skew: Duration,
    now: i64,
) -> Result<(), JwtValidationError> {
    // clock_skew is bounded by MAX_CLOCK_SKEW
    #[allow(clippy::cast_possible_wrap)]
    let clock_skew_secs = clock_skew.as_secs() as i64;
    let max_iat = now.saturating_add(clock_skew_secs);

    if iat > max_iat {
        tracing::debug!(
            target: "common.jwt",
            iat = iat,
            now = now,
            max_allowed = max_iat,
            "Token rejected: iat too far in the future"
        );
        return Err(JwtValidationError::IatTooFarInFuture);
    }

    Ok(())
}

// =============================================================================
// JWK integers
// =============================================================================

/// Encodes a big-endian unsigned integer as unpadded base64url (RFC 7518 6.3.1).
///
/// Leading zero bytes are stripped so a sign byte from a DER encoding never
/// reaches the JWK. Zero itself encodes as a single `0x00` octet.
#[must_use]
pub fn encode_jwk_uint(big_endian: &[u8]) -> String {
    let first_significant = big_endian
        .iter()
        .position(|b| *b != 0)
        .unwrap_or(big_endian.len().saturating_sub(1));
    let trimmed = big_endian.get(first_significant..).unwrap_or_default();
    URL_SAFE_NO_PAD.encode(trimmed)
}

/// Decodes a JWK integer member back to big-endian bytes.
///
/// # Errors
///
/// Returns `base64::DecodeError` when the value is not unpadded base64url.
pub fn decode_jwk_uint(value: &str) -> Result<Vec<u8>, base64::DecodeError> {
    URL_SAFE_NO_PAD.decode(value)
}
