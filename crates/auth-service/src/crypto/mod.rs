//! Token signing and verification primitives, plus password hashing.
//!
//! Tokens are RS256 JWTs with `typ: JWT` and the configured `kid` in the
//! header. Claim sets are closed structs, one per token kind.

mod keys;

pub use keys::{KeyStore, BUNDLED_PRIVATE_KEY_PEM, BUNDLED_PUBLIC_KEY_PEM};

use crate::config::{MAX_BCRYPT_COST, MIN_BCRYPT_COST};
use crate::errors::AuthError;
use crate::models::{Principal, Role};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, Header, Validation};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::instrument;

/// Bcrypt hash of a random string, verified against when the email is unknown
/// so both login failure paths spend the same time.
pub const DUMMY_PASSWORD_HASH: &str =
    "$2b$12$LQv3c1yqBWVHxkd0LHAkCOYz6TtxMQJqhN8/LewY5GyYqExt7YD3a";

// ============================================================================
// Claims
// ============================================================================

/// Claims of a short-lived access token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Principal email.
    pub sub: String,
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub roles: Role,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

impl AccessClaims {
    pub fn email(&self) -> &str {
        &self.sub
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    pub fn role(&self) -> Role {
        self.roles
    }

    pub fn principal(&self) -> Principal {
        Principal {
            user_id: self.user_id,
            email: self.sub.clone(),
            role: self.roles,
        }
    }
}

impl fmt::Debug for AccessClaims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessClaims")
            .field("sub", &"[REDACTED]")
            .field("user_id", &self.user_id)
            .field("roles", &self.roles)
            .field("iss", &self.iss)
            .field("aud", &self.aud)
            .field("iat", &self.iat)
            .field("exp", &self.exp)
            .finish()
    }
}

/// Claims of a long-lived refresh token.
///
/// Unknown fields are rejected so an access token can never be accepted
/// where a refresh token is expected.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RefreshClaims {
    pub sub: String,
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

impl RefreshClaims {
    pub fn email(&self) -> &str {
        &self.sub
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }
}

impl fmt::Debug for RefreshClaims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshClaims")
            .field("sub", &"[REDACTED]")
            .field("user_id", &self.user_id)
            .field("iat", &self.iat)
            .field("exp", &self.exp)
            .finish()
    }
}

/// Claim sets that carry an `iat`.
pub trait IssuedAt {
    fn issued_at(&self) -> i64;
}

impl IssuedAt for AccessClaims {
    fn issued_at(&self) -> i64 {
        self.iat
    }
}

impl IssuedAt for RefreshClaims {
    fn issued_at(&self) -> i64 {
        self.iat
    }
}

// ============================================================================
// Signing / verification
// ============================================================================

/// Sign claims with the RS256 private key.
#[instrument(skip_all)]
pub fn sign_jwt<T: Serialize>(claims: &T, keys: &KeyStore) -> Result<String, AuthError> {
    let mut header = Header::new(Algorithm::RS256);
    header.typ = Some("JWT".to_string());
    header.kid = Some(keys.key_id().to_string());

    encode(&header, claims, keys.encoding_key())
        .map_err(|e| AuthError::Crypto(format!("JWT signing operation failed: {}", e)))
}

/// Validation for access tokens: RS256 only, zero leeway, exact issuer and audience.
pub fn access_token_validation(issuer: &str, audience: &str) -> Validation {
    let mut validation = Validation::new(Algorithm::RS256);
    validation.leeway = 0;
    validation.set_issuer(&[issuer]);
    validation.set_audience(&[audience]);
    validation.set_required_spec_claims(&["exp", "iat", "sub", "iss", "aud"]);
    validation
}

/// Validation for refresh tokens: RS256 only, zero leeway, no issuer or audience.
pub fn refresh_token_validation() -> Validation {
    let mut validation = Validation::new(Algorithm::RS256);
    validation.leeway = 0;
    validation.validate_aud = false;
    validation.set_required_spec_claims(&["exp", "iat", "sub"]);
    validation
}

/// Verify a JWT against the key store.
///
/// Order: size and header (`kid` present and ours), signature, `exp`, issuer
/// and audience when `validation` asks for them, then `iat` against
/// `clock_skew`. An expired but otherwise valid token is `TokenExpired`;
/// every other failure is `TokenInvalid`.
#[instrument(skip_all)]
pub fn verify_jwt<T>(
    token: &str,
    keys: &KeyStore,
    validation: &Validation,
    clock_skew: Duration,
) -> Result<T, AuthError>
where
    T: DeserializeOwned + IssuedAt,
{
    let kid = common::jwt::extract_kid(token).map_err(|e| {
        tracing::debug!(target: "auth.crypto", error = ?e, "Token header rejected");
        AuthError::TokenInvalid(format!("header: {:?}", e))
    })?;

    if kid != keys.key_id() {
        tracing::debug!(target: "auth.crypto", kid = %kid, "Token signed with unknown key id");
        return Err(AuthError::TokenInvalid("unknown kid".to_string()));
    }

    let token_data = decode::<T>(token, keys.decoding_key(), validation).map_err(|e| {
        tracing::debug!(target: "auth.crypto", error = %e, "Token verification failed");
        match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::TokenInvalid(e.to_string()),
        }
    })?;

    common::jwt::validate_iat(token_data.claims.issued_at(), clock_skew)
        .map_err(|_| AuthError::TokenInvalid("iat too far in the future".to_string()))?;

    Ok(token_data.claims)
}

// ============================================================================
// Passwords
// ============================================================================

/// Hash a password with bcrypt.
///
/// # Errors
///
/// `AuthError::Crypto` when `cost` is outside 10..=14 or hashing fails.
#[instrument(skip_all)]
pub fn hash_password(password: &str, cost: u32) -> Result<String, AuthError> {
    if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&cost) {
        return Err(AuthError::Crypto(format!(
            "Invalid bcrypt cost: {} (must be {}-{})",
            cost, MIN_BCRYPT_COST, MAX_BCRYPT_COST
        )));
    }

    bcrypt::hash(password, cost)
        .map_err(|e| AuthError::Crypto(format!("Password hashing failed: {}", e)))
}

/// Verify a password against a bcrypt hash
#[instrument(skip_all)]
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    bcrypt::verify(password, hash)
        .map_err(|e| AuthError::Crypto(format!("Password verification failed: {}", e)))
}
