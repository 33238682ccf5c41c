//! Process-wide RS256 signing key pair.
//!
//! Built once at startup and shared read-only behind an `Arc`. The JWK is
//! derived from the public key at load time, and the verification key is
//! rebuilt from that same JWK, so what `/jwks` publishes is exactly what the
//! service itself verifies against.

use crate::config::KeySource;
use crate::errors::AuthError;
use crate::models::JsonWebKey;
use common::jwt::encode_jwk_uint;
use jsonwebtoken::{DecodingKey, EncodingKey};
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey, EncodeRsaPrivateKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use std::fmt;
use std::path::Path;

/// Development private key (PKCS#8). Never use outside local runs and tests.
pub const BUNDLED_PRIVATE_KEY_PEM: &str = include_str!("../../keys/dev_private.pem");

/// Public half of [`BUNDLED_PRIVATE_KEY_PEM`] (SPKI).
pub const BUNDLED_PUBLIC_KEY_PEM: &str = include_str!("../../keys/dev_public.pem");

/// Smallest modulus accepted for a signing key.
const MIN_RSA_KEY_BITS: usize = 2048;

pub struct KeyStore {
    key_id: String,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    jwk: JsonWebKey,
}

impl KeyStore {
    /// Builds a key store from PEM text.
    ///
    /// The private key may be PKCS#8 (`PRIVATE KEY`) or PKCS#1
    /// (`RSA PRIVATE KEY`); the public key SPKI (`PUBLIC KEY`) or PKCS#1
    /// (`RSA PUBLIC KEY`). The two must form a pair.
    pub fn from_pem(
        private_key_pem: &str,
        public_key_pem: &str,
        key_id: &str,
    ) -> Result<Self, AuthError> {
        if key_id.is_empty() {
            return Err(AuthError::KeyLoadFailure("key id must not be empty".to_string()));
        }

        let private_key = RsaPrivateKey::from_pkcs8_pem(private_key_pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(private_key_pem))
            .map_err(|e| AuthError::KeyLoadFailure(format!("invalid private key: {}", e)))?;

        let public_key = RsaPublicKey::from_public_key_pem(public_key_pem)
            .or_else(|_| RsaPublicKey::from_pkcs1_pem(public_key_pem))
            .map_err(|e| AuthError::KeyLoadFailure(format!("invalid public key: {}", e)))?;

        if RsaPublicKey::from(&private_key) != public_key {
            return Err(AuthError::KeyLoadFailure(
                "public key does not match private key".to_string(),
            ));
        }

        if public_key.size() * 8 < MIN_RSA_KEY_BITS {
            return Err(AuthError::KeyLoadFailure(format!(
                "RSA key must be at least {} bits",
                MIN_RSA_KEY_BITS
            )));
        }

        let private_der = private_key
            .to_pkcs1_der()
            .map_err(|e| AuthError::KeyLoadFailure(format!("private key encoding: {}", e)))?;
        let encoding_key = EncodingKey::from_rsa_der(private_der.as_bytes());

        let jwk = JsonWebKey {
            kty: "RSA".to_string(),
            alg: "RS256".to_string(),
            use_: "sig".to_string(),
            kid: key_id.to_string(),
            n: encode_jwk_uint(&public_key.n().to_bytes_be()),
            e: encode_jwk_uint(&public_key.e().to_bytes_be()),
        };

        let decoding_key = DecodingKey::from_rsa_components(&jwk.n, &jwk.e)
            .map_err(|e| AuthError::KeyLoadFailure(format!("verification key: {}", e)))?;

        Ok(Self {
            key_id: key_id.to_string(),
            encoding_key,
            decoding_key,
            jwk,
        })
    }

    /// Reads both PEM files from disk.
    pub fn from_files(
        private_key_path: &Path,
        public_key_path: &Path,
        key_id: &str,
    ) -> Result<Self, AuthError> {
        let private_pem = std::fs::read_to_string(private_key_path).map_err(|e| {
            AuthError::KeyLoadFailure(format!(
                "cannot read private key {}: {}",
                private_key_path.display(),
                e
            ))
        })?;
        let public_pem = std::fs::read_to_string(public_key_path).map_err(|e| {
            AuthError::KeyLoadFailure(format!(
                "cannot read public key {}: {}",
                public_key_path.display(),
                e
            ))
        })?;

        Self::from_pem(&private_pem, &public_pem, key_id)
    }

    /// The development key pair compiled into the binary.
    pub fn bundled(key_id: &str) -> Result<Self, AuthError> {
        Self::from_pem(BUNDLED_PRIVATE_KEY_PEM, BUNDLED_PUBLIC_KEY_PEM, key_id)
    }

    pub fn load(source: &KeySource, key_id: &str) -> Result<Self, AuthError> {
        match source {
            KeySource::Bundled => {
                tracing::warn!(
                    target: "auth.crypto",
                    kid = %key_id,
                    "Using bundled development signing key"
                );
                Self::bundled(key_id)
            }
            KeySource::Files {
                private_key_path,
                public_key_path,
            } => Self::from_files(private_key_path, public_key_path, key_id),
        }
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Public key as an RSA JWK (`kty`, `alg`, `use`, `kid`, `n`, `e`).
    pub fn public_jwk(&self) -> &JsonWebKey {
        &self.jwk
    }

    pub(crate) fn encoding_key(&self) -> &EncodingKey {
        &self.encoding_key
    }

    pub(crate) fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }
}

impl fmt::Debug for KeyStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyStore")
            .field("key_id", &self.key_id)
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}
