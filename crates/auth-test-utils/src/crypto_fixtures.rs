//! Fixed RSA fixtures
//!
//! Tests never generate RSA keys. The dev pair is the one bundled into the
//! service; the foreign pair is an unrelated 2048-bit key that the service
//! must never accept signatures from.

use jsonwebtoken::EncodingKey;

pub use auth_service::crypto::{BUNDLED_PRIVATE_KEY_PEM, BUNDLED_PUBLIC_KEY_PEM};

/// PKCS#8 private key unrelated to the service key.
pub const FOREIGN_PRIVATE_KEY_PEM: &str = include_str!("../keys/foreign_private.pem");

/// SPKI public half of [`FOREIGN_PRIVATE_KEY_PEM`].
pub const FOREIGN_PUBLIC_KEY_PEM: &str = include_str!("../keys/foreign_public.pem");

/// Signing key matching the service's bundled key pair.
pub fn dev_encoding_key() -> EncodingKey {
    EncodingKey::from_rsa_pem(BUNDLED_PRIVATE_KEY_PEM.as_bytes())
        .expect("bundled private key must parse")
}

/// Signing key the service does not trust.
pub fn foreign_encoding_key() -> EncodingKey {
    EncodingKey::from_rsa_pem(FOREIGN_PRIVATE_KEY_PEM.as_bytes())
        .expect("foreign private key must parse")
}
