use crate::crypto::KeyStore;
use crate::models::{Jwks, OpenIdConfiguration};

/// Path of the JWKS document relative to the issuer.
pub const JWKS_PATH: &str = "/.well-known/jwks.json";

/// Public key discovery documents, built once from the key store.
#[derive(Debug, Clone)]
pub struct DiscoveryPublisher {
    jwks: Jwks,
    openid_configuration: OpenIdConfiguration,
}

impl DiscoveryPublisher {
    pub fn new(keys: &KeyStore, issuer: &str) -> Self {
        let jwks = Jwks {
            keys: vec![keys.public_jwk().clone()],
        };

        let openid_configuration = OpenIdConfiguration {
            issuer: issuer.to_string(),
            jwks_uri: format!("{}{}", issuer.trim_end_matches('/'), JWKS_PATH),
            id_token_signing_alg_values_supported: vec!["RS256".to_string()],
            response_types_supported: vec!["token".to_string()],
            subject_types_supported: vec!["public".to_string()],
        };

        Self {
            jwks,
            openid_configuration,
        }
    }

    /// `{keys: [public JWK]}`
    pub fn jwks(&self) -> &Jwks {
        &self.jwks
    }

    pub fn openid_configuration(&self) -> &OpenIdConfiguration {
        &self.openid_configuration
    }
}
