//! Builder for hand-made tokens
//!
//! The service only ever mints well-formed tokens. This builder produces the
//! ones it must reject: foreign keys, wrong issuers, stale timestamps,
//! missing claims.

use crate::crypto_fixtures::{dev_encoding_key, foreign_encoding_key};
use crate::test_ids::{TEST_FOREIGN_KEY_ID, TEST_KEY_ID};
use auth_service::config::{DEFAULT_AUDIENCE, DEFAULT_ISSUER};
use auth_service::models::{Principal, Role};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{json, Map, Value};

/// Builder for access-token-shaped JWTs
///
/// # Example
/// ```rust,ignore
/// let token = TestTokenBuilder::for_principal(&alice)
///     .with_issuer("https://evil.example.com")
///     .sign_with_dev_key();
/// ```
pub struct TestTokenBuilder {
    claims: Map<String, Value>,
    kid: Option<String>,
}

impl TestTokenBuilder {
    /// Access-token claims for a made-up principal, valid for an hour.
    pub fn new() -> Self {
        Self::for_principal(&Principal {
            user_id: 1,
            email: "test-subject@example.com".to_string(),
            role: Role::User,
        })
    }

    /// Access-token claims for `principal`, valid for an hour.
    pub fn for_principal(principal: &Principal) -> Self {
        let now = Utc::now();
        let claims = json!({
            "sub": principal.email,
            "userId": principal.user_id,
            "roles": principal.role.as_str(),
            "iss": DEFAULT_ISSUER,
            "aud": DEFAULT_AUDIENCE,
            "iat": now.timestamp(),
            "exp": (now + Duration::seconds(3600)).timestamp(),
            "jti": uuid::Uuid::new_v4().to_string(),
        })
        .as_object()
        .cloned()
        .unwrap_or_default();

        Self {
            claims,
            kid: Some(TEST_KEY_ID.to_string()),
        }
    }

    pub fn with_issuer(self, issuer: &str) -> Self {
        self.with_claim("iss", json!(issuer))
    }

    pub fn with_audience(self, audience: &str) -> Self {
        self.with_claim("aud", json!(audience))
    }

    /// Set expiration in seconds from now (negative for already expired).
    pub fn expires_in(self, seconds: i64) -> Self {
        let exp = (Utc::now() + Duration::seconds(seconds)).timestamp();
        self.with_claim("exp", json!(exp))
    }

    pub fn issued_at(self, timestamp: i64) -> Self {
        self.with_claim("iat", json!(timestamp))
    }

    /// Set or overwrite any claim.
    pub fn with_claim(mut self, name: &str, value: Value) -> Self {
        self.claims.insert(name.to_string(), value);
        self
    }

    pub fn without_claim(mut self, name: &str) -> Self {
        self.claims.remove(name);
        self
    }

    pub fn with_kid(mut self, kid: &str) -> Self {
        self.kid = Some(kid.to_string());
        self
    }

    pub fn without_kid(mut self) -> Self {
        self.kid = None;
        self
    }

    /// The claims as a JSON value.
    pub fn build(&self) -> Value {
        Value::Object(self.claims.clone())
    }

    /// RS256 over the service's own key.
    pub fn sign_with_dev_key(self) -> String {
        self.sign(&dev_encoding_key())
    }

    /// RS256 over a key the service does not know. Uses the foreign kid
    /// unless one was set explicitly.
    pub fn sign_with_foreign_key(mut self) -> String {
        if self.kid.as_deref() == Some(TEST_KEY_ID) {
            self.kid = Some(TEST_FOREIGN_KEY_ID.to_string());
        }
        self.sign(&foreign_encoding_key())
    }

    /// HS256 with `secret`. The service only accepts RS256.
    pub fn sign_hs256(self, secret: &[u8]) -> String {
        let mut header = Header::new(Algorithm::HS256);
        header.kid = self.kid.clone();
        jsonwebtoken::encode(&header, &self.build(), &EncodingKey::from_secret(secret))
            .expect("HS256 signing must succeed")
    }

    /// RS256 with an arbitrary key.
    pub fn sign(self, key: &EncodingKey) -> String {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.kid.clone();
        jsonwebtoken::encode(&header, &self.build(), key).expect("RS256 signing must succeed")
    }
}

impl Default for TestTokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}
