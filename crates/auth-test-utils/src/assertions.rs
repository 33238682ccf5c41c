//! Custom test assertions for expressive tests
//!
//! Decode without verifying; signature checks belong to the service.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::Deserialize;
use serde_json::Value;

/// JWT header structure
#[derive(Debug, Deserialize)]
struct JwtHeader {
    pub alg: String,
    pub typ: String,
    #[serde(default)]
    pub kid: Option<String>,
}

/// Custom assertions for tokens as returned by the service
///
/// Accepts the raw JWT or the `"Bearer <jwt>"` form of login responses.
///
/// # Example
/// ```rust,ignore
/// body.access_token
///     .assert_valid_jwt()
///     .assert_signed_by(TEST_KEY_ID)
///     .assert_for_subject("alice@example.com");
/// ```
pub trait TokenAssertions {
    /// Assert three segments, an RS256/JWT header, and a JSON payload
    fn assert_valid_jwt(&self) -> &Self;

    /// Assert the header `kid`
    fn assert_signed_by(&self, key_id: &str) -> &Self;

    /// Assert the token expires within the specified seconds (5s tolerance)
    fn assert_expires_in(&self, seconds: u64) -> &Self;

    /// Assert the `sub` claim
    fn assert_for_subject(&self, subject: &str) -> &Self;

    /// Assert the `userId` claim
    fn assert_user_id(&self, user_id: i64) -> &Self;

    /// Assert the `roles` claim
    fn assert_role(&self, role: &str) -> &Self;

    /// Decoded payload
    fn claims(&self) -> Value;
}

fn strip_bearer(token: &str) -> &str {
    token.strip_prefix("Bearer ").unwrap_or(token)
}

fn segment(token: &str, index: usize) -> Vec<u8> {
    let part = strip_bearer(token)
        .split('.')
        .nth(index)
        .unwrap_or_else(|| panic!("JWT has no segment {}", index));
    URL_SAFE_NO_PAD
        .decode(part)
        .unwrap_or_else(|e| panic!("JWT segment {} is not base64url: {}", index, e))
}

fn header(token: &str) -> JwtHeader {
    serde_json::from_slice(&segment(token, 0)).expect("Failed to parse JWT header")
}

impl TokenAssertions for String {
    fn assert_valid_jwt(&self) -> &Self {
        self.as_str().assert_valid_jwt();
        self
    }

    fn assert_signed_by(&self, key_id: &str) -> &Self {
        self.as_str().assert_signed_by(key_id);
        self
    }

    fn assert_expires_in(&self, seconds: u64) -> &Self {
        self.as_str().assert_expires_in(seconds);
        self
    }

    fn assert_for_subject(&self, subject: &str) -> &Self {
        self.as_str().assert_for_subject(subject);
        self
    }

    fn assert_user_id(&self, user_id: i64) -> &Self {
        self.as_str().assert_user_id(user_id);
        self
    }

    fn assert_role(&self, role: &str) -> &Self {
        self.as_str().assert_role(role);
        self
    }

    fn claims(&self) -> Value {
        self.as_str().claims()
    }
}

impl TokenAssertions for str {
    fn assert_valid_jwt(&self) -> &Self {
        let parts = strip_bearer(self).split('.').count();
        assert_eq!(
            parts, 3,
            "JWT must have 3 parts (header.payload.signature), got {}",
            parts
        );

        let header = header(self);
        assert_eq!(header.alg, "RS256", "Expected RS256 algorithm");
        assert_eq!(header.typ, "JWT", "Expected JWT type");

        let claims = self.claims();
        assert!(claims.is_object(), "JWT payload must be a JSON object");
        self
    }

    fn assert_signed_by(&self, key_id: &str) -> &Self {
        let kid = header(self).kid;
        assert_eq!(
            kid.as_deref(),
            Some(key_id),
            "Expected key_id '{}', got {:?}",
            key_id,
            kid
        );
        self
    }

    fn assert_expires_in(&self, seconds: u64) -> &Self {
        let exp = self.claims()["exp"].as_i64().expect("exp must be an integer");
        let expires_in = exp - chrono::Utc::now().timestamp();
        assert!(
            (expires_in - seconds as i64).abs() <= 5,
            "Expected token to expire in {} seconds, but expires in {} seconds",
            seconds,
            expires_in
        );
        self
    }

    fn assert_for_subject(&self, subject: &str) -> &Self {
        let claims = self.claims();
        assert_eq!(claims["sub"], subject, "Unexpected subject");
        self
    }

    fn assert_user_id(&self, user_id: i64) -> &Self {
        let claims = self.claims();
        assert_eq!(claims["userId"], user_id, "Unexpected userId");
        self
    }

    fn assert_role(&self, role: &str) -> &Self {
        let claims = self.claims();
        assert_eq!(claims["roles"], role, "Unexpected role");
        self
    }

    fn claims(&self) -> Value {
        serde_json::from_slice(&segment(self, 1)).expect("Failed to parse JWT claims")
    }
}
