use crate::config::Config;
use crate::crypto::{self, AccessClaims, KeyStore, RefreshClaims};
use crate::errors::AuthError;
use crate::observability::metrics::record_token_validation;
use crate::observability::ErrorCategory;
use jsonwebtoken::Validation;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

/// Parses and validates tokens minted by [`super::TokenIssuer`].
///
/// Access tokens must carry the configured issuer and audience. Refresh
/// tokens carry neither and are checked for signature, expiry and shape only;
/// their real validity is decided against the persisted slot.
#[derive(Clone)]
pub struct TokenVerifier {
    keys: Arc<KeyStore>,
    access_validation: Validation,
    refresh_validation: Validation,
    clock_skew: Duration,
}

impl TokenVerifier {
    pub fn new(keys: Arc<KeyStore>, config: &Config) -> Self {
        Self {
            keys,
            access_validation: crypto::access_token_validation(&config.issuer, &config.audience),
            refresh_validation: crypto::refresh_token_validation(),
            clock_skew: config.clock_skew,
        }
    }

    #[instrument(skip_all, name = "auth.token.parse_access")]
    pub fn parse_access_token(&self, token: &str) -> Result<AccessClaims, AuthError> {
        let result =
            crypto::verify_jwt(token, &self.keys, &self.access_validation, self.clock_skew);
        record_outcome("access", &result);
        result
    }

    #[instrument(skip_all, name = "auth.token.parse_refresh")]
    pub fn parse_refresh_token(&self, token: &str) -> Result<RefreshClaims, AuthError> {
        let result =
            crypto::verify_jwt(token, &self.keys, &self.refresh_validation, self.clock_skew);
        record_outcome("refresh", &result);
        result
    }
}

fn record_outcome<T>(kind: &'static str, result: &Result<T, AuthError>) {
    match result {
        Ok(_) => record_token_validation(kind, "success", None),
        Err(e) => record_token_validation(kind, "error", Some(ErrorCategory::from(e).as_str())),
    }
}
