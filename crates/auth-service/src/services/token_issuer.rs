use crate::config::Config;
use crate::crypto::{self, AccessClaims, KeyStore, RefreshClaims};
use crate::errors::AuthError;
use crate::models::Principal;
use crate::observability::metrics::record_token_issued;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// Mints signed access and refresh tokens. Has no side effects beyond signing.
#[derive(Clone)]
pub struct TokenIssuer {
    keys: Arc<KeyStore>,
    issuer: String,
    audience: String,
    access_ttl_seconds: i64,
    refresh_ttl_seconds: i64,
}

impl TokenIssuer {
    pub fn new(keys: Arc<KeyStore>, config: &Config) -> Self {
        Self {
            keys,
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            access_ttl_seconds: config.access_token_ttl_seconds,
            refresh_ttl_seconds: config.refresh_token_ttl_seconds,
        }
    }

    /// `{sub: email, userId, roles, iss, aud, iat: now, exp: now + access TTL}`
    pub fn issue_access_token(&self, principal: &Principal) -> Result<String, AuthError> {
        self.issue_access_token_at(principal, Utc::now().timestamp())
    }

    /// `{sub: email, userId, iat: now, exp: now + refresh TTL}`
    pub fn issue_refresh_token(&self, principal: &Principal) -> Result<String, AuthError> {
        self.issue_refresh_token_at(principal, Utc::now().timestamp())
    }

    pub(crate) fn issue_access_token_at(
        &self,
        principal: &Principal,
        now: i64,
    ) -> Result<String, AuthError> {
        let claims = AccessClaims {
            sub: principal.email.clone(),
            user_id: principal.user_id,
            roles: principal.role,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: now,
            exp: expiry(now, self.access_ttl_seconds)?,
            jti: Uuid::new_v4().to_string(),
        };

        let token = crypto::sign_jwt(&claims, &self.keys)?;
        record_token_issued("access");
        Ok(token)
    }

    pub(crate) fn issue_refresh_token_at(
        &self,
        principal: &Principal,
        now: i64,
    ) -> Result<String, AuthError> {
        let claims = RefreshClaims {
            sub: principal.email.clone(),
            user_id: principal.user_id,
            iat: now,
            exp: expiry(now, self.refresh_ttl_seconds)?,
            jti: Uuid::new_v4().to_string(),
        };

        let token = crypto::sign_jwt(&claims, &self.keys)?;
        record_token_issued("refresh");
        Ok(token)
    }
}

fn expiry(now: i64, ttl_seconds: i64) -> Result<i64, AuthError> {
    now.checked_add(ttl_seconds).ok_or_else(|| {
        tracing::error!(target: "auth.token", ttl_seconds, "Token expiry overflows");
        AuthError::Internal
    })
}
