//! Session lifecycle: login, refresh-token rotation, logout.
//!
//! Per principal there are two states. NoSession: the refresh-token slot is
//! empty. ActiveSession: the slot holds exactly one token. Login always moves
//! to ActiveSession (overwriting), a successful refresh stays there with a
//! new token, logout moves to NoSession.

use super::{TokenIssuer, TokenVerifier};
use crate::crypto::{self, DUMMY_PASSWORD_HASH};
use crate::errors::AuthError;
use crate::models::{normalize_email, Principal};
use crate::observability::hash_for_correlation;
use crate::observability::metrics::{record_login, record_logout, record_refresh_rotation};
use crate::repositories::UserStore;
use common::secret::{ExposeSecret, SecretString};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;

/// A freshly minted access/refresh token pair.
#[derive(Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .finish()
    }
}

#[derive(Clone)]
pub struct RefreshCoordinator {
    store: Arc<dyn UserStore>,
    issuer: TokenIssuer,
    verifier: TokenVerifier,
}

impl RefreshCoordinator {
    pub fn new(store: Arc<dyn UserStore>, issuer: TokenIssuer, verifier: TokenVerifier) -> Self {
        Self {
            store,
            issuer,
            verifier,
        }
    }

    /// Authenticate by email and password, mint a pair, and persist the
    /// refresh token over whatever was there before.
    #[instrument(skip_all, name = "auth.session.login")]
    pub async fn login(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<(Principal, TokenPair), AuthError> {
        let start = Instant::now();
        let result = self.login_inner(email, password).await;
        record_login(
            if result.is_ok() { "success" } else { "error" },
            start.elapsed(),
        );
        result
    }

    async fn login_inner(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<(Principal, TokenPair), AuthError> {
        let email = normalize_email(email);
        let user = self.store.find_by_email(&email).await?;

        // Always run bcrypt so unknown emails cost the same as wrong passwords.
        let hash = user
            .as_ref()
            .map_or_else(|| DUMMY_PASSWORD_HASH.to_string(), |u| u.password_hash.clone());
        let password = password.expose_secret().to_string();
        let password_ok =
            tokio::task::spawn_blocking(move || crypto::verify_password(&password, &hash))
                .await
                .map_err(|e| {
                    tracing::error!(target: "auth.session", error = %e, "Password check task failed");
                    AuthError::Internal
                })??;

        let user = match user {
            Some(user) if password_ok => user,
            _ => {
                tracing::info!(
                    target: "auth.session",
                    email_hash = %hash_for_correlation(&email),
                    "Login rejected"
                );
                return Err(AuthError::InvalidCredentials);
            }
        };

        let principal = user.principal();
        let pair = self.issue_pair(&principal)?;
        let stored = self
            .store
            .store_refresh_token(principal.user_id, Some(&pair.refresh_token))
            .await?;
        if !stored {
            tracing::warn!(
                target: "auth.session",
                user_id = principal.user_id,
                "Principal removed during login"
            );
            return Err(AuthError::PrincipalNotFound);
        }

        tracing::info!(
            target: "auth.session",
            user_id = principal.user_id,
            "Login succeeded"
        );
        Ok((principal, pair))
    }

    /// Exchange a refresh token for a new pair.
    ///
    /// The presented token must verify, its subject must still exist, and it
    /// must equal the persisted token. The swap to the new token is a
    /// compare-and-swap in the store, so of two concurrent calls with the same
    /// token exactly one succeeds.
    #[instrument(skip_all, name = "auth.session.refresh")]
    pub async fn refresh(&self, presented: &str) -> Result<TokenPair, AuthError> {
        let result = self.refresh_inner(presented).await;
        record_refresh_rotation(match &result {
            Ok(_) => "rotated",
            Err(AuthError::RefreshMismatch) => "mismatch",
            Err(AuthError::PrincipalNotFound) => "principal_not_found",
            Err(AuthError::TokenInvalid(_)) => "invalid",
            Err(_) => "error",
        });
        result
    }

    async fn refresh_inner(&self, presented: &str) -> Result<TokenPair, AuthError> {
        let claims = self
            .verifier
            .parse_refresh_token(presented)
            .map_err(|e| match e {
                // An expired refresh token is a dead session; the client must log in again.
                AuthError::TokenExpired => {
                    AuthError::TokenInvalid("refresh token expired".to_string())
                }
                other => other,
            })?;

        let user = self
            .store
            .find_by_email(claims.email())
            .await?
            .filter(|u| u.user_id == claims.user_id())
            .ok_or(AuthError::PrincipalNotFound)?;

        if user.refresh_token.as_deref() != Some(presented) {
            tracing::warn!(
                target: "auth.session",
                user_id = user.user_id,
                has_session = user.refresh_token.is_some(),
                "Refresh token does not match persisted value"
            );
            return Err(AuthError::RefreshMismatch);
        }

        let principal = user.principal();
        let pair = self.issue_pair(&principal)?;

        let rotated = self
            .store
            .rotate_refresh_token(principal.user_id, presented, &pair.refresh_token)
            .await?;
        if !rotated {
            tracing::warn!(
                target: "auth.session",
                user_id = principal.user_id,
                "Lost refresh rotation race"
            );
            return Err(AuthError::RefreshMismatch);
        }

        tracing::debug!(target: "auth.session", user_id = principal.user_id, "Refresh token rotated");
        Ok(pair)
    }

    /// Clear the persisted refresh token. Logging out twice is not an error.
    #[instrument(skip_all, name = "auth.session.logout")]
    pub async fn logout(&self, user_id: i64) -> Result<(), AuthError> {
        // A missing principal has no session to clear.
        let _ = self.store.store_refresh_token(user_id, None).await?;
        record_logout();
        tracing::info!(target: "auth.session", user_id = user_id, "Logged out");
        Ok(())
    }

    fn issue_pair(&self, principal: &Principal) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access_token: self.issuer.issue_access_token(principal)?,
            refresh_token: self.issuer.issue_refresh_token(principal)?,
        })
    }
}
