//! Request gateway.
//!
//! Runs once per request, before any handler:
//!
//! 1. Client-supplied identity headers are dropped.
//! 2. `OPTIONS` and allow-listed paths pass through unauthenticated.
//! 3. Anything else needs `Authorization: Bearer <access token>`. The token is
//!    verified and its subject must still resolve to the same principal.
//! 4. The identity is attached as [`AuthenticatedUser`] in request extensions
//!    and as `X-User-Id` / `X-User-Role` headers.

use super::public_paths::PublicPaths;
use crate::errors::AuthError;
use crate::models::Role;
use crate::observability::metrics::record_gateway_decision;
use crate::repositories::UserStore;
use crate::services::TokenVerifier;
use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap, HeaderValue, Method},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::instrument;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Identity established by the gateway for the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: i64,
    pub email: String,
    pub role: Role,
}

/// State for the gateway middleware.
#[derive(Clone)]
pub struct GatewayState {
    pub verifier: TokenVerifier,
    pub store: Arc<dyn UserStore>,
    pub public_paths: PublicPaths,
}

#[instrument(skip_all, name = "auth.gateway", fields(path = %req.uri().path()))]
pub async fn authenticate(
    State(state): State<Arc<GatewayState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let headers = req.headers_mut();
    headers.remove(USER_ID_HEADER);
    headers.remove(USER_ROLE_HEADER);

    if req.method() == Method::OPTIONS {
        record_gateway_decision("preflight");
        return Ok(next.run(req).await);
    }

    if state.public_paths.matches(req.uri().path()) {
        record_gateway_decision("public");
        return Ok(next.run(req).await);
    }

    let user = match identify(&state, req.headers()).await {
        Ok(user) => user,
        Err(e) => {
            record_gateway_decision("rejected");
            return Err(e);
        }
    };

    let headers = req.headers_mut();
    headers.insert(USER_ID_HEADER, HeaderValue::from(user.user_id));
    headers.insert(USER_ROLE_HEADER, HeaderValue::from_static(user.role.as_str()));
    req.extensions_mut().insert(user);

    record_gateway_decision("authenticated");
    Ok(next.run(req).await)
}

async fn identify(
    state: &GatewayState,
    headers: &HeaderMap,
) -> Result<AuthenticatedUser, AuthError> {
    let token = extract_bearer_token(headers)?;
    let claims = state.verifier.parse_access_token(token)?;

    // The token may outlive its principal, or the email may have been
    // re-registered under a new id.
    let user = state
        .store
        .find_by_email(claims.email())
        .await?
        .filter(|user| user.user_id == claims.user_id())
        .ok_or_else(|| {
            tracing::debug!(target: "auth.gateway", "Token subject no longer resolves");
            AuthError::PrincipalNotFound
        })?;

    Ok(AuthenticatedUser {
        user_id: user.user_id,
        email: user.email,
        role: user.role,
    })
}

fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            tracing::debug!(target: "auth.gateway", "Missing Authorization header");
            AuthError::AuthenticationRequired
        })?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            tracing::debug!(target: "auth.gateway", "Invalid Authorization header format");
            AuthError::AuthenticationRequired
        })
}
