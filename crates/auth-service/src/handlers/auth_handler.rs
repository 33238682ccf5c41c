use crate::errors::AuthError;
use crate::middleware::AuthenticatedUser;
use crate::models::{LoginRequest, LoginResponse, MessageResponse, RefreshRequest, TokenPairResponse};
use crate::routes::AppState;
use axum::{extract::State, Extension, Json};
use common::secret::ExposeSecret;
use std::sync::Arc;
use tracing::instrument;

/// Handle login
///
/// POST /api/auth/login
#[instrument(skip_all, name = "auth.handler.login")]
pub async fn handle_login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AuthError> {
    let (_, pair) = state
        .sessions
        .login(&payload.email, &payload.password)
        .await?;

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        access_token: bearer(&pair.access_token),
        refresh_token: pair.refresh_token,
    }))
}

/// Handle logout for the authenticated caller
///
/// POST /api/auth/logout
#[instrument(skip_all, name = "auth.handler.logout")]
pub async fn handle_logout(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<MessageResponse>, AuthError> {
    state.sessions.logout(user.user_id).await?;

    Ok(Json(MessageResponse {
        message: "Logout successful".to_string(),
    }))
}

/// Handle refresh-token rotation
///
/// POST /api/auth/refresh
#[instrument(skip_all, name = "auth.handler.refresh")]
pub async fn handle_refresh(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<TokenPairResponse>, AuthError> {
    let pair = state
        .sessions
        .refresh(payload.refresh_token.expose_secret())
        .await?;

    Ok(Json(TokenPairResponse {
        access_token: bearer(&pair.access_token),
        refresh_token: pair.refresh_token,
    }))
}

fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}
