use crate::errors::AuthError;
use crate::middleware::AuthenticatedUser;
use crate::models::{DeleteAccountRequest, MessageResponse, SignupRequest, UserInfoResponse};
use crate::routes::AppState;
use crate::services::accounts;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use std::sync::Arc;
use tracing::instrument;

/// Handle signup
///
/// POST /api/users/signup
#[instrument(skip_all, name = "auth.handler.signup")]
pub async fn handle_signup(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SignupRequest>,
) -> Result<(StatusCode, Json<UserInfoResponse>), AuthError> {
    let principal = accounts::register(
        state.store.as_ref(),
        &payload.email,
        &payload.password,
        state.config.bcrypt_cost,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(principal.into())))
}

/// Identity of the caller as established by the gateway
///
/// GET /api/users/me
#[instrument(skip_all, name = "auth.handler.get_me")]
pub async fn handle_get_me(
    Extension(user): Extension<AuthenticatedUser>,
) -> Json<UserInfoResponse> {
    Json(UserInfoResponse {
        id: user.user_id,
        email: user.email,
        role: user.role,
    })
}

/// Delete the caller's account
///
/// DELETE /api/users/me
#[instrument(skip_all, name = "auth.handler.delete_me")]
pub async fn handle_delete_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(payload): Json<DeleteAccountRequest>,
) -> Result<Json<MessageResponse>, AuthError> {
    accounts::delete_account(state.store.as_ref(), user.user_id, &payload.password).await?;

    Ok(Json(MessageResponse {
        message: "Account deleted".to_string(),
    }))
}

/// Internal principal lookup for sibling services
///
/// GET /internal/users/:id
#[instrument(skip_all, name = "auth.handler.internal_user")]
pub async fn handle_get_internal_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> Result<Json<UserInfoResponse>, AuthError> {
    let user = state
        .store
        .find_by_id(user_id)
        .await?
        .ok_or(AuthError::NotFound)?;

    Ok(Json(user.principal().into()))
}
