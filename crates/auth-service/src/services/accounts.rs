//! Principal creation and removal.

use crate::crypto;
use crate::errors::AuthError;
use crate::models::{normalize_email, NewUser, Principal, Role};
use crate::repositories::UserStore;
use common::secret::{ExposeSecret, SecretString};
use tracing::instrument;

const MIN_PASSWORD_LEN: usize = 8;

/// Register a new `USER` principal.
#[instrument(skip_all, name = "auth.accounts.register")]
pub async fn register(
    store: &dyn UserStore,
    email: &str,
    password: &SecretString,
    bcrypt_cost: u32,
) -> Result<Principal, AuthError> {
    let email = normalize_email(email);
    if email.is_empty() || !email.contains('@') {
        return Err(AuthError::InvalidRequest("A valid email is required".to_string()));
    }
    if password.expose_secret().chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::InvalidRequest(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    let password = password.expose_secret().to_string();
    let password_hash =
        tokio::task::spawn_blocking(move || crypto::hash_password(&password, bcrypt_cost))
            .await
            .map_err(|e| {
                tracing::error!(target: "auth.accounts", error = %e, "Password hash task failed");
                AuthError::Internal
            })??;

    let user = store
        .create_user(NewUser {
            email,
            password_hash,
            role: Role::User,
        })
        .await?;

    tracing::info!(target: "auth.accounts", user_id = user.user_id, "User registered");
    Ok(user.principal())
}

/// Delete a principal after re-checking its password.
///
/// Outstanding access tokens stop working at the gateway's principal lookup.
#[instrument(skip_all, name = "auth.accounts.delete")]
pub async fn delete_account(
    store: &dyn UserStore,
    user_id: i64,
    password: &SecretString,
) -> Result<(), AuthError> {
    let user = store
        .find_by_id(user_id)
        .await?
        .ok_or(AuthError::PrincipalNotFound)?;

    let password = password.expose_secret().to_string();
    let hash = user.password_hash.clone();
    let password_ok = tokio::task::spawn_blocking(move || crypto::verify_password(&password, &hash))
        .await
        .map_err(|e| {
            tracing::error!(target: "auth.accounts", error = %e, "Password check task failed");
            AuthError::Internal
        })??;

    if !password_ok {
        return Err(AuthError::InvalidCredentials);
    }

    store.delete_user(user_id).await?;
    tracing::info!(target: "auth.accounts", user_id = user_id, "User deleted");
    Ok(())
}
