//! E2E tests for signup, the caller's own account, and the internal lookup.

use crate::helpers::{error_code, get_with_auth, login, post_login, post_refresh};
use auth_service::models::Role;
use auth_service::repositories::UserStore;
use auth_test_utils::*;
use reqwest::StatusCode;
use serde_json::{json, Value};

async fn post_signup(
    server: &TestAuthServer,
    email: &str,
    password: &str,
) -> Result<reqwest::Response, anyhow::Error> {
    Ok(reqwest::Client::new()
        .post(format!("{}/api/users/signup", server.url()))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await?)
}

async fn delete_me(
    server: &TestAuthServer,
    access_token: &str,
    password: &str,
) -> Result<reqwest::Response, anyhow::Error> {
    Ok(reqwest::Client::new()
        .delete(format!("{}/api/users/me", server.url()))
        .header("Authorization", access_token)
        .json(&json!({ "password": password }))
        .send()
        .await?)
}

// ============================================================================
// Signup
// ============================================================================

#[tokio::test]
async fn test_signup_happy_path_creates_user() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestAuthServer::spawn_with_env(&[("BCRYPT_COST", "10")]).await?;

    // Act
    let response = post_signup(&server, " Carol@Example.com", TEST_PASSWORD).await?;

    // Assert
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await?;
    assert_eq!(body["email"], "carol@example.com");
    assert_eq!(body["role"], "USER");
    assert!(body["id"].as_i64().is_some());

    let tokens = login(&server, "carol@example.com", TEST_PASSWORD).await?;
    tokens.access_token.assert_for_subject("carol@example.com");

    Ok(())
}

#[tokio::test]
async fn test_signup_duplicate_email_rejected() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    server
        .create_user(TEST_EMAIL_ALICE, TEST_PASSWORD, Role::User)
        .await?;

    let response = post_signup(&server, "ALICE@example.com", TEST_PASSWORD).await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(response).await?, "INVALID_REQUEST");
    Ok(())
}

#[tokio::test]
async fn test_signup_invalid_input_rejected() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;

    let bad_email = post_signup(&server, "not-an-email", TEST_PASSWORD).await?;
    let short_password = post_signup(&server, "dave@example.com", "short").await?;

    assert_eq!(bad_email.status(), StatusCode::BAD_REQUEST);
    assert_eq!(short_password.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

// ============================================================================
// Own account
// ============================================================================

/// Deleting an account needs the password, then the principal's tokens stop
/// working at the gateway and for refresh.
#[tokio::test]
async fn test_delete_me_revokes_tokens() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestAuthServer::spawn().await?;
    let alice = server
        .create_user(TEST_EMAIL_ALICE, TEST_PASSWORD, Role::User)
        .await?;
    let tokens = login(&server, TEST_EMAIL_ALICE, TEST_PASSWORD).await?;

    // Act
    let wrong = delete_me(&server, &tokens.access_token, TEST_WRONG_PASSWORD).await?;
    let right = delete_me(&server, &tokens.access_token, TEST_PASSWORD).await?;

    // Assert
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(wrong).await?, "INVALID_CREDENTIALS");
    assert_eq!(right.status(), StatusCode::OK);
    assert!(server.store().find_by_id(alice.user_id).await?.is_none());

    let me = get_with_auth(&server, "/api/users/me", &tokens.access_token).await?;
    assert_eq!(me.status(), StatusCode::UNAUTHORIZED);
    let refresh = post_refresh(&server, &tokens.refresh_token).await?;
    assert_eq!(refresh.status(), StatusCode::UNAUTHORIZED);
    let relogin = post_login(&server, TEST_EMAIL_ALICE, TEST_PASSWORD).await?;
    assert_eq!(relogin.status(), StatusCode::UNAUTHORIZED);

    Ok(())
}

// ============================================================================
// Internal lookup
// ============================================================================

#[tokio::test]
async fn test_internal_user_lookup() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestAuthServer::spawn().await?;
    let bob = server
        .create_user(TEST_EMAIL_BOB, TEST_PASSWORD, Role::Admin)
        .await?;
    let client = reqwest::Client::new();

    // Act
    let found = client
        .get(format!("{}/internal/users/{}", server.url(), bob.user_id))
        .send()
        .await?;
    let missing = client
        .get(format!("{}/internal/users/{}", server.url(), bob.user_id + 1000))
        .send()
        .await?;

    // Assert
    assert_eq!(found.status(), StatusCode::OK);
    let body: Value = found.json().await?;
    assert_eq!(
        body,
        json!({ "id": bob.user_id, "email": TEST_EMAIL_BOB, "role": "ADMIN" })
    );
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_code(missing).await?, "NOT_FOUND");

    Ok(())
}
