//! E2E tests for login, refresh-token rotation and logout.
//!
//! ## Test Naming
//!
//! Tests follow the convention: `test_<feature>_<scenario>_<expected_result>`

use crate::helpers::{error_code, get_with_auth, login, post_login, post_refresh, string_field};
use auth_service::models::Role;
use auth_test_utils::*;
use reqwest::StatusCode;
use serde_json::Value;

// ============================================================================
// Login
// ============================================================================

/// Login returns a bearer-prefixed access token and a distinct refresh token,
/// and persists the refresh token as the principal's only session.
#[tokio::test]
async fn test_login_happy_path_returns_token_pair() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestAuthServer::spawn().await?;
    let alice = server
        .create_user(TEST_EMAIL_ALICE, TEST_PASSWORD, Role::User)
        .await?;

    // Act
    let response = post_login(&server, TEST_EMAIL_ALICE, TEST_PASSWORD).await?;

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await?;
    assert_eq!(body["message"], "Login successful");

    let access_token = string_field(&body, "accessToken")?;
    let refresh_token = string_field(&body, "refreshToken")?;
    assert!(access_token.starts_with("Bearer "));
    assert_ne!(access_token.trim_start_matches("Bearer "), refresh_token);

    access_token
        .assert_valid_jwt()
        .assert_signed_by(TEST_KEY_ID)
        .assert_for_subject(TEST_EMAIL_ALICE)
        .assert_user_id(alice.user_id)
        .assert_role("USER")
        .assert_expires_in(30 * 60);
    refresh_token
        .assert_valid_jwt()
        .assert_user_id(alice.user_id)
        .assert_expires_in(14 * 24 * 3600);

    assert_eq!(
        server.stored_refresh_token(alice.user_id).await?,
        Some(refresh_token)
    );

    Ok(())
}

#[tokio::test]
async fn test_login_email_is_case_insensitive() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    server
        .create_user(TEST_EMAIL_ALICE, TEST_PASSWORD, Role::User)
        .await?;

    let response = post_login(&server, "  Alice@Example.COM ", TEST_PASSWORD).await?;

    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

/// Wrong password and unknown email are indistinguishable.
#[tokio::test]
async fn test_login_bad_credentials_rejected_uniformly() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestAuthServer::spawn().await?;
    server
        .create_user(TEST_EMAIL_ALICE, TEST_PASSWORD, Role::User)
        .await?;

    // Act
    let wrong_password = post_login(&server, TEST_EMAIL_ALICE, TEST_WRONG_PASSWORD).await?;
    let unknown_email = post_login(&server, "nobody@example.com", TEST_PASSWORD).await?;

    // Assert
    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email.status(), StatusCode::UNAUTHORIZED);

    let a: Value = wrong_password.json().await?;
    let b: Value = unknown_email.json().await?;
    assert_eq!(a, b, "Responses must not reveal whether the email exists");
    assert_eq!(a["error"]["code"], "INVALID_CREDENTIALS");

    Ok(())
}

// ============================================================================
// Refresh
// ============================================================================

/// A refresh returns a new pair for the same principal and rotates the slot.
#[tokio::test]
async fn test_refresh_happy_path_rotates_token() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestAuthServer::spawn().await?;
    let alice = server
        .create_user(TEST_EMAIL_ALICE, TEST_PASSWORD, Role::User)
        .await?;
    let tokens = login(&server, TEST_EMAIL_ALICE, TEST_PASSWORD).await?;

    // Act
    let response = post_refresh(&server, &tokens.refresh_token).await?;

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await?;
    let access_token = string_field(&body, "accessToken")?;
    let refresh_token = string_field(&body, "refreshToken")?;

    assert!(access_token.starts_with("Bearer "));
    access_token.assert_user_id(alice.user_id);
    assert_ne!(refresh_token, tokens.refresh_token);
    assert_eq!(
        server.stored_refresh_token(alice.user_id).await?,
        Some(refresh_token)
    );

    Ok(())
}

/// A rotated-out refresh token fails even though it has not expired.
#[tokio::test]
async fn test_refresh_replayed_token_rejected() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestAuthServer::spawn().await?;
    server
        .create_user(TEST_EMAIL_ALICE, TEST_PASSWORD, Role::User)
        .await?;
    let tokens = login(&server, TEST_EMAIL_ALICE, TEST_PASSWORD).await?;
    let first = post_refresh(&server, &tokens.refresh_token).await?;
    assert_eq!(first.status(), StatusCode::OK);

    // Act
    let replay = post_refresh(&server, &tokens.refresh_token).await?;

    // Assert
    assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(replay).await?, "INVALID_TOKEN");

    Ok(())
}

/// A second login overwrites the slot; the first session can no longer rotate.
#[tokio::test]
async fn test_refresh_after_second_login_first_token_rejected() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestAuthServer::spawn().await?;
    server
        .create_user(TEST_EMAIL_ALICE, TEST_PASSWORD, Role::User)
        .await?;
    let first = login(&server, TEST_EMAIL_ALICE, TEST_PASSWORD).await?;
    let second = login(&server, TEST_EMAIL_ALICE, TEST_PASSWORD).await?;

    // Act
    let stale = post_refresh(&server, &first.refresh_token).await?;
    let current = post_refresh(&server, &second.refresh_token).await?;

    // Assert
    assert_eq!(stale.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(current.status(), StatusCode::OK);

    Ok(())
}

/// Concurrent refreshes with the same token: exactly one wins.
#[tokio::test]
async fn test_refresh_concurrent_same_token_single_winner() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestAuthServer::spawn().await?;
    server
        .create_user(TEST_EMAIL_ALICE, TEST_PASSWORD, Role::User)
        .await?;
    let tokens = login(&server, TEST_EMAIL_ALICE, TEST_PASSWORD).await?;

    // Act
    let attempts = futures::future::join_all(
        (0..8).map(|_| post_refresh(&server, &tokens.refresh_token)),
    )
    .await;

    // Assert
    let mut ok = 0;
    for attempt in attempts {
        let status = attempt?.status();
        if status == StatusCode::OK {
            ok += 1;
        } else {
            assert_eq!(status, StatusCode::UNAUTHORIZED);
        }
    }
    assert_eq!(ok, 1, "Exactly one refresh must succeed");

    Ok(())
}

#[tokio::test]
async fn test_refresh_with_access_token_rejected() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    server
        .create_user(TEST_EMAIL_ALICE, TEST_PASSWORD, Role::User)
        .await?;
    let tokens = login(&server, TEST_EMAIL_ALICE, TEST_PASSWORD).await?;
    let raw_access = tokens.access_token.trim_start_matches("Bearer ");

    let response = post_refresh(&server, raw_access).await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(response).await?, "INVALID_TOKEN");
    Ok(())
}

#[tokio::test]
async fn test_refresh_foreign_signed_token_rejected() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    let alice = server
        .create_user(TEST_EMAIL_ALICE, TEST_PASSWORD, Role::User)
        .await?;
    let forged = TestTokenBuilder::for_principal(&alice)
        .without_claim("roles")
        .without_claim("iss")
        .without_claim("aud")
        .sign(&foreign_encoding_key());

    let response = post_refresh(&server, &forged).await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(response).await?, "INVALID_TOKEN");
    Ok(())
}

// ============================================================================
// Logout
// ============================================================================

/// Logout clears the slot; the refresh token stops working; a second logout
/// with a still-valid access token is fine.
#[tokio::test]
async fn test_logout_clears_session_and_is_idempotent() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestAuthServer::spawn().await?;
    let alice = server
        .create_user(TEST_EMAIL_ALICE, TEST_PASSWORD, Role::User)
        .await?;
    let tokens = login(&server, TEST_EMAIL_ALICE, TEST_PASSWORD).await?;
    let client = reqwest::Client::new();
    let logout = || {
        client
            .post(format!("{}/api/auth/logout", server.url()))
            .header("Authorization", &tokens.access_token)
            .send()
    };

    // Act
    let first = logout().await?;
    let second = logout().await?;

    // Assert
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::OK);
    let body: Value = first.json().await?;
    assert_eq!(body["message"], "Logout successful");

    assert_eq!(server.stored_refresh_token(alice.user_id).await?, None);
    let refresh = post_refresh(&server, &tokens.refresh_token).await?;
    assert_eq!(refresh.status(), StatusCode::UNAUTHORIZED);

    // Access tokens are not revocable; they stay valid until expiry.
    let me = get_with_auth(&server, "/api/users/me", &tokens.access_token).await?;
    assert_eq!(me.status(), StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn test_logout_without_token_rejected() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;

    let response = reqwest::Client::new()
        .post(format!("{}/api/auth/logout", server.url()))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(response).await?, "AUTHENTICATION_REQUIRED");
    Ok(())
}
