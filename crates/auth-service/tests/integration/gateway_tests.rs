//! E2E tests for the request gateway.
//!
//! Every route sits behind the gateway. Public paths pass without a token;
//! everything else needs a valid access token for a principal that still
//! exists.

use crate::helpers::{error_code, get_with_auth, login};
use auth_service::models::Role;
use auth_service::repositories::UserStore;
use auth_test_utils::*;
use chrono::Utc;
use reqwest::StatusCode;
use serde_json::{json, Value};

// ============================================================================
// Public paths
// ============================================================================

#[tokio::test]
async fn test_gateway_public_paths_need_no_token() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    let client = reqwest::Client::new();

    for path in [
        "/health",
        "/jwks",
        "/.well-known/jwks.json",
        "/.well-known/openid-configuration",
    ] {
        let response = client.get(format!("{}{}", server.url(), path)).send().await?;
        assert_eq!(response.status(), StatusCode::OK, "{} should be public", path);
    }

    Ok(())
}

/// Protected paths, including ones with no route, reject a missing header
/// before any routing decision is visible.
#[tokio::test]
async fn test_gateway_protected_paths_require_token() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    let client = reqwest::Client::new();

    for path in ["/api/users/me", "/api/orders/1", "/"] {
        let response = client.get(format!("{}{}", server.url(), path)).send().await?;
        assert_eq!(
            response.status(),
            StatusCode::UNAUTHORIZED,
            "{} should be protected",
            path
        );
        assert_eq!(
            response
                .headers()
                .get("www-authenticate")
                .and_then(|v| v.to_str().ok()),
            Some("Bearer")
        );
        assert_eq!(error_code(response).await?, "AUTHENTICATION_REQUIRED");
    }

    Ok(())
}

#[tokio::test]
async fn test_gateway_configured_public_paths_override_defaults() -> Result<(), anyhow::Error> {
    // Arrange
    let server =
        TestAuthServer::spawn_with_env(&[("PUBLIC_PATHS", "/health,/.well-known/*.json")]).await?;
    let client = reqwest::Client::new();

    // Act
    let jwks_alias = client.get(format!("{}/jwks", server.url())).send().await?;
    let jwks = client
        .get(format!("{}/.well-known/jwks.json", server.url()))
        .send()
        .await?;
    let openid = client
        .get(format!("{}/.well-known/openid-configuration", server.url()))
        .send()
        .await?;

    // Assert
    assert_eq!(jwks_alias.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(jwks.status(), StatusCode::OK);
    assert_eq!(openid.status(), StatusCode::UNAUTHORIZED);

    Ok(())
}

// ============================================================================
// Authenticated requests
// ============================================================================

#[tokio::test]
async fn test_gateway_valid_token_attaches_identity() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestAuthServer::spawn().await?;
    let admin = server
        .create_user(TEST_EMAIL_ADMIN, TEST_PASSWORD, Role::Admin)
        .await?;
    let tokens = login(&server, TEST_EMAIL_ADMIN, TEST_PASSWORD).await?;

    // Act
    let response = get_with_auth(&server, "/api/users/me", &tokens.access_token).await?;

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await?;
    assert_eq!(
        body,
        json!({ "id": admin.user_id, "email": TEST_EMAIL_ADMIN, "role": "ADMIN" })
    );

    Ok(())
}

#[tokio::test]
async fn test_gateway_malformed_header_rejected() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    server
        .create_user(TEST_EMAIL_ALICE, TEST_PASSWORD, Role::User)
        .await?;
    let tokens = login(&server, TEST_EMAIL_ALICE, TEST_PASSWORD).await?;
    let raw = tokens.access_token.trim_start_matches("Bearer ").to_string();

    for header in [raw.clone(), format!("Basic {raw}"), "Bearer".to_string()] {
        let response = get_with_auth(&server, "/api/users/me", &header).await?;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(error_code(response).await?, "AUTHENTICATION_REQUIRED");
    }

    Ok(())
}

#[tokio::test]
async fn test_gateway_expired_token_reports_expiry() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestAuthServer::spawn().await?;
    let alice = server
        .create_user(TEST_EMAIL_ALICE, TEST_PASSWORD, Role::User)
        .await?;
    let token = TestTokenBuilder::for_principal(&alice)
        .issued_at(Utc::now().timestamp() - 7200)
        .expires_in(-60)
        .sign_with_dev_key();

    // Act
    let response = get_with_auth(&server, "/api/users/me", &format!("Bearer {token}")).await?;

    // Assert
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(response).await?, "TOKEN_EXPIRED");

    Ok(())
}

/// Tokens the service did not mint, or minted for someone else, are invalid.
#[tokio::test]
async fn test_gateway_untrusted_tokens_rejected() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestAuthServer::spawn().await?;
    let alice = server
        .create_user(TEST_EMAIL_ALICE, TEST_PASSWORD, Role::User)
        .await?;
    let builder = || TestTokenBuilder::for_principal(&alice);

    let cases = [
        ("foreign key, service kid", builder().sign(&foreign_encoding_key())),
        ("foreign key, foreign kid", builder().sign_with_foreign_key()),
        ("wrong issuer", builder().with_issuer("https://evil.example.com").sign_with_dev_key()),
        ("wrong audience", builder().with_audience("billing").sign_with_dev_key()),
        ("missing audience", builder().without_claim("aud").sign_with_dev_key()),
        ("missing kid", builder().without_kid().sign_with_dev_key()),
        ("unknown kid", builder().with_kid("auth-key-2").sign_with_dev_key()),
        ("HS256", builder().sign_hs256(b"shared-secret")),
        (
            "iat far in future",
            builder()
                .issued_at(Utc::now().timestamp() + 3600)
                .expires_in(7200)
                .sign_with_dev_key(),
        ),
        ("garbage", "not.a.jwt".to_string()),
    ];

    // Act / Assert
    for (name, token) in cases {
        let response = get_with_auth(&server, "/api/users/me", &format!("Bearer {token}")).await?;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "case: {}", name);
        assert_eq!(error_code(response).await?, "INVALID_TOKEN", "case: {}", name);
    }

    Ok(())
}

#[tokio::test]
async fn test_gateway_oversized_token_rejected() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    let alice = server
        .create_user(TEST_EMAIL_ALICE, TEST_PASSWORD, Role::User)
        .await?;
    let token = TestTokenBuilder::for_principal(&alice)
        .with_claim("padding", json!("x".repeat(10_000)))
        .sign_with_dev_key();

    let response = get_with_auth(&server, "/api/users/me", &format!("Bearer {token}")).await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(response).await?, "INVALID_TOKEN");
    Ok(())
}

/// A principal deleted after issuance is reported the same way as a missing
/// header, without revealing that it ever existed.
#[tokio::test]
async fn test_gateway_deleted_principal_rejected() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestAuthServer::spawn().await?;
    let alice = server
        .create_user(TEST_EMAIL_ALICE, TEST_PASSWORD, Role::User)
        .await?;
    let token = TestTokenBuilder::for_principal(&alice).sign_with_dev_key();
    server.store().delete_user(alice.user_id).await?;

    // Act
    let response = get_with_auth(&server, "/api/users/me", &format!("Bearer {token}")).await?;

    // Assert
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(response).await?, "AUTHENTICATION_REQUIRED");

    Ok(())
}

/// The role comes from the store, not from the token.
#[tokio::test]
async fn test_gateway_identity_uses_stored_role() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    let alice = server
        .create_user(TEST_EMAIL_ALICE, TEST_PASSWORD, Role::User)
        .await?;
    let token = TestTokenBuilder::for_principal(&alice)
        .with_claim("roles", json!("ADMIN"))
        .sign_with_dev_key();

    let response = get_with_auth(&server, "/api/users/me", &format!("Bearer {token}")).await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await?;
    assert_eq!(body["role"], "USER");
    Ok(())
}

// ============================================================================
// CORS
// ============================================================================

#[tokio::test]
async fn test_gateway_cors_preflight_passes() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;

    let response = reqwest::Client::new()
        .request(
            reqwest::Method::OPTIONS,
            format!("{}/api/users/me", server.url()),
        )
        .header("Origin", "http://localhost:3000")
        .header("Access-Control-Request-Method", "GET")
        .header("Access-Control-Request-Headers", "authorization")
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("http://localhost:3000")
    );
    Ok(())
}
