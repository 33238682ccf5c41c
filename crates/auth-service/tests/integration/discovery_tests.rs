//! E2E tests for the JWKS and OpenID metadata documents.
//!
//! A relying party must be able to verify tokens using nothing but what these
//! endpoints publish.

use crate::helpers::login;
use auth_service::models::Role;
use auth_test_utils::*;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use reqwest::StatusCode;
use rsa::pkcs8::DecodePublicKey;
use rsa::{BigUint, RsaPublicKey};
use serde_json::Value;

/// Status, `Cache-Control` and JSON body of a GET.
async fn get_json(
    server: &TestAuthServer,
    path: &str,
) -> Result<(StatusCode, Option<String>, Value), anyhow::Error> {
    let response = reqwest::Client::new()
        .get(format!("{}{}", server.url(), path))
        .send()
        .await?;
    let status = response.status();
    let cache_control = response
        .headers()
        .get("cache-control")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    Ok((status, cache_control, response.json().await?))
}

#[tokio::test]
async fn test_jwks_document_shape() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestAuthServer::spawn().await?;

    // Act
    let (status, cache_control, body) = get_json(&server, "/.well-known/jwks.json").await?;

    // Assert
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cache_control.as_deref(), Some("max-age=3600"));

    let keys = body["keys"].as_array().expect("keys must be an array");
    assert_eq!(keys.len(), 1);
    let key = &keys[0];
    assert_eq!(key["kty"], "RSA");
    assert_eq!(key["alg"], "RS256");
    assert_eq!(key["use"], "sig");
    assert_eq!(key["kid"], TEST_KEY_ID);
    assert_eq!(key["e"], "AQAB");

    let n = key["n"].as_str().expect("n must be a string");
    assert!(!n.contains('='), "base64url without padding");
    let modulus = URL_SAFE_NO_PAD.decode(n)?;
    assert_eq!(modulus.len(), 256, "2048-bit modulus without a sign byte");
    assert_ne!(modulus[0], 0);

    Ok(())
}

#[tokio::test]
async fn test_jwks_alias_serves_same_document() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;

    let (_, _, well_known) = get_json(&server, "/.well-known/jwks.json").await?;
    let (status, _, alias) = get_json(&server, "/jwks").await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(well_known, alias);
    Ok(())
}

/// The published n/e reconstruct exactly the configured public key.
#[tokio::test]
async fn test_jwks_reconstructs_public_key() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    let (_, _, body) = get_json(&server, "/jwks").await?;
    let key = &body["keys"][0];

    let n = URL_SAFE_NO_PAD.decode(key["n"].as_str().unwrap_or_default())?;
    let e = URL_SAFE_NO_PAD.decode(key["e"].as_str().unwrap_or_default())?;
    let published = RsaPublicKey::new(BigUint::from_bytes_be(&n), BigUint::from_bytes_be(&e))?;

    let configured = RsaPublicKey::from_public_key_pem(BUNDLED_PUBLIC_KEY_PEM)?;
    assert_eq!(published, configured);
    Ok(())
}

/// A token from login verifies against the JWKS alone, with the issuer and
/// audience from the metadata document.
#[tokio::test]
async fn test_jwks_verifies_issued_access_token() -> Result<(), anyhow::Error> {
    // Arrange
    let server = TestAuthServer::spawn().await?;
    let alice = server
        .create_user(TEST_EMAIL_ALICE, TEST_PASSWORD, Role::User)
        .await?;
    let tokens = login(&server, TEST_EMAIL_ALICE, TEST_PASSWORD).await?;
    let token = tokens.access_token.trim_start_matches("Bearer ");

    let (_, _, jwks) = get_json(&server, "/jwks").await?;
    let (_, _, metadata) = get_json(&server, "/.well-known/openid-configuration").await?;

    // Act
    let kid = decode_header(token)?.kid.expect("token must carry kid");
    let jwk = jwks["keys"]
        .as_array()
        .and_then(|keys| keys.iter().find(|k| k["kid"] == kid.as_str()))
        .expect("kid must be published");
    let decoding_key = DecodingKey::from_rsa_components(
        jwk["n"].as_str().unwrap_or_default(),
        jwk["e"].as_str().unwrap_or_default(),
    )?;

    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_issuer(&[metadata["issuer"].as_str().unwrap_or_default()]);
    validation.set_audience(&[server.config().audience.as_str()]);
    let claims = decode::<Value>(token, &decoding_key, &validation)?.claims;

    // Assert
    assert_eq!(claims["userId"], alice.user_id);
    assert_eq!(claims["sub"], TEST_EMAIL_ALICE);
    Ok(())
}

#[tokio::test]
async fn test_openid_configuration_document() -> Result<(), anyhow::Error> {
    let server =
        TestAuthServer::spawn_with_env(&[("JWT_ISSUER", "https://api.example.com/auth")]).await?;

    let (status, cache_control, body) =
        get_json(&server, "/.well-known/openid-configuration").await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(cache_control.as_deref(), Some("max-age=3600"));
    assert_eq!(body["issuer"], "https://api.example.com/auth");
    assert_eq!(
        body["jwks_uri"],
        "https://api.example.com/auth/.well-known/jwks.json"
    );
    assert_eq!(body["id_token_signing_alg_values_supported"][0], "RS256");
    assert_eq!(body["response_types_supported"][0], "token");
    assert_eq!(body["subject_types_supported"][0], "public");
    Ok(())
}

/// Tokens carry the configured issuer verbatim.
#[tokio::test]
async fn test_openid_issuer_matches_token_issuer() -> Result<(), anyhow::Error> {
    let server =
        TestAuthServer::spawn_with_env(&[("JWT_ISSUER", "https://api.example.com/auth")]).await?;
    server
        .create_user(TEST_EMAIL_BOB, TEST_PASSWORD, Role::User)
        .await?;

    let tokens = login(&server, TEST_EMAIL_BOB, TEST_PASSWORD).await?;
    let (_, _, body) = get_json(&server, "/.well-known/openid-configuration").await?;

    assert_eq!(tokens.access_token.claims()["iss"], body["issuer"]);
    Ok(())
}
