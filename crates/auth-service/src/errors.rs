use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Failures surfaced by the token lifecycle and the HTTP layer around it.
///
/// Messages on the `Display` side may carry internal detail for logs. The
/// HTTP body never does: see the `IntoResponse` impl.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Missing or malformed `Authorization: Bearer` header.
    #[error("Authentication required")]
    AuthenticationRequired,

    /// Signature valid, `exp` in the past.
    #[error("Token expired")]
    TokenExpired,

    /// Bad signature, malformed structure, wrong algorithm, wrong issuer/audience.
    #[error("Invalid token: {0}")]
    TokenInvalid(String),

    /// Token subject no longer resolves to a stored principal.
    #[error("Principal not found")]
    PrincipalNotFound,

    /// Presented refresh token is not the one currently persisted.
    #[error("Refresh token does not match the persisted value")]
    RefreshMismatch,

    /// Signing key could not be read or parsed.
    #[error("Key load failure: {0}")]
    KeyLoadFailure(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Resource not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cryptographic error: {0}")]
    Crypto(String),

    #[error("Internal server error")]
    Internal,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
}

impl AuthError {
    /// HTTP status this error maps to.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::AuthenticationRequired
            | AuthError::TokenExpired
            | AuthError::TokenInvalid(_)
            | AuthError::PrincipalNotFound
            | AuthError::RefreshMismatch
            | AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AuthError::NotFound => StatusCode::NOT_FOUND,
            AuthError::KeyLoadFailure(_)
            | AuthError::Database(_)
            | AuthError::Crypto(_)
            | AuthError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_detail(&self) -> (&'static str, String) {
        match self {
            // Same body for both: callers cannot probe whether a principal exists.
            AuthError::AuthenticationRequired | AuthError::PrincipalNotFound => (
                "AUTHENTICATION_REQUIRED",
                "Authentication is required".to_string(),
            ),
            AuthError::TokenExpired => ("TOKEN_EXPIRED", "The token has expired".to_string()),
            // Same body for both: a rotated refresh token looks like any other bad token.
            AuthError::TokenInvalid(_) | AuthError::RefreshMismatch => {
                ("INVALID_TOKEN", "The token is invalid".to_string())
            }
            AuthError::InvalidCredentials => (
                "INVALID_CREDENTIALS",
                "Invalid email or password".to_string(),
            ),
            AuthError::InvalidRequest(reason) => ("INVALID_REQUEST", reason.clone()),
            AuthError::NotFound => ("NOT_FOUND", "Resource not found".to_string()),
            AuthError::KeyLoadFailure(_) | AuthError::Crypto(_) => (
                "CRYPTO_ERROR",
                "An internal cryptographic error occurred".to_string(),
            ),
            AuthError::Database(_) => (
                "DATABASE_ERROR",
                "An internal database error occurred".to_string(),
            ),
            AuthError::Internal => ("INTERNAL_ERROR", "An internal error occurred".to_string()),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (code, message) = self.public_detail();

        if status.is_server_error() {
            tracing::error!(target: "auth.errors", error = %self, "Request failed");
        } else {
            tracing::debug!(target: "auth.errors", error = %self, "Request rejected");
        }

        let mut response = (
            status,
            Json(ErrorResponse {
                error: ErrorDetail { code, message },
            }),
        )
            .into_response();

        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }

        response
    }
}
