use crate::models::{Jwks, OpenIdConfiguration};
use crate::observability::metrics::record_discovery_request;
use crate::routes::AppState;
use axum::{
    extract::State,
    http::header::{HeaderMap, HeaderValue, CACHE_CONTROL},
    Json,
};
use std::sync::Arc;
use tracing::instrument;

/// Handle JWKS request
///
/// GET /jwks and GET /.well-known/jwks.json
///
/// The key never changes while the process runs, so clients may cache the
/// document for an hour.
#[instrument(skip_all, name = "auth.discovery.jwks")]
pub async fn handle_get_jwks(State(state): State<Arc<AppState>>) -> (HeaderMap, Json<Jwks>) {
    record_discovery_request("jwks");
    (cache_headers(), Json(state.discovery.jwks().clone()))
}

/// Handle OpenID provider metadata request
///
/// GET /.well-known/openid-configuration
#[instrument(skip_all, name = "auth.discovery.openid_configuration")]
pub async fn handle_openid_configuration(
    State(state): State<Arc<AppState>>,
) -> (HeaderMap, Json<OpenIdConfiguration>) {
    record_discovery_request("openid_configuration");
    (
        cache_headers(),
        Json(state.discovery.openid_configuration().clone()),
    )
}

fn cache_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("max-age=3600"));
    headers
}
