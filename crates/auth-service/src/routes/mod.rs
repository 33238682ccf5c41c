//! HTTP routes for the auth service.
//!
//! Defines the Axum router and application state.

use crate::config::Config;
use crate::crypto::KeyStore;
use crate::handlers;
use crate::middleware::{authenticate, http_metrics_middleware, GatewayState, PublicPaths};
use crate::repositories::UserStore;
use crate::services::{DiscoveryPublisher, RefreshCoordinator, TokenIssuer, TokenVerifier};
use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,

    /// Principal store, Postgres or in-memory.
    pub store: Arc<dyn UserStore>,

    pub verifier: TokenVerifier,

    /// Login, rotation and logout.
    pub sessions: RefreshCoordinator,

    /// JWKS and OpenID metadata, built once at startup.
    pub discovery: DiscoveryPublisher,
}

impl AppState {
    /// Wire the services around one key pair and one store.
    pub fn new(config: Config, keys: Arc<KeyStore>, store: Arc<dyn UserStore>) -> Self {
        let issuer = TokenIssuer::new(Arc::clone(&keys), &config);
        let verifier = TokenVerifier::new(Arc::clone(&keys), &config);
        let sessions = RefreshCoordinator::new(Arc::clone(&store), issuer, verifier.clone());
        let discovery = DiscoveryPublisher::new(&keys, &config.issuer);

        Self {
            config,
            store,
            verifier,
            sessions,
            discovery,
        }
    }
}

/// Build the application routes.
///
/// - `POST /api/auth/login`, `/api/auth/refresh` - public
/// - `POST /api/auth/logout` - authenticated
/// - `POST /api/users/signup` - public
/// - `GET|DELETE /api/users/me` - authenticated
/// - `GET /internal/users/:id` - public, for sibling services
/// - `GET /jwks`, `/.well-known/jwks.json`, `/.well-known/openid-configuration` - public
/// - `GET /health`, `/metrics` - public
///
/// Every request passes the gateway; which of them need a token is decided
/// by the configured public-path allow-list, not by the route table.
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let gateway = Arc::new(GatewayState {
        verifier: state.verifier.clone(),
        store: Arc::clone(&state.store),
        public_paths: PublicPaths::new(&state.config.public_paths),
    });
    let cors = cors_layer(&state.config.cors_allowed_origins);

    let app_routes = Router::new()
        .route("/api/auth/login", post(handlers::handle_login))
        .route("/api/auth/logout", post(handlers::handle_logout))
        .route("/api/auth/refresh", post(handlers::handle_refresh))
        .route("/api/users/signup", post(handlers::handle_signup))
        .route(
            "/api/users/me",
            get(handlers::handle_get_me).delete(handlers::handle_delete_me),
        )
        .route("/internal/users/:id", get(handlers::handle_get_internal_user))
        .route("/jwks", get(handlers::handle_get_jwks))
        .route("/.well-known/jwks.json", get(handlers::handle_get_jwks))
        .route(
            "/.well-known/openid-configuration",
            get(handlers::handle_openid_configuration),
        )
        .route("/health", get(handlers::health_check))
        .with_state(state);

    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    // Layer order (last added runs first):
    // http metrics -> CORS -> timeout -> trace -> gateway -> handler
    app_routes
        .merge(metrics_routes)
        .layer(middleware::from_fn_with_state(gateway, authenticate))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(cors)
        .layer(middleware::from_fn(http_metrics_middleware))
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(target: "auth.routes", origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}
