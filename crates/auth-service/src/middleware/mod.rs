//! HTTP middleware.
//!
//! - `auth` - the request gateway
//! - `public_paths` - allow-list matcher used by the gateway
//! - `http_metrics` - per-request metrics

pub mod auth;
pub mod http_metrics;
pub mod public_paths;

pub use auth::{authenticate, AuthenticatedUser, GatewayState, USER_ID_HEADER, USER_ROLE_HEADER};
pub use http_metrics::http_metrics_middleware;
pub use public_paths::PublicPaths;
