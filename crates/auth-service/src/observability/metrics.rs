//! Prometheus metrics for the auth service.
//!
//! Naming: `auth_` prefix, `_total` for counters, `_seconds` for histograms.
//!
//! # Cardinality
//!
//! - `kind`: `access`, `refresh`
//! - `status`: `success`, `error`
//! - `error_category`: see [`super::ErrorCategory`]
//! - `outcome`: `rotated`, `mismatch`, `invalid`, `principal_not_found`, `error`
//! - `decision`: `public`, `preflight`, `authenticated`, `rejected`
//! - `document`: `jwks`, `openid_configuration`
//! - `endpoint`: route templates, unknown paths collapse to `/other`

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Install the global Prometheus recorder and return its render handle.
///
/// # Errors
///
/// Fails if a recorder is already installed or bucket configuration is rejected.
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        // bcrypt dominates login latency, ~250ms at cost 12
        .set_buckets_for_metric(
            Matcher::Full("auth_login_duration_seconds".to_string()),
            &[0.050, 0.100, 0.200, 0.300, 0.500, 0.750, 1.000, 2.000],
        )
        .map_err(|e| format!("Failed to set login buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// HTTP Metrics
// ============================================================================

/// Metric: `auth_http_requests_total`, `auth_http_request_duration_seconds`
/// Labels: `method`, `endpoint`, `status`
pub fn record_http_request(method: &str, path: &str, status_code: u16, duration: Duration) {
    let method = normalize_method(method);
    let endpoint = normalize_endpoint(path);
    let status = categorize_status_code(status_code);

    histogram!("auth_http_request_duration_seconds",
        "method" => method,
        "endpoint" => endpoint,
        "status" => status
    )
    .record(duration.as_secs_f64());

    counter!("auth_http_requests_total",
        "method" => method,
        "endpoint" => endpoint,
        "status" => status
    )
    .increment(1);
}

fn categorize_status_code(status_code: u16) -> &'static str {
    match status_code {
        200..=299 => "success",
        408 | 504 => "timeout",
        _ => "error",
    }
}

/// Extension methods are client-chosen and collapse to `OTHER`.
fn normalize_method(method: &str) -> &'static str {
    match method {
        "GET" => "GET",
        "HEAD" => "HEAD",
        "POST" => "POST",
        "PUT" => "PUT",
        "PATCH" => "PATCH",
        "DELETE" => "DELETE",
        "OPTIONS" => "OPTIONS",
        "CONNECT" => "CONNECT",
        "TRACE" => "TRACE",
        _ => "OTHER",
    }
}

/// Collapse a request path onto its route template.
fn normalize_endpoint(path: &str) -> &'static str {
    match path.trim_end_matches('/') {
        "" => "/",
        "/health" => "/health",
        "/metrics" => "/metrics",
        "/jwks" => "/jwks",
        "/.well-known/jwks.json" => "/.well-known/jwks.json",
        "/.well-known/openid-configuration" => "/.well-known/openid-configuration",
        "/api/auth/login" => "/api/auth/login",
        "/api/auth/logout" => "/api/auth/logout",
        "/api/auth/refresh" => "/api/auth/refresh",
        "/api/users/signup" => "/api/users/signup",
        "/api/users/me" => "/api/users/me",
        p if p.starts_with("/internal/users/") => "/internal/users/{id}",
        _ => "/other",
    }
}

// ============================================================================
// Token Metrics
// ============================================================================

/// Metric: `auth_token_issued_total`
/// Labels: `kind`
pub fn record_token_issued(kind: &'static str) {
    counter!("auth_token_issued_total", "kind" => kind).increment(1);
}

/// Metric: `auth_token_validations_total`
/// Labels: `kind`, `status`, `error_category`
pub fn record_token_validation(
    kind: &'static str,
    status: &'static str,
    error_category: Option<&'static str>,
) {
    let category = error_category.unwrap_or("none");
    counter!(
        "auth_token_validations_total",
        "kind" => kind,
        "status" => status,
        "error_category" => category
    )
    .increment(1);
}

// ============================================================================
// Session Metrics
// ============================================================================

/// Metric: `auth_logins_total`, `auth_login_duration_seconds`
/// Labels: `status`
pub fn record_login(status: &'static str, duration: Duration) {
    histogram!("auth_login_duration_seconds", "status" => status).record(duration.as_secs_f64());
    counter!("auth_logins_total", "status" => status).increment(1);
}

/// Metric: `auth_refresh_rotations_total`
/// Labels: `outcome`
pub fn record_refresh_rotation(outcome: &'static str) {
    counter!("auth_refresh_rotations_total", "outcome" => outcome).increment(1);
}

/// Metric: `auth_logouts_total`
pub fn record_logout() {
    counter!("auth_logouts_total").increment(1);
}

// ============================================================================
// Gateway / Discovery Metrics
// ============================================================================

/// Metric: `auth_gateway_decisions_total`
/// Labels: `decision`
pub fn record_gateway_decision(decision: &'static str) {
    counter!("auth_gateway_decisions_total", "decision" => decision).increment(1);
}

/// Metric: `auth_discovery_requests_total`
/// Labels: `document`
pub fn record_discovery_request(document: &'static str) {
    counter!("auth_discovery_requests_total", "document" => document).increment(1);
}
