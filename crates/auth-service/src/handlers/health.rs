//! Liveness and metrics endpoints.

use axum::{extract::State, response::IntoResponse};
use metrics_exporter_prometheus::PrometheusHandle;

/// Liveness probe. Checks nothing beyond the process answering.
pub async fn health_check() -> &'static str {
    "OK"
}

/// Prometheus text exposition.
pub async fn metrics_handler(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    handle.render()
}
