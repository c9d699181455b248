//! The `/metrics` surface: two monotonic counters exposed in Prometheus
//! text format, the same shape as `internal/broker/metrics.go`'s
//! `messagesProduced` / `messagesConsumed`, built the way
//! `dekaf::metrics_server::build_router` wires up
//! `metrics_exporter_prometheus` behind an axum route.

use std::sync::OnceLock;

use axum::extract::State;
use axum::http::StatusCode;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub const PRODUCED_TOTAL: &str = "broker_messages_produced_total";
pub const CONSUMED_TOTAL: &str = "broker_messages_consumed_total";

static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Installs the global Prometheus recorder on first call; later calls
/// (multiple broker instances sharing one process, as in tests) reuse the
/// same handle instead of trying to install a second global recorder.
fn handle() -> PrometheusHandle {
    HANDLE
        .get_or_init(|| {
            PrometheusBuilder::new()
                .install_recorder()
                .expect("failed to install prometheus recorder")
        })
        .clone()
}

pub fn build_router() -> axum::Router<()> {
    use axum::routing::get;

    axum::Router::new()
        .route("/metrics", get(render))
        .with_state(handle())
}

pub fn inc_produced() {
    metrics::counter!(PRODUCED_TOTAL).increment(1);
}

pub fn inc_consumed() {
    metrics::counter!(CONSUMED_TOTAL).increment(1);
}

async fn render(State(handle): State<PrometheusHandle>) -> (StatusCode, String) {
    (StatusCode::OK, handle.render())
}
