//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define service metrics (requests, latency, connections, failures)
//! - Expose a Prometheus-compatible scrape endpoint when enabled
//!
//! # Metrics
//! - `transfer_http_requests_total` (counter): requests by method, route, status
//! - `transfer_http_request_duration_seconds` (histogram): latency distribution
//! - `transfer_active_connections` (gauge): open client connections
//! - `transfer_handler_failures_total` (counter): handler faults by route
//! - `transfer_requests_cancelled_total` (counter): requests abandoned by the peer
//! - `transfer_withdrawals_settled_total` (counter): settled withdrawals by final state
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op, so tests need no setup

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its HTTP scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record one completed request.
pub fn record_request(method: &str, route: &str, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("route", route.to_string()),
        ("status", status.to_string()),
    ];
    metrics::counter!("transfer_http_requests_total", &labels).increment(1);
    metrics::histogram!("transfer_http_request_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());
}

pub fn connection_opened() {
    metrics::gauge!("transfer_active_connections").increment(1.0);
}

pub fn connection_closed() {
    metrics::gauge!("transfer_active_connections").decrement(1.0);
}

pub fn record_handler_failure(route: &str) {
    metrics::counter!("transfer_handler_failures_total", "route" => route.to_string()).increment(1);
}

pub fn record_cancelled(route: &str) {
    metrics::counter!("transfer_requests_cancelled_total", "route" => route.to_string()).increment(1);
}

pub fn record_withdrawal_settled(state: &'static str) {
    metrics::counter!("transfer_withdrawals_settled_total", "state" => state).increment(1);
}
