//! Metrics collection and exposition.
//!
//! # Metrics
//! - `dispatch_requests_total` (counter): requests by method, status
//! - `dispatch_request_duration_seconds` (histogram): latency by method
//! - `dispatch_not_found_total` (counter): requests with no matching route
//! - `dispatch_recovered_faults_total` (counter): faults turned into 500s
//! - `dispatch_auth_redirects_total` (counter): requests sent to the login page
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op
//! - Prometheus exposition is optional and configured at startup

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    let builder = PrometheusBuilder::new().with_http_listener(addr);
    match builder.install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => {
            tracing::error!(address = %addr, error = %e, "Failed to install metrics recorder")
        }
    }
}

/// Record a completed request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "dispatch_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("dispatch_request_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_not_found() {
    counter!("dispatch_not_found_total").increment(1);
}

pub fn record_recovered_fault() {
    counter!("dispatch_recovered_faults_total").increment(1);
}

pub fn record_auth_redirect() {
    counter!("dispatch_auth_redirects_total").increment(1);
}
