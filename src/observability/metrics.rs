//! Metrics collection and exposition.
//!
//! # Metrics
//! - `router_requests_total` (counter): requests by method, route, status
//! - `router_request_duration_seconds` (histogram): latency by method, route
//! - `router_errors_total` (counter): raised errors by kind and whether a handler recovered them
//!
//! # Design Decisions
//! - Unmatched requests are labelled with route `none`
//! - Route labels use the template, never the concrete path (bounded cardinality)

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

use crate::error::RouteError;

/// Install the Prometheus exporter with an HTTP scrape listener on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a completed request.
pub fn record_request(method: &str, status: u16, route: &str, start: Instant) {
    ::metrics::counter!(
        "router_requests_total",
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    ::metrics::histogram!(
        "router_request_duration_seconds",
        "method" => method.to_string(),
        "route" => route.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record an error raised by a route's middleware.
pub fn record_error(err: &RouteError, recovered: bool) {
    ::metrics::counter!(
        "router_errors_total",
        "kind" => err.kind().to_string(),
        "recovered" => if recovered { "true" } else { "false" }
    )
    .increment(1);
}
