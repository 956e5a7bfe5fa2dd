//! Prometheus metrics for monitoring the league server.
//!
//! Metrics are exposed in Prometheus text format on a separate listener,
//! enabled by `METRICS_BIND`. Without an installed exporter every recording
//! call is a no-op.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use pl_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! metrics::http_requests_total("POST", "/api/v1/tournaments", 201);
//! metrics::tournaments_started_total("round-robin");
//! ```

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// HTTP Metrics
// ============================================================================

/// Record HTTP request.
///
/// Increments the total HTTP request counter with method, path, and status labels.
pub fn http_requests_total(method: &str, path: &str, status: u16) {
    metrics::counter!("http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record HTTP request duration in milliseconds.
pub fn http_request_duration_ms(method: &str, path: &str, duration_ms: f64) {
    metrics::histogram!("http_request_duration_ms",
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration_ms);
}

// ============================================================================
// Tournament Metrics
// ============================================================================

/// Increment tournaments started counter.
pub fn tournaments_started_total(format: &str) {
    metrics::counter!("tournaments_started_total",
        "format" => format.to_string()
    )
    .increment(1);
}

/// Increment accepted frame submissions, labelled by resulting match status.
pub fn match_results_total(status: &str) {
    metrics::counter!("match_results_total",
        "status" => status.to_string()
    )
    .increment(1);
}

/// Increment tournament resets counter.
pub fn tournament_resets_total() {
    metrics::counter!("tournament_resets_total").increment(1);
}
