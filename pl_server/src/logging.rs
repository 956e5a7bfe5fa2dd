//! Structured logging configuration.
//!
//! This module sets up `tracing` output for the server and provides helpers
//! for tournament events and performance measurements. Records emitted by the
//! scheduling library through the `log` facade are forwarded into the same
//! subscriber.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging
///
/// Features:
/// - Request ID correlation (via the request span)
/// - `log` records from the library bridged into tracing
/// - Configurable log levels via RUST_LOG env var
///
/// # Example
///
/// ```no_run
/// use pl_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,hyper=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log a tournament lifecycle event with structured data
///
/// # Arguments
///
/// * `event` - Event name (e.g. `started`, `reset`)
/// * `tournament_id` - Tournament the event belongs to
/// * `message` - Event message
///
/// # Example
///
/// ```
/// use pl_server::logging::log_tournament_event;
///
/// log_tournament_event("started", 42, "single-elimination with 9 entrants");
/// ```
pub fn log_tournament_event(event: &str, tournament_id: i64, message: &str) {
    tracing::info!(
        event = event,
        tournament_id = tournament_id,
        "TOURNAMENT: {}",
        message
    );
}

/// Log performance metric
///
/// # Arguments
///
/// * `operation` - Operation name
/// * `duration_ms` - Duration in milliseconds
/// * `metadata` - Additional metadata
///
/// # Example
///
/// ```
/// use pl_server::logging::log_performance;
/// use std::time::Instant;
///
/// let start = Instant::now();
/// // ... do work ...
/// let duration = start.elapsed().as_millis() as u64;
/// log_performance("start_tournament", duration, Some("POST /api/v1/tournaments/{id}/start"));
/// ```
pub fn log_performance(operation: &str, duration_ms: u64, metadata: Option<&str>) {
    if duration_ms > 1000 {
        tracing::warn!(
            operation = operation,
            duration_ms = duration_ms,
            metadata = metadata,
            "PERFORMANCE: Slow operation"
        );
    } else {
        tracing::debug!(
            operation = operation,
            duration_ms = duration_ms,
            metadata = metadata,
            "Performance metric"
        );
    }
}
