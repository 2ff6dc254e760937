//! Prometheus metrics for monitoring live rooms and connections.
//!
//! The game library records room, round and hub delivery metrics itself;
//! this module installs the exporter and records the transport side.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use tiffin_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//! metrics::websocket_connected();
//! ```

use metrics_exporter_prometheus::PrometheusBuilder;
use std::{net::SocketAddr, time::Duration};

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))?;
    describe();
    Ok(())
}

fn describe() {
    metrics::describe_counter!("http_requests_total", "HTTP requests by route and status");
    metrics::describe_histogram!("http_request_duration_ms", "HTTP request latency");
    metrics::describe_counter!("websocket_connections_total", "Websocket upgrades accepted");
    metrics::describe_counter!("websocket_messages_received_total", "Inbound frames");
    metrics::describe_counter!("websocket_messages_sent_total", "Frames queued to clients");
    metrics::describe_gauge!("websocket_connections_active", "Connections held by the hub");
    metrics::describe_counter!("slow_consumers_dropped_total", "Connections dropped for a full queue");
    metrics::describe_counter!("rate_limit_hits_total", "Inbound frames rejected by rate limits");
    metrics::describe_counter!("rooms_created_total", "Rooms created");
    metrics::describe_gauge!("active_rooms", "Rooms currently open");
    metrics::describe_counter!("rounds_scored_total", "Rounds scored");
    metrics::describe_counter!("games_finished_total", "Games played to the end");
}

// ============================================================================
// HTTP Metrics
// ============================================================================

/// Record one HTTP request with its latency.
pub fn http_request(method: &str, path: &str, status: u16, elapsed: Duration) {
    metrics::counter!("http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("http_request_duration_ms",
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(elapsed.as_secs_f64() * 1000.0);
}

// ============================================================================
// WebSocket Metrics
// ============================================================================

/// Increment total WebSocket connections counter.
pub fn websocket_connected() {
    metrics::counter!("websocket_connections_total").increment(1);
}

/// Increment WebSocket messages received counter.
pub fn websocket_message_received() {
    metrics::counter!("websocket_messages_received_total").increment(1);
}

/// Increment rate limit hits counter.
pub fn rate_limit_hit(window: &'static str) {
    metrics::counter!("rate_limit_hits_total", "window" => window).increment(1);
}
