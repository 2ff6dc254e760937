//! Structured logging setup and helpers.
//!
//! The game library logs through the `log` facade; those records are
//! forwarded into the same `tracing` subscriber as the server's own events.

use std::time::Duration;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is unset
const DEFAULT_FILTER: &str = "info,hyper=warn";

/// Operations slower than this are logged at warn level
const SLOW_OPERATION: Duration = Duration::from_millis(250);

/// Initialize structured logging
///
/// Log levels come from `RUST_LOG`.
///
/// # Example
///
/// ```no_run
/// use tiffin_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true);

    // `init` also installs the log-to-tracing bridge.
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log a finished HTTP request
pub fn log_request(request_id: &str, method: &str, path: &str, status: u16, elapsed: Duration) {
    let duration_ms = elapsed.as_millis() as u64;
    if status >= 500 {
        tracing::error!(
            request_id,
            http_method = method,
            http_path = path,
            http_status = status,
            duration_ms,
            "Request failed"
        );
    } else {
        tracing::info!(
            request_id,
            http_method = method,
            http_path = path,
            http_status = status,
            duration_ms,
            "Request completed"
        );
    }
}

/// Log a websocket lifecycle event
///
/// # Arguments
///
/// * `event` - What happened (`connected`, `disconnected`, `rate_limited`, ...)
/// * `room_id` - Room of the connection
/// * `player_id` - Player behind the connection
/// * `connection_id` - Connection id
pub fn log_connection_event(event: &str, room_id: &str, player_id: &str, connection_id: &str) {
    tracing::info!(
        event,
        room_id,
        player_id,
        connection_id,
        "Connection event"
    );
}

/// Log how long an operation took, at warn level when slow
///
/// # Example
///
/// ```
/// use tiffin_server::logging::log_performance;
/// use std::time::Instant;
///
/// let start = Instant::now();
/// // ... do work ...
/// log_performance("handle_frame", start.elapsed(), Some("select_card"));
/// ```
pub fn log_performance(operation: &str, elapsed: Duration, metadata: Option<&str>) {
    let duration_ms = elapsed.as_millis() as u64;
    if elapsed > SLOW_OPERATION {
        tracing::warn!(operation, duration_ms, metadata, "Slow operation");
    } else {
        tracing::debug!(operation, duration_ms, metadata, "Performance metric");
    }
}
