//! Tiffin game server.
//!
//! Hosts any number of rooms in memory. Players create and join rooms over
//! HTTP, then play over a websocket fed by a single sync hub.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Error;
use log::info;
use pico_args::Arguments;
use tiffin::{GameService, HubActor, RoomRegistry};
use tiffin_server::{api, config::ServerConfig, logging, metrics};

const HELP: &str = "\
Run a Tiffin game server

USAGE:
  tiffin_server [OPTIONS]

OPTIONS:
  --bind            IP:PORT   Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:8080]
  --queue-capacity  N         Outbound frames buffered per connection  [default: env OUTBOUND_QUEUE_CAPACITY or 256]

FLAGS:
  -h, --help                  Print help information

ENVIRONMENT:
  SERVER_BIND                 Server bind address (e.g., 0.0.0.0:8080)
  METRICS_BIND                Prometheus exporter address; disabled when unset
  HUB_INBOX_CAPACITY          Sync hub inbox size
  OUTBOUND_QUEUE_CAPACITY     Outbound frames buffered per connection
  WS_BURST_LIMIT              Inbound frames allowed per second
  WS_SUSTAINED_LIMIT          Inbound frames allowed per minute
  RUST_LOG                    Log filter (e.g., info,tiffin=debug)
";

struct Args {
    bind: Option<SocketAddr>,
    queue_capacity: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        bind: pargs.opt_value_from_str("--bind")?,
        queue_capacity: pargs.opt_value_from_str("--queue-capacity")?,
    };

    logging::init();

    let config = ServerConfig::from_env(args.bind, args.queue_capacity)?;
    config.validate()?;
    config
        .hub
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid hub configuration: {}", e))?;

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(anyhow::Error::msg)?;
        info!("Prometheus metrics exported at http://{}/metrics", addr);
    }

    let hub = HubActor::spawn(&config.hub);
    let registry = Arc::new(RoomRegistry::default());
    let service = GameService::new(registry, hub);

    let api_state = api::AppState {
        service,
        rate_limit: config.rate_limit,
    };
    let app = api::create_router(api_state);

    info!("Starting HTTP/WebSocket server on {}", config.bind);
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", config.bind, e))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    info!("Shutting down server...");

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}
