//! HTTP/WebSocket API for the Tiffin server.
//!
//! # Modules
//!
//! - [`rooms`]: create, join, leave and list rooms
//! - [`websocket`]: live connection carrying game commands and state
//! - [`rate_limiter`]: inbound frame limits per connection
//! - [`request_id`]: request correlation middleware
//!
//! # Endpoints Overview
//!
//! ```text
//! POST /api/create                     - Create a room, become host
//! POST /api/join                       - Join a waiting room
//! POST /api/leave                      - Leave a room
//! GET  /api/rooms                      - List rooms
//! GET  /ws?game_id=..&player_id=..     - WebSocket for a seated player
//! GET  /health                         - Health check
//! ```
//!
//! # CORS
//!
//! CORS is configured permissively. Browser clients are served from
//! elsewhere.

pub mod rate_limiter;
pub mod request_id;
pub mod rooms;
pub mod websocket;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;
use tiffin::GameService;
use tower_http::cors::CorsLayer;

use crate::config::RateLimitConfig;

/// Application state shared across all HTTP handlers and WebSocket connections.
#[derive(Clone)]
pub struct AppState {
    pub service: GameService,
    pub rate_limit: RateLimitConfig,
}

/// Create the complete API router with all endpoints and middleware.
///
/// # Example
///
/// ```rust,no_run
/// # use tiffin_server::api::{create_router, AppState};
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// # let state: AppState = unimplemented!();
/// let app = create_router(state);
/// let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/create", post(rooms::create_room))
        .route("/join", post(rooms::join_room))
        .route("/leave", post(rooms::leave_room))
        .route("/rooms", get(rooms::list_rooms));

    Router::new()
        .route("/health", get(health_check))
        .route("/ws", get(websocket::websocket_handler))
        .nest("/api", api_routes)
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` while the sync hub answers, `503 Service Unavailable`
/// once it has stopped.
///
/// ```bash
/// curl http://localhost:8080/health
/// # {"status":"healthy","version":"0.1.0","rooms":2,"connections":3}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let rooms = state.service.registry().room_count().await;
    let connections = state.service.hub().connection_count(None).await;

    let status_code = if connections.is_ok() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if connections.is_ok() { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "rooms": rooms,
        "connections": connections.ok(),
    });

    (status_code, Json(response))
}
