//! WebSocket handler for live room play.
//!
//! A seated player opens one socket per client. Everything the server pushes
//! (`game_state`, `player_joined`, `error`) arrives through the sync hub; the
//! socket only forwards what the hub queues for this connection.
//!
//! # Connection Flow
//!
//! 1. Client connects via `GET /ws?game_id=<room>&player_id=<player>`
//! 2. Server checks the room exists and the player is seated in it
//! 3. The connection registers with the hub and the room receives fresh state
//! 4. A writer task drains the connection's queue into the socket while the
//!    reader loop hands inbound frames to the game service
//! 5. When either side ends, the connection unregisters
//!
//! # Example
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:8080/ws?game_id=3fa9c1&player_id=a07b2e');
//!
//! ws.onmessage = (event) => {
//!   const msg = JSON.parse(event.data);
//!   if (msg.type === "game_state") {
//!     render(msg.data);
//!   }
//! };
//!
//! ws.send(JSON.stringify({ type: "select_card", data: { card_index: 2 } }));
//! ```

use axum::{
    Json,
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use std::time::Instant;
use tiffin::{PlayerId, RoomId, ServerMessage};

use super::{
    AppState,
    rate_limiter::{FrameLimiter, Verdict},
    rooms::ErrorResponse,
};
use crate::{logging, metrics};

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    game_id: Option<String>,
    player_id: Option<String>,
}

fn reject(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

/// Upgrade to a WebSocket for a seated player.
///
/// # Query Parameters
///
/// - `game_id`: Room to attach to
/// - `player_id`: Player id handed out by create or join
///
/// # Response
///
/// On success, upgrades the connection (101 Switching Protocols).
///
/// # Errors
///
/// - `400 Bad Request`: a parameter is missing or blank
/// - `404 Not Found`: unknown room, or player not seated in it
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> Response {
    let (Some(room_id), Some(player_id)) = (
        query.game_id.filter(|s| !s.trim().is_empty()),
        query.player_id.filter(|s| !s.trim().is_empty()),
    ) else {
        return reject(
            StatusCode::BAD_REQUEST,
            "game_id and player_id are required",
        );
    };
    let room_id = RoomId::from(room_id);
    let player_id = PlayerId::from(player_id);

    let Some(room) = state.service.registry().get(&room_id).await else {
        return reject(StatusCode::NOT_FOUND, "game not found");
    };
    if !room.lock().await.has_player(&player_id) {
        return reject(StatusCode::NOT_FOUND, "player not found");
    }

    ws.on_upgrade(move |socket| handle_socket(socket, room_id, player_id, state))
}

/// Drive an established WebSocket connection until either side closes.
///
/// # Arguments
///
/// - `socket`: The upgraded connection
/// - `room_id`: Room the player sits in
/// - `player_id`: Player behind the connection
/// - `state`: Shared application state
async fn handle_socket(socket: WebSocket, room_id: RoomId, player_id: PlayerId, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound, mut outbound_rx) = state.service.hub().outbound_channel();

    // The player may have left between the upgrade check and now.
    let session = match state.service.connect(&room_id, &player_id, outbound).await {
        Ok(session) => session,
        Err(e) => {
            log::warn!(
                "Rejecting socket for {} in room {}: {}",
                player_id,
                room_id,
                e
            );
            if let Ok(json) = ServerMessage::error(e.to_string()).to_json() {
                let _ = sender.send(Message::Text(json.into())).await;
            }
            let _ = sender.send(Message::Close(None)).await;
            return;
        }
    };
    let connection_id = session.connection_id.to_string();
    metrics::websocket_connected();
    logging::log_connection_event(
        "connected",
        room_id.as_str(),
        player_id.as_str(),
        &connection_id,
    );

    // Ends when the hub drops the queue (unregister or slow consumer) or the
    // socket stops accepting writes.
    let mut send_task = tokio::spawn(async move {
        while let Some(json) = outbound_rx.recv().await {
            if sender.send(Message::Text(json.into())).await.is_err() {
                return;
            }
        }
        let _ = sender.send(Message::Close(None)).await;
    });

    let mut limiter = FrameLimiter::new(state.rate_limit);
    let recv_service = state.service.clone();
    let recv_session = session.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    metrics::websocket_message_received();

                    let verdict = limiter.check();
                    if !verdict.is_allowed() {
                        let window = match verdict {
                            Verdict::BurstExceeded => "burst",
                            _ => "sustained",
                        };
                        metrics::rate_limit_hit(window);
                        log::warn!(
                            "Rate limit ({}) exceeded for {} in room {}",
                            window,
                            recv_session.player_id,
                            recv_session.room_id
                        );
                        if recv_service
                            .send_error(&recv_session, verdict.message())
                            .await
                            .is_err()
                        {
                            break;
                        }
                        continue;
                    }

                    let started = Instant::now();
                    if let Err(e) = recv_service.handle_frame(&recv_session, text.as_str()).await {
                        log::error!("Dropping socket {}: {}", recv_session.connection_id, e);
                        break;
                    }
                    logging::log_performance("handle_frame", started.elapsed(), None);
                }
                Ok(Message::Close(_)) => break,
                Err(e) => {
                    log::debug!("WebSocket error on {}: {}", recv_session.connection_id, e);
                    break;
                }
                // Binary frames are not part of the protocol; ping/pong is handled by axum.
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    if let Err(e) = state.service.disconnect(&session).await {
        log::warn!("Failed to unregister {}: {}", connection_id, e);
    }
    logging::log_connection_event(
        "disconnected",
        room_id.as_str(),
        player_id.as_str(),
        &connection_id,
    );
}
