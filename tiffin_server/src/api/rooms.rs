//! Room management API handlers.
//!
//! Creating, joining, leaving and listing rooms. Players are identified by
//! the ids these endpoints hand out; there is no account system.
//!
//! # Examples
//!
//! Create a room:
//! ```bash
//! curl -X POST http://localhost:8080/api/create \
//!   -H "Content-Type: application/json" \
//!   -d '{"player_name": "Asha"}'
//! ```
//!
//! Join it:
//! ```bash
//! curl -X POST http://localhost:8080/api/join \
//!   -H "Content-Type: application/json" \
//!   -d '{"game_id": "3fa9c1", "player_name": "Ravi"}'
//! ```

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tiffin::{PlayerId, RoomError, RoomId, RoomSummary, ServiceError};

use super::{AppState, request_id::RequestId};

#[derive(Debug, Deserialize)]
pub struct CreateRoomRequest {
    #[serde(default)]
    pub player_name: String,
}

#[derive(Debug, Deserialize)]
pub struct JoinRoomRequest {
    #[serde(default)]
    pub game_id: String,
    #[serde(default)]
    pub player_name: String,
}

/// Ids a client needs to open its websocket
#[derive(Debug, Deserialize, Serialize)]
pub struct SeatResponse {
    pub game_id: RoomId,
    pub player_id: PlayerId,
}

#[derive(Debug, Deserialize)]
pub struct LeaveRoomRequest {
    pub game_id: RoomId,
    pub player_id: PlayerId,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LeaveRoomResponse {
    pub closed: bool,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// Create a room with the caller as host.
///
/// # Response
///
/// Returns `200 OK` with the new room id and the host's player id:
/// ```json
/// {"game_id": "3fa9c1", "player_id": "a07b2e"}
/// ```
pub async fn create_room(
    State(state): State<AppState>,
    request_id: RequestId,
    Json(request): Json<CreateRoomRequest>,
) -> Json<SeatResponse> {
    let (game_id, player_id) = state.service.create_room(&request.player_name).await;
    tracing::info!(
        request_id = %request_id,
        room_id = %game_id,
        player_id = %player_id,
        "Room created"
    );
    Json(SeatResponse { game_id, player_id })
}

/// Join a waiting room.
///
/// On success everyone already in the room receives `player_joined` and a
/// fresh `game_state`.
///
/// # Errors
///
/// - `400 Bad Request`: missing game id, unknown room, game started or room full
/// - `503 Service Unavailable`: sync hub stopped
pub async fn join_room(
    State(state): State<AppState>,
    request_id: RequestId,
    Json(request): Json<JoinRoomRequest>,
) -> Result<Json<SeatResponse>, ApiError> {
    let game_id = request.game_id.trim();
    if game_id.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "game_id is required"));
    }
    let game_id = RoomId::from(game_id);

    match state.service.join_room(&game_id, &request.player_name).await {
        Ok(player_id) => {
            tracing::info!(
                request_id = %request_id,
                room_id = %game_id,
                player_id = %player_id,
                "Player joined"
            );
            Ok(Json(SeatResponse { game_id, player_id }))
        }
        Err(ServiceError::Room(e)) => Err(api_error(StatusCode::BAD_REQUEST, e.to_string())),
        Err(ServiceError::Hub(e)) => {
            tracing::error!(request_id = %request_id, "Join failed: {}", e);
            Err(api_error(StatusCode::SERVICE_UNAVAILABLE, e.to_string()))
        }
    }
}

/// Leave a room.
///
/// # Response
///
/// Returns `200 OK` with whether the room was closed as a result.
///
/// # Errors
///
/// - `404 Not Found`: unknown room, or player not in it
pub async fn leave_room(
    State(state): State<AppState>,
    request_id: RequestId,
    Json(request): Json<LeaveRoomRequest>,
) -> Result<Json<LeaveRoomResponse>, ApiError> {
    match state
        .service
        .leave_room(&request.game_id, &request.player_id)
        .await
    {
        Ok(closed) => {
            tracing::info!(
                request_id = %request_id,
                room_id = %request.game_id,
                player_id = %request.player_id,
                closed,
                "Player left"
            );
            Ok(Json(LeaveRoomResponse { closed }))
        }
        Err(ServiceError::Room(e @ (RoomError::RoomNotFound | RoomError::PlayerNotInRoom))) => {
            Err(api_error(StatusCode::NOT_FOUND, e.to_string()))
        }
        Err(ServiceError::Room(e)) => Err(api_error(StatusCode::BAD_REQUEST, e.to_string())),
        Err(ServiceError::Hub(e)) => Err(api_error(StatusCode::SERVICE_UNAVAILABLE, e.to_string())),
    }
}

/// List all open rooms, oldest first.
///
/// # Response
///
/// ```json
/// [{"id": "3fa9c1", "host_id": "a07b2e", "state": "waiting",
///   "player_count": 2, "max_players": 5, "round": 0,
///   "created_at": "2026-01-01T00:00:00Z"}]
/// ```
pub async fn list_rooms(State(state): State<AppState>) -> Json<Vec<RoomSummary>> {
    Json(state.service.registry().list().await)
}
