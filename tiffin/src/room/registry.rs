//! Process-wide map of live rooms.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc};
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::game::{Game, GameError, GamePhase, GameSettings, PlayerId, RoomId};

/// Shared handle to one room's game. Lock it for the whole logical action.
pub type RoomHandle = Arc<Mutex<Game>>;

/// A room held locked past the call that produced it.
pub type RoomGuard = OwnedMutexGuard<Game>;

#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum RoomError {
    #[error("game not found")]
    RoomNotFound,
    #[error("game already started")]
    GameAlreadyStarted,
    #[error("game is full")]
    RoomFull,
    #[error("player not in game")]
    PlayerNotInRoom,
}

impl From<GameError> for RoomError {
    fn from(value: GameError) -> Self {
        match value {
            GameError::GameFull => Self::RoomFull,
            GameError::UnknownPlayer => Self::PlayerNotInRoom,
            _ => Self::GameAlreadyStarted,
        }
    }
}

/// Room metadata for discovery.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RoomSummary {
    pub id: RoomId,
    pub host_id: PlayerId,
    pub state: GamePhase,
    pub player_count: usize,
    pub max_players: usize,
    pub round: u8,
    pub created_at: DateTime<Utc>,
}

/// Thread-safe registry of rooms.
///
/// The map lock is always taken before any room lock and is never acquired
/// while a room lock is held.
pub struct RoomRegistry {
    rooms: RwLock<HashMap<RoomId, RoomHandle>>,
    settings: GameSettings,
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new(GameSettings::default())
    }
}

impl RoomRegistry {
    #[must_use]
    pub fn new(settings: GameSettings) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            settings,
        }
    }

    /// Create a waiting room with its host seated.
    ///
    /// # Arguments
    ///
    /// * `host_name` - Requested display name of the host
    ///
    /// # Returns
    ///
    /// * `(RoomId, PlayerId)` - The new room and the host's player id
    pub async fn create(&self, host_name: &str) -> (RoomId, PlayerId) {
        let mut rooms = self.rooms.write().await;
        let mut room_id = RoomId::generate();
        while rooms.contains_key(&room_id) {
            room_id = RoomId::generate();
        }
        let host_id = PlayerId::generate();
        let game = Game::with_settings(room_id.clone(), host_id.clone(), host_name, self.settings);
        rooms.insert(room_id.clone(), Arc::new(Mutex::new(game)));
        let count = rooms.len();
        drop(rooms);

        metrics::counter!("rooms_created_total").increment(1);
        metrics::gauge!("active_rooms").set(count as f64);
        log::info!("Created room {} hosted by {}", room_id, host_id);
        (room_id, host_id)
    }

    /// Seat a player in a waiting room.
    ///
    /// # Arguments
    ///
    /// * `room_id` - Room to join
    /// * `player_id` - Id to seat the player under
    /// * `name` - Requested display name
    ///
    /// # Returns
    ///
    /// * `Result<bool, RoomError>` - `false` if the player was already seated
    pub async fn join(
        &self,
        room_id: &RoomId,
        player_id: PlayerId,
        name: &str,
    ) -> Result<bool, RoomError> {
        Ok(self.join_locked(room_id, player_id, name).await?.is_some())
    }

    /// Seat a player and hand back the room still locked, so the caller can
    /// announce the join before anything else happens in the room.
    ///
    /// Returns `None` if the player was already seated.
    pub async fn join_locked(
        &self,
        room_id: &RoomId,
        player_id: PlayerId,
        name: &str,
    ) -> Result<Option<RoomGuard>, RoomError> {
        let room = self.get(room_id).await.ok_or(RoomError::RoomNotFound)?;
        let mut game = room.lock_owned().await;
        if !game.add_player(player_id.clone(), name)? {
            return Ok(None);
        }
        log::info!(
            "Player {} joined room {} ({} seated)",
            player_id,
            room_id,
            game.player_count()
        );
        Ok(Some(game))
    }

    /// Remove a player. The room is closed when nobody is left or when the
    /// host walks out of a room that has not started.
    ///
    /// # Returns
    ///
    /// * `Result<bool, RoomError>` - Whether the room was closed
    pub async fn leave(&self, room_id: &RoomId, player_id: &PlayerId) -> Result<bool, RoomError> {
        let mut rooms = self.rooms.write().await;
        let room = rooms.get(room_id).cloned().ok_or(RoomError::RoomNotFound)?;
        let mut game = room.lock().await;
        if game.remove_player(player_id).is_none() {
            return Err(RoomError::PlayerNotInRoom);
        }
        let close = game.player_count() == 0
            || (game.phase() == GamePhase::Waiting && game.is_host(player_id));
        drop(game);

        if close {
            rooms.remove(room_id);
            metrics::gauge!("active_rooms").set(rooms.len() as f64);
            log::info!("Closed room {}", room_id);
        } else {
            log::info!("Player {} left room {}", player_id, room_id);
        }
        Ok(close)
    }

    /// Shared handle to a room's game.
    pub async fn get(&self, room_id: &RoomId) -> Option<RoomHandle> {
        self.rooms.read().await.get(room_id).cloned()
    }

    /// Summaries of every room, oldest first.
    pub async fn list(&self) -> Vec<RoomSummary> {
        let rooms = self.rooms.read().await;
        let mut summaries = Vec::with_capacity(rooms.len());
        for room in rooms.values() {
            let game = room.lock().await;
            summaries.push(RoomSummary {
                id: game.id().clone(),
                host_id: game.host_id().clone(),
                state: game.phase(),
                player_count: game.player_count(),
                max_players: game.settings().max_players,
                round: game.round(),
                created_at: game.created_at(),
            });
        }
        drop(rooms);
        summaries.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        summaries
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }
}
