//! Game service tying rooms to the sync hub.
//!
//! Every action locks its room once and keeps the lock until the resulting
//! views are in the hub inbox, so broadcasts reach the hub in mutation order.

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::{
    game::{Game, GameError, PlayerId, RoomId},
    hub::{Connection, ConnectionId, HubError, HubHandle},
    net::messages::{ClientMessage, Inbound, ServerMessage, decode},
    room::{RoomError, RoomHandle, RoomRegistry},
};

/// Reported to players in place of internal faults.
const INTERNAL_ERROR_MESSAGE: &str = "internal server error";

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Room(#[from] RoomError),
    #[error(transparent)]
    Hub(#[from] HubError),
}

/// One registered connection: who it is and where it sits.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Session {
    pub connection_id: ConnectionId,
    pub room_id: RoomId,
    pub player_id: PlayerId,
}

#[derive(Clone)]
pub struct GameService {
    registry: Arc<RoomRegistry>,
    hub: HubHandle,
}

impl GameService {
    #[must_use]
    pub fn new(registry: Arc<RoomRegistry>, hub: HubHandle) -> Self {
        Self { registry, hub }
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<RoomRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn hub(&self) -> &HubHandle {
        &self.hub
    }

    /// Open a room with the caller as host.
    pub async fn create_room(&self, host_name: &str) -> (RoomId, PlayerId) {
        self.registry.create(host_name).await
    }

    /// Seat a new player and tell the room about it.
    ///
    /// The room stays locked from the seat being taken until both the
    /// announcement and the fresh views are queued, so no other action's
    /// state reaches the room in between.
    pub async fn join_room(&self, room_id: &RoomId, name: &str) -> Result<PlayerId, ServiceError> {
        let mut player_id = PlayerId::generate();
        let game = loop {
            match self
                .registry
                .join_locked(room_id, player_id.clone(), name)
                .await?
            {
                Some(game) => break game,
                None => player_id = PlayerId::generate(),
            }
        };

        let Some(player_name) = game.player(&player_id).map(|p| p.name.clone()) else {
            return Err(RoomError::PlayerNotInRoom.into());
        };
        self.hub
            .broadcast(
                room_id.clone(),
                ServerMessage::PlayerJoined {
                    player_id: player_id.clone(),
                    player_name,
                },
            )
            .await?;
        self.hub.send_views(room_id.clone(), game.views()).await?;
        Ok(player_id)
    }

    /// Remove a player and close their connections to the room. If the room
    /// survives, the others may now all have selected, so the drafting cycle
    /// is pushed forward before re-sending state. A closed room loses every
    /// connection.
    ///
    /// # Returns
    ///
    /// * `Result<bool, ServiceError>` - Whether the room was closed
    pub async fn leave_room(
        &self,
        room_id: &RoomId,
        player_id: &PlayerId,
    ) -> Result<bool, ServiceError> {
        let closed = self.registry.leave(room_id, player_id).await?;
        if closed {
            self.hub.evict(room_id.clone(), None).await?;
            return Ok(true);
        }
        if let Some(room) = self.registry.get(room_id).await {
            let mut game = room.lock().await;
            self.hub
                .evict(room_id.clone(), Some(player_id.clone()))
                .await?;
            if let Err(e) = game.advance() {
                log::error!("Room {}: advance after leave failed: {}", room_id, e);
            }
            self.hub.send_views(room_id.clone(), game.views()).await?;
        }
        Ok(false)
    }

    /// Register a connection for a seated player and send the room's state.
    pub async fn connect(
        &self,
        room_id: &RoomId,
        player_id: &PlayerId,
        outbound: mpsc::Sender<String>,
    ) -> Result<Session, ServiceError> {
        let room = self.room(room_id).await?;
        let game = room.lock().await;
        if !game.has_player(player_id) {
            return Err(RoomError::PlayerNotInRoom.into());
        }

        let session = Session {
            connection_id: ConnectionId::new(),
            room_id: room_id.clone(),
            player_id: player_id.clone(),
        };
        self.hub
            .register(Connection {
                id: session.connection_id,
                room_id: room_id.clone(),
                player_id: player_id.clone(),
                outbound,
            })
            .await?;
        self.hub.send_views(room_id.clone(), game.views()).await?;
        log::info!(
            "Player {} connected to room {} ({})",
            player_id,
            room_id,
            session.connection_id
        );
        Ok(session)
    }

    pub async fn disconnect(&self, session: &Session) -> Result<(), HubError> {
        log::info!(
            "Player {} disconnected from room {} ({})",
            session.player_id,
            session.room_id,
            session.connection_id
        );
        self.hub.unregister(session.connection_id).await
    }

    /// Decode one inbound text frame and act on it.
    pub async fn handle_frame(&self, session: &Session, text: &str) -> Result<(), HubError> {
        match decode(text) {
            Ok(Inbound::Command(command)) => self.handle_command(session, command).await,
            Ok(Inbound::Unknown(kind)) => {
                log::debug!(
                    "Ignoring unknown message type '{}' from {}",
                    kind,
                    session.connection_id
                );
                Ok(())
            }
            Err(e) => {
                log::debug!("Bad frame from {}: {}", session.connection_id, e);
                self.send_error(session, e.to_string()).await
            }
        }
    }

    pub async fn handle_command(
        &self,
        session: &Session,
        command: ClientMessage,
    ) -> Result<(), HubError> {
        log::debug!("{} sent {}", session.player_id, command);
        let Some(room) = self.registry.get(&session.room_id).await else {
            return self
                .send_error(session, RoomError::RoomNotFound.to_string())
                .await;
        };
        let mut game = room.lock().await;

        match command {
            ClientMessage::SelectCard { card_index } => {
                let index = usize::try_from(card_index).unwrap_or(usize::MAX);
                if let Err(e) = game.select_card(&session.player_id, index) {
                    drop(game);
                    return self.reject(session, e).await;
                }
                self.broadcast_state(&game).await?;
                match game.advance() {
                    Ok(outcome) if outcome.changed() => {
                        log::debug!("Room {}: {:?}", session.room_id, outcome);
                        self.broadcast_state(&game).await
                    }
                    Ok(_) => Ok(()),
                    Err(e) => {
                        drop(game);
                        self.reject(session, e).await
                    }
                }
            }

            ClientMessage::StartGame {} => {
                if !game.is_host(&session.player_id) {
                    drop(game);
                    return self.reject(session, GameError::NotHost).await;
                }
                match game.start() {
                    Ok(()) => self.broadcast_state(&game).await,
                    Err(e) => {
                        drop(game);
                        self.reject(session, e).await
                    }
                }
            }

            ClientMessage::GetState {} => {
                let view = game.view_for(&session.player_id);
                self.hub
                    .send_to(session.connection_id, ServerMessage::GameState(view))
                    .await
            }
        }
    }

    /// Queue one sanitized view per seated player.
    pub async fn broadcast_state(&self, game: &Game) -> Result<(), HubError> {
        self.hub.send_views(game.id().clone(), game.views()).await
    }

    pub async fn send_error(
        &self,
        session: &Session,
        message: impl Into<String>,
    ) -> Result<(), HubError> {
        self.hub
            .send_to(session.connection_id, ServerMessage::error(message))
            .await
    }

    async fn reject(&self, session: &Session, error: GameError) -> Result<(), HubError> {
        if error.is_internal() {
            log::error!(
                "Room {}: internal error handling {}: {}",
                session.room_id,
                session.player_id,
                error
            );
            return self.send_error(session, INTERNAL_ERROR_MESSAGE).await;
        }
        self.send_error(session, error.to_string()).await
    }

    async fn room(&self, room_id: &RoomId) -> Result<RoomHandle, RoomError> {
        self.registry
            .get(room_id)
            .await
            .ok_or(RoomError::RoomNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::{HubActor, HubConfig};

    fn service() -> GameService {
        GameService::new(
            Arc::new(RoomRegistry::default()),
            HubActor::spawn(&HubConfig::default()),
        )
    }

    async fn drain(service: &GameService, rx: &mut mpsc::Receiver<String>) -> Vec<ServerMessage> {
        service.hub().connection_count(None).await.unwrap();
        let mut frames = Vec::new();
        while let Ok(text) = rx.try_recv() {
            frames.push(serde_json::from_str(&text).unwrap());
        }
        frames
    }

    #[tokio::test]
    async fn test_connect_unknown_player() {
        let service = service();
        let (room_id, _) = service.create_room("Host").await;
        let (tx, _rx) = service.hub().outbound_channel();
        let result = service
            .connect(&room_id, &PlayerId::from("nobody"), tx)
            .await;
        assert!(matches!(
            result,
            Err(ServiceError::Room(RoomError::PlayerNotInRoom))
        ));
    }

    #[tokio::test]
    async fn test_connect_sends_state() {
        let service = service();
        let (room_id, host) = service.create_room("Host").await;
        let (tx, mut rx) = service.hub().outbound_channel();
        service.connect(&room_id, &host, tx).await.unwrap();

        let frames = drain(&service, &mut rx).await;
        assert_eq!(frames.len(), 1);
        assert!(matches!(&frames[0], ServerMessage::GameState(view) if view.players.len() == 1));
    }

    #[tokio::test]
    async fn test_malformed_frame_errors_to_sender() {
        let service = service();
        let (room_id, host) = service.create_room("Host").await;
        let (tx, mut rx) = service.hub().outbound_channel();
        let session = service.connect(&room_id, &host, tx).await.unwrap();
        drain(&service, &mut rx).await;

        service.handle_frame(&session, "{oops").await.unwrap();

        let frames = drain(&service, &mut rx).await;
        assert!(matches!(&frames[..], [ServerMessage::Error { .. }]));
    }

    #[tokio::test]
    async fn test_unknown_type_ignored() {
        let service = service();
        let (room_id, host) = service.create_room("Host").await;
        let (tx, mut rx) = service.hub().outbound_channel();
        let session = service.connect(&room_id, &host, tx).await.unwrap();
        drain(&service, &mut rx).await;

        service
            .handle_frame(&session, r#"{"type":"wave","data":{}}"#)
            .await
            .unwrap();

        assert!(drain(&service, &mut rx).await.is_empty());
    }

    #[tokio::test]
    async fn test_start_alone_is_rejected() {
        let service = service();
        let (room_id, host) = service.create_room("Host").await;
        let (tx, mut rx) = service.hub().outbound_channel();
        let session = service.connect(&room_id, &host, tx).await.unwrap();
        drain(&service, &mut rx).await;

        service
            .handle_command(&session, ClientMessage::StartGame {})
            .await
            .unwrap();

        let frames = drain(&service, &mut rx).await;
        assert_eq!(
            frames,
            vec![ServerMessage::error("cannot start game: need 2-5 players")]
        );
    }

    #[tokio::test]
    async fn test_command_for_closed_room() {
        let service = service();
        let (room_id, host) = service.create_room("Host").await;
        let (tx, mut rx) = service.hub().outbound_channel();
        let session = service.connect(&room_id, &host, tx).await.unwrap();
        service.leave_room(&room_id, &host).await.unwrap();
        drain(&service, &mut rx).await;

        service
            .handle_command(&session, ClientMessage::GetState {})
            .await
            .unwrap();

        assert_eq!(
            drain(&service, &mut rx).await,
            vec![ServerMessage::error("game not found")]
        );
    }
}
