//! Sync hub actor: the only owner of the live connection set.

use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use super::{
    config::HubConfig,
    messages::{Connection, ConnectionId, HubMessage},
};
use crate::{
    game::{GameViews, PlayerId, RoomId},
    net::messages::ServerMessage,
};

#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub enum HubError {
    #[error("hub is closed")]
    Closed,
}

/// Hub handle for sending messages
#[derive(Clone, Debug)]
pub struct HubHandle {
    sender: mpsc::Sender<HubMessage>,
    outbound_capacity: usize,
}

impl HubHandle {
    /// Send a message to the hub
    pub async fn send(&self, message: HubMessage) -> Result<(), HubError> {
        self.sender.send(message).await.map_err(|_| HubError::Closed)
    }

    /// A fresh bounded queue sized for one connection's outbound frames.
    #[must_use]
    pub fn outbound_channel(&self) -> (mpsc::Sender<String>, mpsc::Receiver<String>) {
        mpsc::channel(self.outbound_capacity)
    }

    pub async fn register(&self, connection: Connection) -> Result<(), HubError> {
        self.send(HubMessage::Register { connection }).await
    }

    pub async fn unregister(&self, connection_id: ConnectionId) -> Result<(), HubError> {
        self.send(HubMessage::Unregister { connection_id }).await
    }

    /// Close the connections of one player in a room, or of the whole room.
    pub async fn evict(&self, room_id: RoomId, player_id: Option<PlayerId>) -> Result<(), HubError> {
        self.send(HubMessage::Evict { room_id, player_id }).await
    }

    pub async fn broadcast(&self, room_id: RoomId, message: ServerMessage) -> Result<(), HubError> {
        self.send(HubMessage::Broadcast { room_id, message }).await
    }

    pub async fn send_views(&self, room_id: RoomId, views: GameViews) -> Result<(), HubError> {
        self.send(HubMessage::SendViews { room_id, views }).await
    }

    pub async fn send_to(
        &self,
        connection_id: ConnectionId,
        message: ServerMessage,
    ) -> Result<(), HubError> {
        self.send(HubMessage::SendTo {
            connection_id,
            message,
        })
        .await
    }

    /// Live connections in `room_id`, or in every room when `None`.
    ///
    /// Answered after every message sent before it, so it doubles as a
    /// barrier.
    pub async fn connection_count(&self, room_id: Option<RoomId>) -> Result<usize, HubError> {
        let (response, rx) = oneshot::channel();
        self.send(HubMessage::ConnectionCount { room_id, response })
            .await?;
        rx.await.map_err(|_| HubError::Closed)
    }
}

/// Serialized fan-out loop. Connection state is touched nowhere else.
pub struct HubActor {
    /// Message inbox
    inbox: mpsc::Receiver<HubMessage>,

    /// Live connections by id
    connections: HashMap<ConnectionId, Connection>,
}

impl HubActor {
    /// Create a new hub actor
    ///
    /// # Returns
    ///
    /// * `(HubActor, HubHandle)` - Actor and handle for sending messages
    #[must_use]
    pub fn new(config: &HubConfig) -> (Self, HubHandle) {
        let (sender, inbox) = mpsc::channel(config.inbox_capacity.max(1));
        let actor = Self {
            inbox,
            connections: HashMap::new(),
        };
        let handle = HubHandle {
            sender,
            outbound_capacity: config.outbound_capacity.max(1),
        };
        (actor, handle)
    }

    /// Create the actor and run it on the current runtime.
    #[must_use]
    pub fn spawn(config: &HubConfig) -> HubHandle {
        let (actor, handle) = Self::new(config);
        tokio::spawn(actor.run());
        handle
    }

    /// Run the hub event loop until every handle is dropped
    pub async fn run(mut self) {
        log::info!("Sync hub starting");

        while let Some(message) = self.inbox.recv().await {
            self.handle_message(message);
        }

        log::info!(
            "Sync hub stopped with {} connections open",
            self.connections.len()
        );
    }

    fn handle_message(&mut self, message: HubMessage) {
        match message {
            HubMessage::Register { connection } => {
                log::debug!(
                    "Connection {} registered for player {} in room {}",
                    connection.id,
                    connection.player_id,
                    connection.room_id
                );
                self.connections.insert(connection.id, connection);
                self.report_connections();
            }

            HubMessage::Unregister { connection_id } => {
                if self.connections.remove(&connection_id).is_some() {
                    log::debug!("Connection {} unregistered", connection_id);
                    self.report_connections();
                }
            }

            HubMessage::Evict { room_id, player_id } => {
                let before = self.connections.len();
                self.connections.retain(|_, connection| {
                    connection.room_id != room_id
                        || player_id
                            .as_ref()
                            .is_some_and(|player_id| connection.player_id != *player_id)
                });
                let evicted = before - self.connections.len();
                if evicted > 0 {
                    log::debug!("Room {}: evicted {} connections", room_id, evicted);
                    self.report_connections();
                }
            }

            HubMessage::Broadcast { room_id, message } => {
                match message.to_json() {
                    Ok(text) => self.deliver_room(&room_id, |_| Some(&text)),
                    Err(e) => log::error!("Room {}: failed to encode broadcast: {}", room_id, e),
                }
            }

            HubMessage::SendViews { room_id, views } => {
                let payloads = encode_views(&room_id, views);
                self.deliver_room(&room_id, |player_id| payloads.get(player_id));
            }

            HubMessage::SendTo {
                connection_id,
                message,
            } => {
                let text = match message.to_json() {
                    Ok(text) => text,
                    Err(e) => {
                        log::error!("Failed to encode message for {}: {}", connection_id, e);
                        return;
                    }
                };
                let keep = self
                    .connections
                    .get(&connection_id)
                    .is_none_or(|connection| deliver(connection, &text));
                if !keep {
                    self.connections.remove(&connection_id);
                    self.report_connections();
                }
            }

            HubMessage::ConnectionCount { room_id, response } => {
                let count = match room_id {
                    Some(room_id) => self
                        .connections
                        .values()
                        .filter(|c| c.room_id == room_id)
                        .count(),
                    None => self.connections.len(),
                };
                let _ = response.send(count);
            }
        }
    }

    /// Send to every connection of a room whose player has a payload,
    /// dropping any connection that cannot take it.
    fn deliver_room<'a, F>(&mut self, room_id: &RoomId, payload_for: F)
    where
        F: Fn(&PlayerId) -> Option<&'a String>,
    {
        let before = self.connections.len();
        self.connections.retain(|_, connection| {
            if connection.room_id != *room_id {
                return true;
            }
            match payload_for(&connection.player_id) {
                Some(text) => deliver(connection, text),
                None => true,
            }
        });
        if self.connections.len() != before {
            self.report_connections();
        }
    }

    fn report_connections(&self) {
        metrics::gauge!("websocket_connections_active").set(self.connections.len() as f64);
    }
}

fn encode_views(room_id: &RoomId, views: GameViews) -> HashMap<PlayerId, String> {
    views
        .into_iter()
        .filter_map(
            |(player_id, view)| match ServerMessage::GameState(view).to_json() {
                Ok(text) => Some((player_id, text)),
                Err(e) => {
                    log::error!("Room {}: failed to encode view for {}: {}", room_id, player_id, e);
                    None
                }
            },
        )
        .collect()
}

/// Queue one frame. Returns whether the connection should be kept.
fn deliver(connection: &Connection, text: &str) -> bool {
    match connection.outbound.try_send(text.to_string()) {
        Ok(()) => {
            metrics::counter!("websocket_messages_sent_total").increment(1);
            true
        }
        Err(mpsc::error::TrySendError::Full(_)) => {
            log::warn!(
                "Connection {} (player {}) is not keeping up, disconnecting",
                connection.id,
                connection.player_id
            );
            metrics::counter!("slow_consumers_dropped_total").increment(1);
            false
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            log::debug!("Connection {} closed, removing", connection.id);
            false
        }
    }
}
