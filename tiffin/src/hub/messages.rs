//! Hub message types.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use crate::{
    game::{GameViews, PlayerId, RoomId},
    net::messages::ServerMessage,
};

/// Identifies one websocket connection. A player may hold several.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A live client connection as the hub sees it.
#[derive(Debug)]
pub struct Connection {
    pub id: ConnectionId,
    pub room_id: RoomId,
    pub player_id: PlayerId,
    /// Serialized frames for the connection's writer task.
    pub outbound: mpsc::Sender<String>,
}

/// Messages that can be sent to the HubActor
#[derive(Debug)]
pub enum HubMessage {
    /// Start delivering to a new connection
    Register { connection: Connection },

    /// Stop delivering to a connection and close its queue
    Unregister { connection_id: ConnectionId },

    /// Drop a player's connections in a room, or every connection in the
    /// room when `player_id` is `None`. Their queues close.
    Evict {
        room_id: RoomId,
        player_id: Option<PlayerId>,
    },

    /// Same payload to every connection in a room
    Broadcast {
        room_id: RoomId,
        message: ServerMessage,
    },

    /// Each connection in a room gets the view rendered for its player
    SendViews { room_id: RoomId, views: GameViews },

    /// Payload for exactly one connection
    SendTo {
        connection_id: ConnectionId,
        message: ServerMessage,
    },

    /// Count live connections, in one room or overall
    ConnectionCount {
        room_id: Option<RoomId>,
        response: oneshot::Sender<usize>,
    },
}
