//! Wire messages. Every frame is `{"type": <kind>, "data": <object>}`.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::{ProtocolError, Result};
use crate::game::{GameView, PlayerId};

/// Largest inbound text frame accepted.
pub const MAX_FRAME_BYTES: usize = 16 * 1024;

/// A command from a player's connection.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Pick a card from the current hand by position. Negative positions
    /// are accepted on the wire and rejected by the game.
    SelectCard { card_index: i64 },
    /// Host only.
    StartGame {},
    /// Re-send this connection's view.
    GetState {},
}

impl fmt::Display for ClientMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SelectCard { card_index } => write!(f, "select_card({card_index})"),
            Self::StartGame {} => write!(f, "start_game"),
            Self::GetState {} => write!(f, "get_state"),
        }
    }
}

/// Result of decoding one inbound frame.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Inbound {
    Command(ClientMessage),
    /// Well-formed envelope with a type nobody handles.
    Unknown(String),
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: serde_json::Value,
}

#[derive(Deserialize)]
struct SelectCardData {
    card_index: i64,
}

/// Decode a text frame into a command.
pub fn decode(text: &str) -> Result<Inbound> {
    if text.len() > MAX_FRAME_BYTES {
        return Err(ProtocolError::MessageTooLarge {
            actual: text.len(),
            max: MAX_FRAME_BYTES,
        });
    }

    let envelope: Envelope = serde_json::from_str(text)?;
    let command = match envelope.kind.as_str() {
        "select_card" => {
            let SelectCardData { card_index } = serde_json::from_value(envelope.data)?;
            ClientMessage::SelectCard { card_index }
        }
        "start_game" => ClientMessage::StartGame {},
        "get_state" => ClientMessage::GetState {},
        _ => return Ok(Inbound::Unknown(envelope.kind)),
    };
    Ok(Inbound::Command(command))
}

/// A payload for a player's connection.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The room as the receiving player may see it.
    GameState(GameView),
    PlayerJoined {
        player_id: PlayerId,
        player_name: String,
    },
    Error {
        message: String,
    },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
