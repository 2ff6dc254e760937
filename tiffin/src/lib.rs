//! # Tiffin
//!
//! Server core for Tiffin, a trick-drafting food card game for 2 to 5 players.
//!
//! Every turn each player secretly picks one card from their hand, then all
//! hands pass one seat along. When the hands run out the round is scored;
//! after three rounds gulab jamun puddings are settled and the game ends.
//!
//! ## Architecture
//!
//! - [`game`]: cards, scoring and the authoritative per-room state machine
//! - [`room`]: registry of live rooms, each behind its own lock
//! - [`hub`]: actor fanning per-player views out to live connections
//! - [`net`]: JSON wire messages
//! - [`service`]: decodes frames, drives a room and hands views to the hub
//!
//! Transport (HTTP and websockets) lives in the `tiffin_server` crate.
//!
//! ## Example
//!
//! ```
//! use tiffin::game::{Game, PlayerId, RoomId};
//!
//! let mut game = Game::new(RoomId::from("abc123"), PlayerId::from("host"), "Asha");
//! game.add_player(PlayerId::from("guest"), "Ravi").unwrap();
//! game.start().unwrap();
//! assert_eq!(game.round(), 1);
//! ```

/// Core game logic, entities, and state machine.
pub mod game;
pub use game::{
    Advance, Card, CardKind, Game, GameError, GamePhase, GameSettings, GameView, PlayerId,
    RoomId, constants, entities, scoring,
};

/// Sync hub for live connections.
pub mod hub;
pub use hub::{HubActor, HubConfig, HubHandle};

/// Wire protocol.
pub mod net;
pub use net::messages::{self, ClientMessage, ServerMessage};

/// Room registry.
pub mod room;
pub use room::{RoomError, RoomRegistry, RoomSummary};

/// Game service.
pub mod service;
pub use service::{GameService, ServiceError, Session};
