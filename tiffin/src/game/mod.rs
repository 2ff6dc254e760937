//! Game engine: cards, scoring and the per-room state machine.

pub mod constants;
pub mod entities;
pub mod scoring;
pub mod state_machine;
pub mod states;

pub use entities::{
    Card, CardKind, Deck, GameView, GameViews, Player, PlayerId, PlayerView, RoomId,
    normalize_name,
};
pub use state_machine::{Game, GameError, GameSettings};
pub use states::{Advance, GamePhase};
