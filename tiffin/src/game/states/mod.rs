//! Lifecycle phases of a room and the outcomes of advancing the drafting cycle.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a single game.
///
/// A round moves `Waiting -> Playing -> Scoring`, after which the game either
/// goes back to `Playing` for the next round or ends in `Finished`.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GamePhase {
    /// Lobby; players may join.
    #[default]
    Waiting,
    /// Drafting: players select cards and hands rotate.
    Playing,
    /// Transient while a round is being scored.
    Scoring,
    /// Terminal. No further mutation is accepted.
    Finished,
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Waiting => "waiting",
            Self::Playing => "playing",
            Self::Scoring => "scoring",
            Self::Finished => "finished",
        };
        write!(f, "{repr}")
    }
}

/// What happened when the drafting cycle was pushed forward.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Advance {
    /// Still waiting on at least one player's selection.
    Waiting,
    /// Every hand moved one seat; the round continues.
    HandsPassed { turn: u32 },
    /// The round was scored and the next round dealt.
    RoundEnded { next_round: u8 },
    /// The last round was scored and final scoring applied.
    GameFinished,
}

impl Advance {
    /// Whether any state changed, i.e. whether views need to be re-sent.
    #[must_use]
    pub fn changed(&self) -> bool {
        !matches!(self, Self::Waiting)
    }
}
