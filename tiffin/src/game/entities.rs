use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt};

use super::{constants, states::GamePhase};

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CardKind {
    /// Pairs score 5.
    Samosa,
    /// Set collection: 1, 3, 6, 10, 15.
    Biryani,
    /// Most icons take 6, runner-up takes 3.
    Chai,
    /// Pudding. Kept across rounds and scored at game end.
    GulabJamun,
    /// Every three score 10.
    PaneerTikka,
    /// Multiplier. Raises a flag on the player; never scored.
    Dosa,
    /// Extra play. Never scored.
    Raita,
}

impl CardKind {
    pub const ALL: [CardKind; 7] = [
        Self::Samosa,
        Self::Biryani,
        Self::Chai,
        Self::GulabJamun,
        Self::PaneerTikka,
        Self::Dosa,
        Self::Raita,
    ];

    #[must_use]
    pub const fn is_pudding(self) -> bool {
        matches!(self, Self::GulabJamun)
    }
}

impl fmt::Display for CardKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Samosa => "samosa",
            Self::Biryani => "biryani",
            Self::Chai => "chai",
            Self::GulabJamun => "gulab jamun",
            Self::PaneerTikka => "paneer tikka",
            Self::Dosa => "dosa",
            Self::Raita => "raita",
        };
        write!(f, "{repr}")
    }
}

/// A card is a kind plus an icon count. Only chai carries icons (1-3);
/// every other kind has a value of 0.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Card {
    #[serde(rename = "type")]
    pub kind: CardKind,
    pub value: u8,
}

impl Card {
    #[must_use]
    pub const fn new(kind: CardKind) -> Self {
        Self { kind, value: 0 }
    }

    #[must_use]
    pub const fn chai(icons: u8) -> Self {
        Self {
            kind: CardKind::Chai,
            value: icons,
        }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            CardKind::Chai => write!(f, "chai x{}", self.value),
            kind => write!(f, "{kind}"),
        }
    }
}

/// An ordered pile of cards. A fresh deck is built for every deal.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// Empty pile, used before the first deal.
    #[must_use]
    pub fn empty() -> Self {
        Self { cards: Vec::new() }
    }

    /// Copy of this deck in uniformly random order. The deck itself is left
    /// untouched.
    #[must_use]
    pub fn shuffled(&self) -> Self {
        self.shuffled_with(&mut rand::rng())
    }

    #[must_use]
    pub fn shuffled_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Self {
        let mut cards = self.cards.clone();
        cards.shuffle(rng);
        Self { cards }
    }

    /// Take up to `n` cards off the top. Returns fewer when the deck runs out.
    pub fn draw(&mut self, n: usize) -> Vec<Card> {
        let n = n.min(self.cards.len());
        self.cards.drain(..n).collect()
    }

    #[must_use]
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    #[must_use]
    pub fn count(&self, kind: CardKind) -> usize {
        self.cards.iter().filter(|card| card.kind == kind).count()
    }
}

/// The full composition in a fixed order: kinds in table order, chai grouped
/// by icon value.
impl Default for Deck {
    fn default() -> Self {
        let mut cards = Vec::with_capacity(constants::DECK_SIZE);
        for (kind, count) in constants::DECK_COMPOSITION {
            if kind == CardKind::Chai {
                let per_value = count / constants::CHAI_ICON_VALUES.len();
                for icons in constants::CHAI_ICON_VALUES {
                    cards.extend(std::iter::repeat_n(Card::chai(icons), per_value));
                }
            } else {
                cards.extend(std::iter::repeat_n(Card::new(kind), count));
            }
        }
        Self { cards }
    }
}

impl From<Vec<Card>> for Deck {
    fn from(cards: Vec<Card>) -> Self {
        Self { cards }
    }
}

fn random_id() -> String {
    hex::encode(rand::random::<[u8; constants::ID_BYTES]>())
}

/// Identifier of a room, six lowercase hex characters.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    #[must_use]
    pub fn generate() -> Self {
        Self(random_id())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for RoomId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for RoomId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Identifier of a seated player, six lowercase hex characters.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    #[must_use]
    pub fn generate() -> Self {
        Self(random_id())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for PlayerId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for PlayerId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Trim a requested display name, fall back to the default when blank and
/// cap its length.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return constants::DEFAULT_PLAYER_NAME.to_string();
    }
    trimmed.chars().take(constants::MAX_NAME_LENGTH).collect()
}

#[derive(Clone, Debug)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// Cards currently held. Only ever shown to this player.
    pub hand: Vec<Card>,
    /// Cards played this round, plus gulab jamun carried from earlier rounds.
    pub played: Vec<Card>,
    pub score: i32,
    pub round_scores: Vec<i32>,
    pub has_selected: bool,
    /// Set when a dosa was played. Cleared at round boundaries.
    pub dosa_active: bool,
}

impl Player {
    #[must_use]
    pub fn new(id: PlayerId, name: &str) -> Self {
        Self {
            id,
            name: normalize_name(name),
            hand: Vec::new(),
            played: Vec::new(),
            score: 0,
            round_scores: Vec::new(),
            has_selected: false,
            dosa_active: false,
        }
    }

    /// Clear everything tied to a game in progress; used on start.
    pub fn reset(&mut self) {
        self.hand.clear();
        self.played.clear();
        self.has_selected = false;
        self.dosa_active = false;
    }

    /// Drop this round's played cards except gulab jamun.
    pub fn keep_puddings(&mut self) {
        self.played.retain(|card| card.kind.is_pudding());
        self.has_selected = false;
        self.dosa_active = false;
    }

    #[must_use]
    pub fn pudding_count(&self) -> usize {
        self.played
            .iter()
            .filter(|card| card.kind.is_pudding())
            .count()
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub score: i32,
    pub round_scores: Vec<i32>,
    pub has_selected: bool,
    pub played_cards: Vec<Card>,
    pub hand_size: usize,
    /// Present only in the viewer's own entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hand: Option<Vec<Card>>,
    pub is_me: bool,
}

/// A room as seen by one player.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct GameView {
    pub id: RoomId,
    pub state: GamePhase,
    pub round: u8,
    pub turn: u32,
    pub host_id: PlayerId,
    pub players: Vec<PlayerView>,
}

impl GameView {
    /// The viewer's own entry, if the viewer is seated.
    #[must_use]
    pub fn me(&self) -> Option<&PlayerView> {
        self.players.iter().find(|player| player.is_me)
    }
}

pub type GameViews = HashMap<PlayerId, GameView>;
