//! Fixed game parameters: seat bounds, deck composition and point tables.

use super::entities::CardKind;

/// Fewest players a room can start with.
pub const MIN_PLAYERS: usize = 2;

/// Most players a room can seat.
pub const MAX_PLAYERS: usize = 5;

/// A game always lasts this many rounds.
pub const ROUNDS: u8 = 3;

/// Number of cards of each kind in a full deck. Chai is split evenly across
/// its three icon values.
pub const DECK_COMPOSITION: [(CardKind, usize); 7] = [
    (CardKind::Samosa, 14),
    (CardKind::Biryani, 14),
    (CardKind::Chai, 12),
    (CardKind::GulabJamun, 10),
    (CardKind::PaneerTikka, 14),
    (CardKind::Dosa, 6),
    (CardKind::Raita, 4),
];

/// Chai cards carry one to three icons.
pub const CHAI_ICON_VALUES: [u8; 3] = [1, 2, 3];

/// Size of a freshly built deck.
pub const DECK_SIZE: usize = 74;

pub const SAMOSA_PAIR_POINTS: i32 = 5;

/// Biryani points indexed by count; five or more cards score the last entry.
pub const BIRYANI_POINTS: [i32; 6] = [0, 1, 3, 6, 10, 15];

pub const PANEER_TRIPLE_POINTS: i32 = 10;

pub const CHAI_FIRST_PRIZE: i32 = 6;
pub const CHAI_SECOND_PRIZE: i32 = 3;

/// Awarded to the most gulab jamun and taken from the fewest at game end.
pub const PUDDING_POINTS: i32 = 6;

/// The fewest-pudding penalty only applies with at least this many players.
pub const PUDDING_PENALTY_MIN_PLAYERS: usize = 3;

/// Display names longer than this are truncated.
pub const MAX_NAME_LENGTH: usize = 32;

pub const DEFAULT_PLAYER_NAME: &str = "Player";

/// Random bytes behind room and player identifiers (hex encoded).
pub const ID_BYTES: usize = 3;

/// Cards dealt to each player for a given table size.
#[must_use]
pub const fn cards_per_hand(player_count: usize) -> usize {
    match player_count {
        2 => 10,
        3 => 9,
        4 => 8,
        5 => 7,
        _ => 8,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deck_size_matches_composition() {
        let total: usize = DECK_COMPOSITION.iter().map(|(_, count)| count).sum();
        assert_eq!(total, DECK_SIZE);
    }

    #[test]
    fn test_chai_split_evenly() {
        let chai = DECK_COMPOSITION
            .iter()
            .find(|(kind, _)| *kind == CardKind::Chai)
            .map(|(_, count)| *count)
            .unwrap();
        assert_eq!(chai % CHAI_ICON_VALUES.len(), 0);
    }

    #[test]
    fn test_cards_per_hand() {
        assert_eq!(cards_per_hand(2), 10);
        assert_eq!(cards_per_hand(3), 9);
        assert_eq!(cards_per_hand(4), 8);
        assert_eq!(cards_per_hand(5), 7);
    }

    #[test]
    fn test_cards_per_hand_fallback() {
        assert_eq!(cards_per_hand(0), 8);
        assert_eq!(cards_per_hand(1), 8);
        assert_eq!(cards_per_hand(6), 8);
    }

    #[test]
    fn test_full_table_fits_in_deck() {
        assert!(cards_per_hand(MAX_PLAYERS) * MAX_PLAYERS <= DECK_SIZE);
        assert!(cards_per_hand(MIN_PLAYERS) * MIN_PLAYERS <= DECK_SIZE);
    }
}
