//! Authoritative per-room game state.
//!
//! A [`Game`] owns its players in seating order and only changes round, turn
//! or phase through [`Game::start`], [`Game::pass_hands`] and
//! [`Game::end_round`]. Callers hold the room lock for a whole action, so
//! nothing here synchronizes.

use chrono::{DateTime, Utc};
use log::{debug, info};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{
    constants::{self, MAX_PLAYERS, MIN_PLAYERS, ROUNDS},
    entities::{Card, CardKind, Deck, GameView, GameViews, Player, PlayerId, PlayerView, RoomId},
    scoring,
    states::{Advance, GamePhase},
};

/// Reasons a game action is rejected. Rejected actions leave the game
/// untouched.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum GameError {
    #[error("player not found")]
    UnknownPlayer,
    #[error("player has already selected a card this turn")]
    AlreadySelected,
    #[error("invalid card index")]
    InvalidCardIndex,
    #[error("game is not in playing state")]
    NotPlaying,
    #[error("game already started")]
    GameAlreadyStarted,
    #[error("game is full")]
    GameFull,
    #[error("cannot start game: need {min}-{max} players")]
    CannotStart { min: usize, max: usize },
    #[error("not all players have selected")]
    NotAllSelected,
    #[error("only host can start the game")]
    NotHost,
    #[error("no players in game")]
    NoPlayers,
}

impl GameError {
    /// Whether the error signals a broken invariant rather than a bad request.
    #[must_use]
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::NoPlayers)
    }
}

/// Seat bounds for a room.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct GameSettings {
    pub min_players: usize,
    pub max_players: usize,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            min_players: MIN_PLAYERS,
            max_players: MAX_PLAYERS,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Game {
    id: RoomId,
    players: Vec<Player>,
    phase: GamePhase,
    round: u8,
    turn: u32,
    host_id: PlayerId,
    deck: Deck,
    settings: GameSettings,
    created_at: DateTime<Utc>,
}

impl Game {
    /// A waiting game with the host already seated.
    #[must_use]
    pub fn new(id: RoomId, host_id: PlayerId, host_name: &str) -> Self {
        Self::with_settings(id, host_id, host_name, GameSettings::default())
    }

    #[must_use]
    pub fn with_settings(
        id: RoomId,
        host_id: PlayerId,
        host_name: &str,
        settings: GameSettings,
    ) -> Self {
        Self {
            id,
            players: vec![Player::new(host_id.clone(), host_name)],
            phase: GamePhase::Waiting,
            round: 0,
            turn: 0,
            host_id,
            deck: Deck::empty(),
            settings,
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn id(&self) -> &RoomId {
        &self.id
    }

    #[must_use]
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    #[must_use]
    pub fn round(&self) -> u8 {
        self.round
    }

    #[must_use]
    pub fn turn(&self) -> u32 {
        self.turn
    }

    #[must_use]
    pub fn host_id(&self) -> &PlayerId {
        &self.host_id
    }

    #[must_use]
    pub fn is_host(&self, player_id: &PlayerId) -> bool {
        self.host_id == *player_id
    }

    #[must_use]
    pub fn settings(&self) -> GameSettings {
        self.settings
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Players in seating order.
    #[must_use]
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    #[must_use]
    pub fn player(&self, player_id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == *player_id)
    }

    fn player_mut(&mut self, player_id: &PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == *player_id)
    }

    #[must_use]
    pub fn seating_order(&self) -> Vec<PlayerId> {
        self.players.iter().map(|p| p.id.clone()).collect()
    }

    #[must_use]
    pub fn has_player(&self, player_id: &PlayerId) -> bool {
        self.player(player_id).is_some()
    }

    #[must_use]
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.players.len() >= self.settings.max_players
    }

    /// Cards left over after the most recent deal.
    #[must_use]
    pub fn undealt(&self) -> &Deck {
        &self.deck
    }

    /// Seat a new player at the end of the seating order.
    ///
    /// Returns `Ok(false)` if the player is already seated. A started or
    /// full room rejects even seated players.
    pub fn add_player(&mut self, player_id: PlayerId, name: &str) -> Result<bool, GameError> {
        if self.phase != GamePhase::Waiting {
            return Err(GameError::GameAlreadyStarted);
        }
        if self.is_full() {
            return Err(GameError::GameFull);
        }
        if self.has_player(&player_id) {
            return Ok(false);
        }
        self.players.push(Player::new(player_id, name));
        Ok(true)
    }

    /// Remove a player in any phase. Their hand leaves the game with them.
    pub fn remove_player(&mut self, player_id: &PlayerId) -> Option<Player> {
        let idx = self.players.iter().position(|p| p.id == *player_id)?;
        Some(self.players.remove(idx))
    }

    #[must_use]
    pub fn can_start(&self) -> bool {
        let n = self.players.len();
        self.phase == GamePhase::Waiting
            && n >= self.settings.min_players
            && n <= self.settings.max_players
    }

    /// Begin round one.
    pub fn start(&mut self) -> Result<(), GameError> {
        self.start_with(&mut rand::rng())
    }

    pub fn start_with<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), GameError> {
        if self.phase != GamePhase::Waiting {
            return Err(GameError::GameAlreadyStarted);
        }
        if !self.can_start() {
            return Err(GameError::CannotStart {
                min: self.settings.min_players,
                max: self.settings.max_players,
            });
        }

        for player in &mut self.players {
            player.reset();
        }
        self.round = 1;
        self.turn = 1;
        self.deal_with(rng);
        self.phase = GamePhase::Playing;
        info!(
            "Room {}: game started with {} players",
            self.id,
            self.players.len()
        );
        Ok(())
    }

    /// Shuffle a fresh deck and deal a hand to every player in seating order.
    pub fn deal_with<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let mut deck = Deck::default().shuffled_with(rng);
        let per_hand = constants::cards_per_hand(self.players.len());
        for player in &mut self.players {
            player.hand = deck.draw(per_hand);
        }
        debug!(
            "Room {}: dealt {} cards each, {} left",
            self.id,
            per_hand,
            deck.len()
        );
        self.deck = deck;
    }

    /// Move one card from the player's hand to their played pile.
    pub fn select_card(&mut self, player_id: &PlayerId, index: usize) -> Result<Card, GameError> {
        if self.phase != GamePhase::Playing {
            return Err(GameError::NotPlaying);
        }
        let player = self
            .player_mut(player_id)
            .ok_or(GameError::UnknownPlayer)?;
        if player.has_selected {
            return Err(GameError::AlreadySelected);
        }
        if index >= player.hand.len() {
            return Err(GameError::InvalidCardIndex);
        }

        let card = player.hand.remove(index);
        player.played.push(card);
        player.has_selected = true;
        if card.kind == CardKind::Dosa {
            player.dosa_active = true;
        }
        Ok(card)
    }

    #[must_use]
    pub fn all_selected(&self) -> bool {
        self.players.iter().all(|p| p.has_selected)
    }

    /// Rotate every hand one seat forward once everyone has picked.
    ///
    /// Ends the round when no hand has more than one card left.
    pub fn pass_hands(&mut self) -> Result<Advance, GameError> {
        if self.phase != GamePhase::Playing {
            return Err(GameError::NotPlaying);
        }
        if !self.all_selected() {
            return Err(GameError::NotAllSelected);
        }
        if self.players.is_empty() {
            return Err(GameError::NoPlayers);
        }

        let mut hands: Vec<Vec<Card>> = self
            .players
            .iter_mut()
            .map(|p| std::mem::take(&mut p.hand))
            .collect();
        hands.rotate_right(1);
        for (player, hand) in self.players.iter_mut().zip(hands) {
            player.hand = hand;
            player.has_selected = false;
        }
        self.turn += 1;

        if self.players.iter().all(|p| p.hand.len() <= 1) {
            return self.end_round();
        }
        Ok(Advance::HandsPassed { turn: self.turn })
    }

    /// Score the round, then either redeal for the next one or finish.
    pub fn end_round(&mut self) -> Result<Advance, GameError> {
        self.end_round_with(&mut rand::rng())
    }

    pub fn end_round_with<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Advance, GameError> {
        if self.phase != GamePhase::Playing {
            return Err(GameError::NotPlaying);
        }
        self.phase = GamePhase::Scoring;

        let piles: Vec<&[Card]> = self.players.iter().map(|p| p.played.as_slice()).collect();
        let scores = scoring::score_round(&piles);
        for (player, score) in self.players.iter_mut().zip(scores) {
            player.round_scores.push(score);
            player.score += score;
        }
        metrics::counter!("rounds_scored_total").increment(1);
        info!("Room {}: round {} scored", self.id, self.round);

        if self.round >= ROUNDS {
            let counts: Vec<usize> = self.players.iter().map(Player::pudding_count).collect();
            for (player, award) in self
                .players
                .iter_mut()
                .zip(scoring::score_final_puddings(&counts))
            {
                player.score += award;
            }
            self.phase = GamePhase::Finished;
            metrics::counter!("games_finished_total").increment(1);
            info!("Room {}: game finished", self.id);
            return Ok(Advance::GameFinished);
        }

        self.round += 1;
        self.turn = 1;
        for player in &mut self.players {
            player.keep_puddings();
        }
        self.deal_with(rng);
        self.phase = GamePhase::Playing;
        Ok(Advance::RoundEnded {
            next_round: self.round,
        })
    }

    /// Push the drafting cycle forward if everyone has picked.
    pub fn advance(&mut self) -> Result<Advance, GameError> {
        if self.phase == GamePhase::Playing && !self.players.is_empty() && self.all_selected() {
            self.pass_hands()
        } else {
            Ok(Advance::Waiting)
        }
    }

    /// The room as `viewer` may see it: every hand but theirs is reduced to
    /// its size.
    #[must_use]
    pub fn view_for(&self, viewer: &PlayerId) -> GameView {
        let players = self
            .players
            .iter()
            .map(|p| {
                let is_me = p.id == *viewer;
                PlayerView {
                    id: p.id.clone(),
                    name: p.name.clone(),
                    score: p.score,
                    round_scores: p.round_scores.clone(),
                    has_selected: p.has_selected,
                    played_cards: p.played.clone(),
                    hand_size: p.hand.len(),
                    hand: is_me.then(|| p.hand.clone()),
                    is_me,
                }
            })
            .collect();
        GameView {
            id: self.id.clone(),
            state: self.phase,
            round: self.round,
            turn: self.turn,
            host_id: self.host_id.clone(),
            players,
        }
    }

    /// One view per seated player.
    #[must_use]
    pub fn views(&self) -> GameViews {
        self.players
            .iter()
            .map(|p| (p.id.clone(), self.view_for(&p.id)))
            .collect()
    }
}
