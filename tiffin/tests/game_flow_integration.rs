/// Integration tests for game flow scenarios
///
/// These tests drive whole games through the state machine: start, the
/// select/pass cycle, round transitions with pudding carry-over, and final
/// scoring.
use tiffin::{
    Advance, CardKind, Game, GameError, GamePhase, PlayerId, RoomId,
    constants::{self, ROUNDS},
    scoring,
};

fn two_player_game() -> (Game, PlayerId, PlayerId) {
    let host = PlayerId::from("host01");
    let guest = PlayerId::from("guest1");
    let mut game = Game::new(RoomId::from("room01"), host.clone(), "Asha");
    game.add_player(guest.clone(), "Ravi").unwrap();
    (game, host, guest)
}

/// Index of a gulab jamun in the hand if there is one, else 0.
fn pudding_or_first(game: &Game, player: &PlayerId) -> usize {
    game.player(player)
        .unwrap()
        .hand
        .iter()
        .position(|c| c.kind == CardKind::GulabJamun)
        .unwrap_or(0)
}

#[test]
fn test_two_player_round_with_pudding_carry_over() {
    let (mut game, host, guest) = two_player_game();
    game.start().unwrap();
    assert_eq!(game.phase(), GamePhase::Playing);

    let mut puddings = [0usize; 2];
    let mut passes = 0;
    loop {
        for (seat, id) in [&host, &guest].into_iter().enumerate() {
            let idx = pudding_or_first(&game, id);
            let card = game.select_card(id, idx).unwrap();
            if card.kind == CardKind::GulabJamun {
                puddings[seat] += 1;
            }
        }
        passes += 1;
        match game.advance().unwrap() {
            Advance::HandsPassed { turn } => assert_eq!(turn, passes + 1),
            Advance::RoundEnded { next_round } => {
                assert_eq!(next_round, 2);
                break;
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    // Ten cards each, the last one is never played.
    assert_eq!(passes, constants::cards_per_hand(2) as u32 - 1);
    assert_eq!(game.round(), 2);
    assert_eq!(game.turn(), 1);
    for (seat, id) in [&host, &guest].into_iter().enumerate() {
        let player = game.player(id).unwrap();
        assert_eq!(player.round_scores.len(), 1);
        assert_eq!(player.score, player.round_scores[0]);
        assert_eq!(player.played.len(), puddings[seat]);
        assert!(player.played.iter().all(|c| c.kind == CardKind::GulabJamun));
        assert_eq!(player.hand.len(), constants::cards_per_hand(2));
        assert!(!player.has_selected);
    }
}

#[test]
fn test_two_player_game_to_finish() {
    let (mut game, host, guest) = two_player_game();
    game.start().unwrap();

    let mut outcome = Advance::Waiting;
    while game.phase() != GamePhase::Finished {
        game.select_card(&host, 0).unwrap();
        assert_eq!(game.advance().unwrap(), Advance::Waiting);
        game.select_card(&guest, 0).unwrap();
        outcome = game.advance().unwrap();
    }

    assert_eq!(outcome, Advance::GameFinished);
    assert_eq!(game.round(), ROUNDS);

    let counts: Vec<usize> = game.players().iter().map(|p| p.pudding_count()).collect();
    let awards = scoring::score_final_puddings(&counts);
    for (player, award) in game.players().iter().zip(awards) {
        assert_eq!(player.round_scores.len(), ROUNDS as usize);
        let rounds: i32 = player.round_scores.iter().sum();
        assert_eq!(player.score, rounds + award);
    }

    // Terminal: nothing moves any more.
    assert_eq!(game.select_card(&host, 0), Err(GameError::NotPlaying));
    assert_eq!(game.advance().unwrap(), Advance::Waiting);
    assert_eq!(game.phase(), GamePhase::Finished);
}

#[test]
fn test_five_player_rotation_conserves_cards() {
    let mut game = Game::new(RoomId::from("room05"), PlayerId::from("p0"), "P0");
    for i in 1..5 {
        game.add_player(PlayerId::from(format!("p{i}")), &format!("P{i}"))
            .unwrap();
    }
    assert!(game.is_full());
    game.start().unwrap();

    let order = game.seating_order();
    for _ in 0..3 {
        let before: Vec<_> = game.players().iter().map(|p| p.hand.clone()).collect();
        for id in &order {
            game.select_card(id, 0).unwrap();
        }
        game.pass_hands().unwrap();
        for seat in 0..order.len() {
            let from = (seat + order.len() - 1) % order.len();
            assert_eq!(game.players()[seat].hand, before[from][1..].to_vec());
        }
        let held: usize = game
            .players()
            .iter()
            .map(|p| p.hand.len() + p.played.len())
            .sum();
        assert_eq!(held + game.undealt().len(), constants::DECK_SIZE);
    }
}

#[test]
fn test_player_leaving_mid_round_unblocks_pass() {
    let mut game = Game::new(RoomId::from("room03"), PlayerId::from("a"), "A");
    game.add_player(PlayerId::from("b"), "B").unwrap();
    game.add_player(PlayerId::from("c"), "C").unwrap();
    game.start().unwrap();

    game.select_card(&PlayerId::from("a"), 0).unwrap();
    game.select_card(&PlayerId::from("b"), 0).unwrap();
    assert_eq!(game.advance().unwrap(), Advance::Waiting);

    game.remove_player(&PlayerId::from("c"));
    assert_eq!(game.advance().unwrap(), Advance::HandsPassed { turn: 2 });
    assert_eq!(game.player_count(), 2);
}
