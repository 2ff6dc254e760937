//! Round and final scoring.
//!
//! Everything here is a pure function over card slices. Results are
//! index-aligned with the input and do not depend on the order of cards
//! within a player's pile.

use super::{
    constants::{
        BIRYANI_POINTS, CHAI_FIRST_PRIZE, CHAI_SECOND_PRIZE, PANEER_TRIPLE_POINTS,
        PUDDING_PENALTY_MIN_PLAYERS, PUDDING_POINTS, SAMOSA_PAIR_POINTS,
    },
    entities::{Card, CardKind},
};

fn count(cards: &[Card], kind: CardKind) -> usize {
    cards.iter().filter(|card| card.kind == kind).count()
}

#[must_use]
pub fn samosa_points(cards: &[Card]) -> i32 {
    (count(cards, CardKind::Samosa) / 2) as i32 * SAMOSA_PAIR_POINTS
}

#[must_use]
pub fn biryani_points(cards: &[Card]) -> i32 {
    let n = count(cards, CardKind::Biryani).min(BIRYANI_POINTS.len() - 1);
    BIRYANI_POINTS[n]
}

#[must_use]
pub fn paneer_points(cards: &[Card]) -> i32 {
    (count(cards, CardKind::PaneerTikka) / 3) as i32 * PANEER_TRIPLE_POINTS
}

/// Total chai icons in a pile.
#[must_use]
pub fn chai_icons(cards: &[Card]) -> u32 {
    cards
        .iter()
        .filter(|card| card.kind == CardKind::Chai)
        .map(|card| u32::from(card.value))
        .sum()
}

/// Split the chai prizes across players given their icon totals.
///
/// The highest total splits the first prize. The highest total strictly
/// below it splits the second prize. A total of zero never places.
#[must_use]
pub fn chai_awards(totals: &[u32]) -> Vec<i32> {
    let mut awards = vec![0; totals.len()];
    let Some(first) = totals.iter().copied().filter(|&t| t > 0).max() else {
        return awards;
    };
    let second = totals
        .iter()
        .copied()
        .filter(|&t| t > 0 && t < first)
        .max();

    let mut split = |target: u32, prize: i32| {
        let winners = totals.iter().filter(|&&t| t == target).count() as i32;
        for (award, &total) in awards.iter_mut().zip(totals) {
            if total == target {
                *award += prize / winners;
            }
        }
    };
    split(first, CHAI_FIRST_PRIZE);
    if let Some(second) = second {
        split(second, CHAI_SECOND_PRIZE);
    }
    awards
}

/// Score one round for every player. Gulab jamun is ignored here; it only
/// counts at the end of the game. Dosa and raita score nothing.
#[must_use]
pub fn score_round<C: AsRef<[Card]>>(piles: &[C]) -> Vec<i32> {
    let totals: Vec<u32> = piles.iter().map(|pile| chai_icons(pile.as_ref())).collect();
    piles
        .iter()
        .zip(chai_awards(&totals))
        .map(|(pile, chai)| {
            let cards = pile.as_ref();
            samosa_points(cards) + biryani_points(cards) + paneer_points(cards) + chai
        })
        .collect()
}

/// End-of-game pudding bonus and penalty from each player's gulab jamun count.
///
/// Everyone tied for the most gains the bonus. With enough players, everyone
/// tied for the fewest loses it, unless all counts are equal.
#[must_use]
pub fn score_final_puddings(counts: &[usize]) -> Vec<i32> {
    let mut awards = vec![0; counts.len()];
    let (Some(&max), Some(&min)) = (counts.iter().max(), counts.iter().min()) else {
        return awards;
    };
    let penalize = counts.len() >= PUDDING_PENALTY_MIN_PLAYERS && min < max;
    for (award, &n) in awards.iter_mut().zip(counts) {
        if n == max {
            *award += PUDDING_POINTS;
        }
        if penalize && n == min {
            *award -= PUDDING_POINTS;
        }
    }
    awards
}
