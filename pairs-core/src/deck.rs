//! Deck construction.
//!
//! A deck for a level takes the first `total_pairs` faces of
//! [`MASTER_FACES`](crate::types::MASTER_FACES), doubles them, and applies
//! an unbiased Fisher–Yates shuffle. Every card gets a fresh [`CardId`].

use std::collections::{HashMap, HashSet};

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::difficulty::DifficultyLevel;
use crate::types::{CardId, FaceId, MASTER_FACES};

/// One card on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    /// Unique instance identity.
    pub id: CardId,
    /// Face shared with exactly one other card in the deck.
    pub face: FaceId,
    /// Set once the pair is found; never reverts.
    pub matched: bool,
}

impl Card {
    fn new(face: FaceId) -> Self {
        Self {
            id: CardId::new(),
            face,
            matched: false,
        }
    }
}

/// Ordered sequence of cards; each face appears exactly twice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// Wrap an existing card list (used when restoring a saved game).
    #[must_use]
    pub fn from_cards(cards: Vec<Card>) -> Self {
        Self { cards }
    }

    /// Cards in board order.
    #[must_use]
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Number of cards.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Whether the deck has no cards.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Board position of a card.
    #[must_use]
    pub fn position(&self, id: CardId) -> Option<usize> {
        self.cards.iter().position(|c| c.id == id)
    }

    /// Look up a card by identity.
    #[must_use]
    pub fn get(&self, id: CardId) -> Option<&Card> {
        self.cards.iter().find(|c| c.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: CardId) -> Option<&mut Card> {
        self.cards.iter_mut().find(|c| c.id == id)
    }

    /// True when the deck is non-empty and every card is matched.
    #[must_use]
    pub fn all_matched(&self) -> bool {
        !self.cards.is_empty() && self.cards.iter().all(|c| c.matched)
    }

    /// Whether this could be a deck for `level`: the right card count,
    /// faces `0..total_pairs` each exactly twice, unique ids, and both cards
    /// of a face matched or neither.
    #[must_use]
    pub fn is_well_formed(&self, level: &DifficultyLevel) -> bool {
        let pairs = usize::from(level.total_pairs).min(MASTER_FACES.len());
        if self.cards.len() != pairs * 2 {
            return false;
        }

        let mut ids = HashSet::with_capacity(self.cards.len());
        // face -> (copies, matched copies)
        let mut faces: HashMap<FaceId, (usize, usize)> = HashMap::with_capacity(pairs);
        for card in &self.cards {
            if usize::from(card.face.0) >= pairs || !ids.insert(card.id) {
                return false;
            }
            let entry = faces.entry(card.face).or_default();
            entry.0 += 1;
            entry.1 += usize::from(card.matched);
        }
        faces.len() == pairs
            && faces
                .values()
                .all(|&(copies, matched)| copies == 2 && matched != 1)
    }

    /// Number of pairs found so far.
    #[must_use]
    pub fn matched_pairs(&self) -> usize {
        self.cards.iter().filter(|c| c.matched).count() / 2
    }
}

/// Build a freshly shuffled deck for `level`.
///
/// Face selection is deterministic truncation of the master list; only the
/// order is random.
pub fn build_deck<R: Rng + ?Sized>(level: &DifficultyLevel, rng: &mut R) -> Deck {
    let pairs = usize::from(level.total_pairs).min(MASTER_FACES.len());
    let mut cards: Vec<Card> = (0..pairs)
        .chain(0..pairs)
        .map(|i| Card::new(FaceId(i as u16)))
        .collect();
    cards.shuffle(rng);
    Deck { cards }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::difficulty::{Difficulty, all_levels};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn every_face_appears_twice() {
        let mut rng = StdRng::seed_from_u64(7);
        for level in all_levels() {
            let deck = build_deck(level, &mut rng);
            assert_eq!(deck.len(), level.total_cards());

            let mut counts: HashMap<FaceId, usize> = HashMap::new();
            for card in deck.cards() {
                *counts.entry(card.face).or_default() += 1;
            }
            assert_eq!(counts.len(), usize::from(level.total_pairs));
            assert!(counts.values().all(|&n| n == 2));
        }
    }

    #[test]
    fn faces_are_a_prefix_of_the_master_list() {
        let mut rng = StdRng::seed_from_u64(1);
        let deck = build_deck(Difficulty::Medium.level(), &mut rng);
        let faces: HashSet<u16> = deck.cards().iter().map(|c| c.face.0).collect();
        assert_eq!(faces, (0..8).collect());
    }

    #[test]
    fn ids_are_fresh_per_shuffle() {
        let mut rng = StdRng::seed_from_u64(3);
        let a = build_deck(Difficulty::Easy.level(), &mut rng);
        let b = build_deck(Difficulty::Easy.level(), &mut rng);

        let ids_a: HashSet<CardId> = a.cards().iter().map(|c| c.id).collect();
        assert_eq!(ids_a.len(), a.len(), "ids unique within a deck");
        assert!(b.cards().iter().all(|c| !ids_a.contains(&c.id)));
    }

    #[test]
    fn new_deck_is_unmatched() {
        let mut rng = StdRng::seed_from_u64(9);
        let deck = build_deck(Difficulty::Hard.level(), &mut rng);
        assert!(!deck.all_matched());
        assert_eq!(deck.matched_pairs(), 0);
        assert!(!Deck::default().all_matched());
    }

    #[test]
    fn built_decks_are_well_formed() {
        let mut rng = StdRng::seed_from_u64(5);
        for level in all_levels() {
            assert!(build_deck(level, &mut rng).is_well_formed(level), "{}", level.name);
        }
    }

    fn tampered(deck: &Deck, level: &DifficultyLevel, edit: impl FnOnce(&mut Vec<Card>)) -> bool {
        let mut cards = deck.cards().to_vec();
        edit(&mut cards);
        Deck::from_cards(cards).is_well_formed(level)
    }

    #[test]
    fn malformed_decks_are_rejected() {
        let level = Difficulty::Easy.level();
        let deck = build_deck(level, &mut StdRng::seed_from_u64(21));

        // three of one face, one of another
        assert!(!tampered(&deck, level, |cards| {
            let i = cards.iter().position(|c| c.face == FaceId(1)).expect("face 1");
            cards[i].face = FaceId(0);
        }));
        // face outside the level
        assert!(!tampered(&deck, level, |cards| {
            for card in cards.iter_mut().filter(|c| c.face == FaceId(5)) {
                card.face = FaceId(6);
            }
        }));
        assert!(!tampered(&deck, level, |cards| cards[1].id = cards[0].id));
        // half a pair matched
        assert!(!tampered(&deck, level, |cards| cards[0].matched = true));
        assert!(!tampered(&deck, level, |cards| cards.truncate(10)));
        assert!(!Deck::default().is_well_formed(level));
        assert!(!deck.is_well_formed(Difficulty::Medium.level()));

        assert!(tampered(&deck, level, |cards| {
            for card in cards.iter_mut().filter(|c| c.face == FaceId(2)) {
                card.matched = true;
            }
        }));
    }

    /// Each position holds a given face with probability 2/12 on easy.
    #[test]
    fn shuffle_is_uniform_per_position() {
        const TRIALS: usize = 12_000;
        let level = Difficulty::Easy.level();
        let pairs = usize::from(level.total_pairs);
        let mut rng = StdRng::seed_from_u64(0xC0FFEE);
        let mut counts = vec![vec![0usize; pairs]; level.total_cards()];

        for _ in 0..TRIALS {
            let deck = build_deck(level, &mut rng);
            for (pos, card) in deck.cards().iter().enumerate() {
                counts[pos][usize::from(card.face.0)] += 1;
            }
        }

        let expected = TRIALS / pairs;
        let tolerance = expected * 15 / 100;
        for (pos, row) in counts.iter().enumerate() {
            for (face, &n) in row.iter().enumerate() {
                assert!(
                    n.abs_diff(expected) < tolerance,
                    "position {pos} face {face}: {n} vs expected {expected}"
                );
            }
        }
    }
}
