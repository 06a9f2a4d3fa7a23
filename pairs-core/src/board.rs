//! Turn sequencing and match resolution.
//!
//! The board is the timer-free heart of a session:
//!
//! ```text
//!  Idle ──start──▶ Playing ──2nd pick──▶ Resolving ──settle──▶ Playing
//!                                             │
//!                                             └──settle, all matched──▶ Complete
//! ```
//!
//! Matching (or the mistake count) is applied the moment the second card is
//! picked; `settle` clears the selection, counts the turn and releases the
//! input lock. Card identity is compared by [`CardId`] value.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::deck::{Card, Deck};
use crate::types::CardId;

/// Lifecycle phase of a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Phase {
    /// No game started.
    #[default]
    Idle,
    /// Accepting selections.
    Playing,
    /// Two cards chosen; input locked until `settle`.
    Resolving,
    /// Every pair found. Terminal.
    Complete,
}

/// Why a selection was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Board is idle or complete.
    NotPlaying,
    /// A pair is being resolved.
    Locked,
    /// No card with this id in the deck.
    UnknownCard,
    /// The card is already matched.
    AlreadyMatched,
    /// The card is already the current first choice.
    AlreadyChosen,
}

/// Result of [`Board::select`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    /// Nothing changed.
    Ignored(IgnoreReason),
    /// The card became the first choice.
    FirstPick(CardId),
    /// The card completed a pair; the board is now resolving.
    PairPicked {
        /// First card of the pair.
        first: CardId,
        /// Second card of the pair.
        second: CardId,
        /// Whether the faces matched.
        matched: bool,
    },
}

/// Result of [`Board::settle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleOutcome {
    /// Back to `Playing`.
    Continue,
    /// The final pair was found; the board is `Complete`.
    Completed,
}

/// Deck plus selection and counters.
#[derive(Debug, Clone, Default)]
pub struct Board {
    deck: Deck,
    phase: Phase,
    choice_one: Option<CardId>,
    choice_two: Option<CardId>,
    turns: u32,
    mistakes: u32,
    completed: bool,
}

impl Board {
    /// An idle board with no cards.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset onto a fresh deck and start playing.
    pub fn start(&mut self, deck: Deck) {
        *self = Self {
            deck,
            phase: Phase::Playing,
            ..Self::default()
        };
    }

    /// Rebuild a board mid-game from saved parts. Selection is always empty.
    #[must_use]
    pub fn restore(deck: Deck, turns: u32, mistakes: u32) -> Self {
        let mut board = Self {
            deck,
            phase: Phase::Playing,
            turns,
            mistakes,
            ..Self::default()
        };
        if board.deck.all_matched() {
            board.check_completion();
        }
        board
    }

    /// Choose a card.
    ///
    /// Ineligible picks are ignored, never reported as errors.
    pub fn select(&mut self, id: CardId) -> SelectOutcome {
        let outcome = self.try_select(id);
        if let SelectOutcome::Ignored(reason) = outcome {
            trace!(card = %id, ?reason, phase = ?self.phase, "Selection ignored");
        }
        outcome
    }

    fn try_select(&mut self, id: CardId) -> SelectOutcome {
        match self.phase {
            Phase::Idle | Phase::Complete => return SelectOutcome::Ignored(IgnoreReason::NotPlaying),
            Phase::Resolving => return SelectOutcome::Ignored(IgnoreReason::Locked),
            Phase::Playing => {}
        }

        let Some(card) = self.deck.get(id) else {
            return SelectOutcome::Ignored(IgnoreReason::UnknownCard);
        };
        if card.matched {
            return SelectOutcome::Ignored(IgnoreReason::AlreadyMatched);
        }

        let Some(first) = self.choice_one else {
            self.choice_one = Some(id);
            return SelectOutcome::FirstPick(id);
        };
        if first == id {
            return SelectOutcome::Ignored(IgnoreReason::AlreadyChosen);
        }

        self.choice_two = Some(id);
        self.phase = Phase::Resolving;

        let second_face = card.face;
        let matched = self.deck.get(first).is_some_and(|c| c.face == second_face);
        if matched {
            for pick in [first, id] {
                if let Some(card) = self.deck.get_mut(pick) {
                    card.matched = true;
                }
            }
        } else {
            self.mistakes += 1;
        }

        SelectOutcome::PairPicked {
            first,
            second: id,
            matched,
        }
    }

    /// Finish a pending resolution. Returns `None` if nothing was resolving.
    pub fn settle(&mut self) -> Option<SettleOutcome> {
        if self.phase != Phase::Resolving {
            return None;
        }
        self.choice_one = None;
        self.choice_two = None;
        self.turns += 1;
        self.phase = Phase::Playing;

        if self.check_completion() {
            Some(SettleOutcome::Completed)
        } else {
            Some(SettleOutcome::Continue)
        }
    }

    /// Transition to `Complete` if every card is matched.
    ///
    /// Returns `true` only on the call that performs the transition, so a
    /// session finishes exactly once however often this runs.
    pub fn check_completion(&mut self) -> bool {
        if self.completed || self.phase == Phase::Resolving || !self.deck.all_matched() {
            return false;
        }
        self.completed = true;
        self.phase = Phase::Complete;
        true
    }

    /// Whether the card is face-up: matched or currently chosen.
    #[must_use]
    pub fn is_revealed(&self, id: CardId) -> bool {
        self.choice_one == Some(id)
            || self.choice_two == Some(id)
            || self.deck.get(id).is_some_and(|c| c.matched)
    }

    /// Whether input is blocked by a pending resolution.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.phase == Phase::Resolving
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Resolved turns so far.
    #[must_use]
    pub fn turns(&self) -> u32 {
        self.turns
    }

    /// Mismatches so far.
    #[must_use]
    pub fn mistakes(&self) -> u32 {
        self.mistakes
    }

    /// Current choices.
    #[must_use]
    pub fn choices(&self) -> (Option<CardId>, Option<CardId>) {
        (self.choice_one, self.choice_two)
    }

    /// The deck.
    #[must_use]
    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    /// Cards in board order.
    #[must_use]
    pub fn cards(&self) -> &[Card] {
        self.deck.cards()
    }
}
