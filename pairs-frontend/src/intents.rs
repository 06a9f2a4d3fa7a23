//! User intents supplied by the rendering layer.

use pairs_core::board::SelectOutcome;
use pairs_core::difficulty::Difficulty;
use pairs_core::types::{CardId, SessionId};

/// Something the player asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserIntent {
    /// Start over, on the given difficulty or the preferred default.
    NewGame(Option<Difficulty>),
    /// Click on a card.
    SelectCard(CardId),
    /// Pick a difficulty by id (`"easy"`, `"medium"`, `"hard"`); unknown
    /// ids fall back to easy.
    ChangeDifficulty(String),
    /// Window hidden or pause button.
    Pause,
    /// Back from pause.
    Resume,
}

/// What handling an intent did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentOutcome {
    /// A new game started.
    Started(SessionId),
    /// The selection was applied (or ignored, see the inner outcome).
    Selected(SelectOutcome),
    /// Clock paused.
    Paused,
    /// Clock resumed.
    Resumed,
}
