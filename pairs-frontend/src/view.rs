//! Render-ready snapshots of a session.
//!
//! Views are plain data: the renderer draws them and sends back
//! [`UserIntent`](crate::intents::UserIntent)s, it never touches the session.

use serde::Serialize;

use pairs_core::board::Phase;
use pairs_core::difficulty::Difficulty;
use pairs_core::session::{GameSession, GameSummary};
use pairs_core::time_format::format_time;
use pairs_core::types::CardId;

/// One card as the renderer sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardView {
    /// Identity to send back in `SelectCard`.
    pub id: CardId,
    /// Image source for the face.
    pub face_src: &'static str,
    /// Face-up: matched or currently chosen.
    pub revealed: bool,
    /// Pair found.
    pub matched: bool,
}

/// Whole board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardView {
    /// Difficulty.
    pub difficulty: Difficulty,
    /// Grid rows.
    pub rows: u8,
    /// Grid columns.
    pub cols: u8,
    /// Cards in board order.
    pub cards: Vec<CardView>,
    /// Ignore clicks while set.
    pub input_locked: bool,
    /// Resolved turns.
    pub turns: u32,
    /// Mismatches.
    pub mistakes: u32,
    /// `MM:SS`.
    pub formatted_time: String,
    /// Whether to draw the clock.
    pub show_timer: bool,
    /// Current phase.
    pub phase: Phase,
}

impl BoardView {
    /// Capture the current state of `session`.
    #[must_use]
    pub fn capture(session: &GameSession, show_timer: bool) -> Self {
        let formatted_time = session.formatted_time();
        session.with_board(|board, difficulty| {
            let level = difficulty.level();
            let cards = board
                .cards()
                .iter()
                .map(|card| CardView {
                    id: card.id,
                    face_src: card.face.src().unwrap_or_default(),
                    revealed: board.is_revealed(card.id),
                    matched: card.matched,
                })
                .collect();

            Self {
                difficulty,
                rows: level.rows,
                cols: level.cols,
                cards,
                input_locked: board.is_locked(),
                turns: board.turns(),
                mistakes: board.mistakes(),
                formatted_time,
                show_timer,
                phase: board.phase(),
            }
        })
    }
}

/// A labelled component of the score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreLine {
    /// Label.
    pub label: &'static str,
    /// Signed, formatted value.
    pub value: String,
}

/// Results screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryView {
    /// Difficulty played.
    pub difficulty: Difficulty,
    /// Final score.
    pub final_score: u32,
    /// Level maximum.
    pub max_score: u32,
    /// Percentage of the maximum, one decimal.
    pub percentage: String,
    /// 1–3.
    pub stars: u8,
    /// Qualitative label.
    pub performance: &'static str,
    /// Beat the previous best.
    pub is_new_best: bool,
    /// Previous best, 0 when none.
    pub previous_best: u32,
    /// Score components in display order.
    pub breakdown: Vec<ScoreLine>,
    /// `MM:SS`.
    pub time: String,
    /// Resolved turns.
    pub turns: u32,
    /// Mismatches.
    pub mistakes: u32,
}

impl From<&GameSummary> for SummaryView {
    fn from(summary: &GameSummary) -> Self {
        let score = &summary.score;
        Self {
            difficulty: summary.difficulty,
            final_score: score.final_score,
            max_score: score.max_score,
            percentage: format!("{:.1}%", score.percentage_of_max),
            stars: score.star_rating,
            performance: summary.performance_level.label(),
            is_new_best: summary.personal_best.is_new_best,
            previous_best: summary.personal_best.previous_best,
            breakdown: vec![
                ScoreLine {
                    label: "Base points",
                    value: format!("+{}", score.base_score),
                },
                ScoreLine {
                    label: "Speed bonus",
                    value: format!("+{}", score.time_bonus),
                },
                ScoreLine {
                    label: "Mistake penalty",
                    value: format!("-{}", score.mistake_penalty),
                },
                ScoreLine {
                    label: "Difficulty multiplier",
                    value: format!("×{}", score.difficulty_multiplier),
                },
            ],
            time: format_time(summary.elapsed_secs),
            turns: summary.turns,
            mistakes: summary.mistakes,
        }
    }
}
