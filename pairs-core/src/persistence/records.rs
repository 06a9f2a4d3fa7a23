//! Persisted record types. All serialise as camelCase JSON.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::deck::Card;
use crate::difficulty::Difficulty;
use crate::types::SessionId;

/// One completed game, appended to history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    /// Session identity.
    pub id: SessionId,
    /// Difficulty played.
    pub difficulty: Difficulty,
    /// When the session started.
    pub start_time: DateTime<Utc>,
    /// When the last pair was resolved.
    pub end_time: DateTime<Utc>,
    /// Elapsed seconds as measured by the timer.
    pub time_elapsed: u64,
    /// Final score.
    pub score: u32,
    /// Mismatched pairs.
    pub mistakes: u32,
    /// Resolved turns.
    #[serde(default)]
    pub turns: u32,
    /// 1–3 stars.
    pub stars: u8,
    /// The level's maximum score.
    pub max_possible_score: u32,
    /// Always true for history entries.
    pub completed: bool,
    /// Pairs on the board.
    pub card_pairs: u8,
}

/// Best result recorded for a difficulty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BestRecord {
    /// Score.
    pub score: u32,
    /// Elapsed seconds of that game.
    pub time_elapsed: u64,
    /// Stars of that game.
    pub stars: u8,
    /// When it was achieved.
    pub date: DateTime<Utc>,
}

/// Aggregate statistics over all completed games.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PerformanceMetrics {
    /// Completed games.
    pub total_games_played: u32,
    /// Sum of elapsed seconds.
    pub total_time_played: u64,
    /// Mean score over the retained history.
    pub average_score: f64,
    /// Best score per difficulty.
    pub best_score_by_difficulty: BTreeMap<Difficulty, BestRecord>,
    /// Fastest completion per difficulty, in seconds.
    pub fastest_time_by_difficulty: BTreeMap<Difficulty, u64>,
    /// Sum of stars.
    pub total_stars_earned: u32,
    /// Three-star games.
    pub perfect_games: u32,
}

impl PerformanceMetrics {
    /// Fold a completed session into the aggregates.
    ///
    /// `history` is the retained log including `session`; the average is
    /// taken over it.
    pub fn record(&mut self, session: &SessionRecord, history: &[SessionRecord]) {
        self.total_games_played += 1;
        self.total_time_played += session.time_elapsed;
        self.total_stars_earned += u32::from(session.stars);

        let beats_best = self
            .best_score_by_difficulty
            .get(&session.difficulty)
            .is_none_or(|best| session.score > best.score);
        if beats_best {
            self.best_score_by_difficulty.insert(
                session.difficulty,
                BestRecord {
                    score: session.score,
                    time_elapsed: session.time_elapsed,
                    stars: session.stars,
                    date: session.end_time,
                },
            );
        }

        let faster = self
            .fastest_time_by_difficulty
            .get(&session.difficulty)
            .is_none_or(|&fastest| session.time_elapsed < fastest);
        if faster {
            self.fastest_time_by_difficulty
                .insert(session.difficulty, session.time_elapsed);
        }

        if session.stars == 3 {
            self.perfect_games += 1;
        }

        if !history.is_empty() {
            let total: u64 = history.iter().map(|g| u64::from(g.score)).sum();
            self.average_score = total as f64 / history.len() as f64;
        }
    }

    /// Best score for a difficulty, if any game was completed on it.
    #[must_use]
    pub fn best_score(&self, difficulty: Difficulty) -> Option<u32> {
        self.best_score_by_difficulty
            .get(&difficulty)
            .map(|b| b.score)
    }
}

/// How fast card flips animate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimationSpeed {
    /// Slow flips.
    Slow,
    /// Default speed.
    #[default]
    Normal,
    /// Fast flips.
    Fast,
}

/// User preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    /// Difficulty used when a new game names none.
    #[serde(default = "default_difficulty")]
    pub default_difficulty: Difficulty,
    /// Play sounds.
    #[serde(default = "default_true")]
    pub sound_enabled: bool,
    /// Show the elapsed-time display.
    #[serde(default = "default_true")]
    pub show_timer: bool,
    /// Card flip animation speed.
    #[serde(default)]
    pub animation_speed: AnimationSpeed,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            default_difficulty: Difficulty::Medium,
            sound_enabled: true,
            show_timer: true,
            animation_speed: AnimationSpeed::Normal,
        }
    }
}

fn default_difficulty() -> Difficulty {
    Difficulty::Medium
}

fn default_true() -> bool {
    true
}

/// Resumable in-progress game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    /// Session identity.
    pub session_id: SessionId,
    /// Difficulty.
    pub difficulty: Difficulty,
    /// Cards in board order, with match state.
    pub cards: Vec<Card>,
    /// Resolved turns.
    pub turns: u32,
    /// Mismatches.
    pub mistakes: u32,
    /// Elapsed seconds at save time.
    pub elapsed_secs: u64,
    /// When the session started.
    pub started_at: DateTime<Utc>,
    /// When the snapshot was taken.
    pub saved_at: DateTime<Utc>,
}

/// Everything stored, bundled for export and import.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataExport {
    /// Completed sessions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<SessionRecord>>,
    /// Resumable game.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_game: Option<GameSnapshot>,
    /// Aggregates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<PerformanceMetrics>,
    /// Preferences.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<Preferences>,
}
