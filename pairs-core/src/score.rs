//! Score engine.
//!
//! ```text
//! time_bonus      = max(0, (60 − elapsed) × 10)
//! mistake_penalty = mistakes × 50
//! raw_score       = max(0, 1000 + time_bonus − mistake_penalty)
//! final_score     = round(raw_score × multiplier)
//! percentage      = final_score / max_score × 100
//! stars           = 3 if ≥ 90%, 2 if ≥ 70%, else 1
//! ```
//!
//! Everything here is pure and clamps instead of failing.

use serde::{Deserialize, Serialize};

use crate::difficulty::Difficulty;

/// Points every completed game starts from.
pub const BASE_SCORE: u32 = 1000;
/// Seconds within which a speed bonus is earned.
pub const BONUS_WINDOW_SECS: u64 = 60;
/// Bonus points per second under the window.
pub const BONUS_PER_SECOND: u32 = 10;
/// Points deducted per mismatched pair.
pub const PENALTY_PER_MISTAKE: u32 = 50;

/// Full breakdown of a completed game's score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    /// Always [`BASE_SCORE`].
    pub base_score: u32,
    /// Speed bonus.
    pub time_bonus: u32,
    /// Deduction for mistakes (positive number).
    pub mistake_penalty: u32,
    /// Difficulty multiplier applied.
    pub difficulty_multiplier: f64,
    /// Score before the multiplier, floored at zero.
    pub raw_score: u32,
    /// Rounded, multiplied score.
    pub final_score: u32,
    /// `final_score` as a percentage of the level's maximum.
    pub percentage_of_max: f64,
    /// 1–3 stars.
    pub star_rating: u8,
    /// The level's precomputed maximum.
    pub max_score: u32,
}

/// Result of comparing a score to the stored personal best.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalBest {
    /// True when there was no previous best or the score beats it.
    pub is_new_best: bool,
    /// Score minus previous best (the score itself when there was none).
    pub improvement: i64,
    /// Previous best, 0 when absent.
    pub previous_best: u32,
    /// Improvement relative to the previous best, 0 when absent.
    pub improvement_percentage: f64,
}

/// Qualitative label for a percentage-of-max.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PerformanceLevel {
    /// ≥ 90%.
    Excellent,
    /// ≥ 70%.
    Good,
    /// ≥ 50%.
    Average,
    /// Below 50%.
    NeedsImprovement,
}

impl PerformanceLevel {
    /// Display label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Average => "Average",
            Self::NeedsImprovement => "Needs Improvement",
        }
    }
}

/// Stateless scoring service.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreEngine;

impl ScoreEngine {
    /// Compute the full breakdown for a finished game.
    #[must_use]
    pub fn calculate(elapsed_secs: u64, mistakes: u32, difficulty: Difficulty) -> ScoreBreakdown {
        let remaining = BONUS_WINDOW_SECS.saturating_sub(elapsed_secs);
        let time_bonus = u32::try_from(remaining).unwrap_or(u32::MAX).saturating_mul(BONUS_PER_SECOND);
        let mistake_penalty = mistakes.saturating_mul(PENALTY_PER_MISTAKE);
        let raw_score = BASE_SCORE
            .saturating_add(time_bonus)
            .saturating_sub(mistake_penalty);

        let multiplier = Self::multiplier(difficulty);
        let final_score = (f64::from(raw_score) * multiplier).round().max(0.0) as u32;
        let max_score = Self::max_score(difficulty);

        ScoreBreakdown {
            base_score: BASE_SCORE,
            time_bonus,
            mistake_penalty,
            difficulty_multiplier: multiplier,
            raw_score,
            final_score,
            percentage_of_max: percentage(final_score, max_score),
            star_rating: Self::star_rating(final_score, max_score),
            max_score,
        }
    }

    /// Stars for a score against a maximum. Never below 1.
    #[must_use]
    pub fn star_rating(score: u32, max_score: u32) -> u8 {
        let pct = percentage(score, max_score);
        if pct >= 90.0 {
            3
        } else if pct >= 70.0 {
            2
        } else {
            1
        }
    }

    /// Precomputed maximum score for a difficulty.
    #[must_use]
    pub fn max_score(difficulty: Difficulty) -> u32 {
        difficulty.level().max_score
    }

    /// Score multiplier for a difficulty.
    #[must_use]
    pub fn multiplier(difficulty: Difficulty) -> f64 {
        difficulty.level().score_multiplier
    }

    /// Compare `score` to an optional previous best.
    #[must_use]
    pub fn compare_to_personal_best(score: u32, previous_best: Option<u32>) -> PersonalBest {
        match previous_best.filter(|&best| best > 0) {
            Some(best) => {
                let improvement = i64::from(score) - i64::from(best);
                PersonalBest {
                    is_new_best: score > best,
                    improvement,
                    previous_best: best,
                    improvement_percentage: improvement as f64 / f64::from(best) * 100.0,
                }
            }
            None => PersonalBest {
                is_new_best: true,
                improvement: i64::from(score),
                previous_best: 0,
                improvement_percentage: 0.0,
            },
        }
    }

    /// Label a percentage-of-max.
    #[must_use]
    pub fn performance_level(percentage_of_max: f64) -> PerformanceLevel {
        if percentage_of_max >= 90.0 {
            PerformanceLevel::Excellent
        } else if percentage_of_max >= 70.0 {
            PerformanceLevel::Good
        } else if percentage_of_max >= 50.0 {
            PerformanceLevel::Average
        } else {
            PerformanceLevel::NeedsImprovement
        }
    }
}

fn percentage(score: u32, max_score: u32) -> f64 {
    if max_score == 0 {
        return 0.0;
    }
    f64::from(score) / f64::from(max_score) * 100.0
}
