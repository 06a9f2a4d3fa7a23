//! Static difficulty table.
//!
//! | level  | grid | pairs | multiplier | max score |
//! |--------|------|-------|------------|-----------|
//! | easy   | 3×4  | 6     | ×1.0       | 1600      |
//! | medium | 4×4  | 8     | ×1.5       | 2400      |
//! | hard   | 6×6  | 18    | ×2.0       | 3200      |
//!
//! Lookups never fail: an unknown id resolves to `easy`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Difficulty identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Small board, no multiplier.
    #[default]
    Easy,
    /// Medium board, ×1.5.
    Medium,
    /// Large board, ×2.
    Hard,
}

impl Difficulty {
    /// All difficulties in selection order.
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// Stable lowercase id.
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }

    /// Lenient parse: unknown ids fall back to [`Difficulty::Easy`].
    #[must_use]
    pub fn from_id(id: &str) -> Self {
        id.parse().unwrap_or_default()
    }

    /// The static table entry for this difficulty.
    #[must_use]
    pub fn level(self) -> &'static DifficultyLevel {
        match self {
            Self::Easy => &LEVELS[0],
            Self::Medium => &LEVELS[1],
            Self::Hard => &LEVELS[2],
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Error returned by strict [`Difficulty`] parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown difficulty: {0}")]
pub struct UnknownDifficulty(pub String);

impl FromStr for Difficulty {
    type Err = UnknownDifficulty;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            other => Err(UnknownDifficulty(other.to_string())),
        }
    }
}

/// Immutable parameters of one difficulty level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DifficultyLevel {
    /// Level identifier.
    pub id: Difficulty,
    /// Display name.
    pub name: &'static str,
    /// One-line description for selection UI.
    pub description: &'static str,
    /// Grid rows.
    pub rows: u8,
    /// Grid columns.
    pub cols: u8,
    /// Number of distinct faces; the deck holds twice as many cards.
    pub total_pairs: u8,
    /// Score multiplier applied to the raw score.
    pub score_multiplier: f64,
    /// Precomputed ceiling: zero mistakes at zero elapsed seconds.
    pub max_score: u32,
}

impl DifficultyLevel {
    /// Number of cards in a deck for this level.
    #[must_use]
    pub fn total_cards(&self) -> usize {
        usize::from(self.total_pairs) * 2
    }
}

static LEVELS: [DifficultyLevel; 3] = [
    DifficultyLevel {
        id: Difficulty::Easy,
        name: "Easy",
        description: "3×4 grid with 6 pairs",
        rows: 3,
        cols: 4,
        total_pairs: 6,
        score_multiplier: 1.0,
        max_score: 1600,
    },
    DifficultyLevel {
        id: Difficulty::Medium,
        name: "Medium",
        description: "4×4 grid with 8 pairs",
        rows: 4,
        cols: 4,
        total_pairs: 8,
        score_multiplier: 1.5,
        max_score: 2400,
    },
    DifficultyLevel {
        id: Difficulty::Hard,
        name: "Hard",
        description: "6×6 grid with 18 pairs",
        rows: 6,
        cols: 6,
        total_pairs: 18,
        score_multiplier: 2.0,
        max_score: 3200,
    },
];

/// Look up a level by id, falling back to `easy` for unknown ids.
#[must_use]
pub fn config_for(id: &str) -> &'static DifficultyLevel {
    Difficulty::from_id(id).level()
}

/// All levels in selection order.
#[must_use]
pub fn all_levels() -> &'static [DifficultyLevel] {
    &LEVELS
}

/// Whether `id` names a known difficulty.
#[must_use]
pub fn is_valid(id: &str) -> bool {
    id.parse::<Difficulty>().is_ok()
}
