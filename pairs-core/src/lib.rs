//! # Pairs Core Library
//!
//! Engine for a single-player memory-matching card game. A grid of
//! face-down cards is shuffled, the player turns over two at a time,
//! matches stay revealed, and a finished game is scored on time and
//! mistakes with a 1–3 star rating.
//!
//! ## Components
//!
//! - [`difficulty`]: static level table (grid, pairs, multiplier, max score)
//! - [`deck`]: unbiased shuffled decks with per-instance card identity
//! - [`board`]: turn sequencing and match resolution, timer-free
//! - [`timer`]: per-session elapsed time with pause, ticks and a cap
//! - [`score`]: pure score, star and personal-best computation
//! - [`persistence`]: key-value stores and the typed [`GameStorage`] service
//! - [`session`]: [`GameSession`], which ties the above together
//!
//! ## Failure Contract
//!
//! Nothing in a running game is fatal. Ineligible selections are ignored,
//! storage failures are logged and degrade to in-memory values, and
//! malformed stored data reads as its default.

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod board;
pub mod config;
pub mod deck;
pub mod difficulty;
pub mod error;
pub mod persistence;
pub mod schedule;
pub mod score;
pub mod session;
pub mod time_format;
pub mod timer;
pub mod types;

pub use board::{Board, IgnoreReason, Phase, SelectOutcome};
pub use config::PairsConfig;
pub use deck::{Card, Deck, build_deck};
pub use difficulty::{Difficulty, DifficultyLevel};
pub use error::PairsError;
pub use persistence::{GameStorage, KeyValueStore, MemoryStore, SqliteStore};
pub use score::{ScoreBreakdown, ScoreEngine};
pub use session::{GameSession, GameSummary, SessionEvent};
pub use timer::GameTimer;
pub use types::*;
