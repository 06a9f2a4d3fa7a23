//! # pairs-frontend: Renderer Integration for Pairs
//!
//! This crate sits between a rendering layer (web view, TUI, native UI)
//! and the `pairs-core` engine. The renderer draws plain view structs and
//! sends back intents; it never holds engine state.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │             Rendering layer              │
//! │      draws BoardView / SummaryView       │
//! │  ┌───────────────────────────────────┐  │
//! │  │        pairs-frontend             │  │
//! │  │  ┌─────────────┐ ┌─────────────┐ │  │
//! │  │  │ Controller  │ │  Pref Sync  │ │  │
//! │  │  └──────┬──────┘ └──────┬──────┘ │  │
//! │  │         │               │         │  │
//! │  │         ▼               ▼         │  │
//! │  │    ┌─────────────────────────┐    │  │
//! │  │    │       pairs-core        │    │  │
//! │  │    └─────────────────────────┘    │  │
//! │  └───────────────────────────────────┘  │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `intents`: what the player can ask for
//! - `controller`: dispatches intents to the current session
//! - `view`: render-ready board and results snapshots
//! - `sync`: refreshes cached preferences from the store's change feed
//! - `telemetry`: `tracing` subscriber setup

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]

pub mod controller;
pub mod intents;
pub mod sync;
pub mod telemetry;
pub mod view;

pub use controller::GameController;
pub use intents::{IntentOutcome, UserIntent};
pub use view::{BoardView, CardView, SummaryView};
