//! Persistence for finished games, aggregate stats and preferences.
//!
//! The storage medium is a generic [`KeyValueStore`] holding JSON strings
//! under a handful of fixed keys:
//!
//! | key                | value                         |
//! |--------------------|-------------------------------|
//! | `history`          | `[SessionRecord]`, newest last, capped |
//! | `currentGame`      | optional [`GameSnapshot`]     |
//! | `performanceStats` | [`PerformanceMetrics`]        |
//! | `preferences`      | [`Preferences`]               |
//!
//! Physical key names carry the configured prefix (`pairs-history`, ...).
//! [`GameStorage`] wraps a store and never fails outward: unavailable
//! storage and malformed values are logged and replaced by defaults.

pub mod memory;
pub mod records;
pub mod sqlite;
pub mod storage;

pub use memory::MemoryStore;
pub use records::{
    AnimationSpeed, BestRecord, DataExport, GameSnapshot, PerformanceMetrics, Preferences,
    SessionRecord,
};
pub use sqlite::SqliteStore;
pub use storage::GameStorage;

use tokio::sync::broadcast;

use crate::error::Result;

/// Logical storage slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    /// Completed session log.
    History,
    /// Resumable in-progress game.
    CurrentGame,
    /// Aggregate performance metrics.
    PerformanceStats,
    /// User preferences.
    Preferences,
}

impl StorageKey {
    /// Every key, for bulk operations.
    pub const ALL: [StorageKey; 4] = [
        StorageKey::History,
        StorageKey::CurrentGame,
        StorageKey::PerformanceStats,
        StorageKey::Preferences,
    ];

    /// Logical name, without prefix.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::History => "history",
            Self::CurrentGame => "currentGame",
            Self::PerformanceStats => "performanceStats",
            Self::Preferences => "preferences",
        }
    }
}

/// Notification that a key was written or removed.
///
/// Advisory only: subscribers may use it to refresh cached values, never
/// to resolve conflicts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageChange {
    /// Physical key.
    pub key: String,
    /// New value, `None` on removal.
    pub new_value: Option<String>,
}

/// Synchronous string key-value storage.
///
/// Each call owns the store for its duration; writes are last-write-wins.
pub trait KeyValueStore: Send + Sync {
    /// Read a value. `Ok(None)` when the key is absent.
    ///
    /// # Errors
    /// Backend failures, or a stored value that fails verification.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    /// Backend failures.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a key. Removing an absent key is not an error.
    ///
    /// # Errors
    /// Backend failures.
    fn remove(&self, key: &str) -> Result<()>;

    /// Change feed, if the backend offers one.
    fn subscribe(&self) -> Option<broadcast::Receiver<StorageChange>> {
        None
    }
}

/// Broadcast helper shared by the bundled stores.
#[derive(Debug)]
pub(crate) struct ChangeFeed {
    sender: broadcast::Sender<StorageChange>,
}

impl ChangeFeed {
    const CAPACITY: usize = 64;

    pub(crate) fn new() -> Self {
        let (sender, _) = broadcast::channel(Self::CAPACITY);
        Self { sender }
    }

    pub(crate) fn publish(&self, key: &str, new_value: Option<&str>) {
        // No receivers is the common case.
        let _ = self.sender.send(StorageChange {
            key: key.to_string(),
            new_value: new_value.map(str::to_string),
        });
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.sender.subscribe()
    }
}
