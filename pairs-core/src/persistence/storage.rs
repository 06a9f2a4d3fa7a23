//! Game storage service.
//!
//! Every public method here is infallible. Read failures and malformed
//! JSON yield the documented default; write failures are logged and the
//! caller carries on with the in-memory value.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::{
    DataExport, GameSnapshot, KeyValueStore, MemoryStore, PerformanceMetrics, Preferences,
    SessionRecord, SqliteStore, StorageChange, StorageKey,
};
use crate::config::{StorageBackend, StorageConfig};
use crate::error::{PairsError, Result};

/// Typed access to the fixed storage keys.
#[derive(Clone)]
pub struct GameStorage {
    store: Arc<dyn KeyValueStore>,
    config: StorageConfig,
}

impl std::fmt::Debug for GameStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameStorage")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl GameStorage {
    /// Wrap an existing store.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, config: StorageConfig) -> Self {
        Self { store, config }
    }

    /// Storage over a fresh [`MemoryStore`].
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), StorageConfig::default())
    }

    /// Open the backend named by `config`.
    ///
    /// If the SQLite file cannot be opened the game still runs, on an
    /// in-memory store.
    #[must_use]
    pub fn from_config(config: &StorageConfig) -> Self {
        let store: Arc<dyn KeyValueStore> = match config.backend {
            StorageBackend::Memory => Arc::new(MemoryStore::new()),
            StorageBackend::Sqlite => match SqliteStore::open(&config.path, config) {
                Ok(store) => Arc::new(store),
                Err(e) => {
                    warn!(path = %config.path, error = %e, "Game store unavailable; falling back to memory");
                    Arc::new(MemoryStore::new())
                }
            },
        };
        Self::new(store, config.clone())
    }

    /// Physical key name for a logical slot.
    #[must_use]
    pub fn key(&self, key: StorageKey) -> String {
        format!("{}-{}", self.config.key_prefix, key.name())
    }

    /// Change feed of the underlying store, if it has one.
    #[must_use]
    pub fn subscribe(&self) -> Option<broadcast::Receiver<StorageChange>> {
        self.store.subscribe()
    }

    // ------------------------------------------------------------------
    // Raw typed access
    // ------------------------------------------------------------------

    fn try_read<T: DeserializeOwned>(&self, key: StorageKey) -> Result<Option<T>> {
        let Some(raw) = self.store.get(&self.key(key))? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    /// Read a slot, logging and swallowing failures.
    fn read<T: DeserializeOwned>(&self, key: StorageKey) -> Option<T> {
        match self.try_read(key) {
            Ok(value) => value,
            Err(PairsError::Serialization(reason)) => {
                warn!(key = key.name(), %reason, "Malformed stored data; using default");
                None
            }
            Err(e) => {
                warn!(key = key.name(), error = %e, "Failed to load from storage");
                None
            }
        }
    }

    fn try_write<T: Serialize>(&self, key: StorageKey, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        self.store.set(&self.key(key), &json)
    }

    /// Write a slot; returns whether it reached the store.
    fn write<T: Serialize>(&self, key: StorageKey, value: &T) -> bool {
        match self.try_write(key, value) {
            Ok(()) => true,
            Err(e) => {
                warn!(key = key.name(), error = %e, "Failed to save to storage");
                false
            }
        }
    }

    fn clear(&self, key: StorageKey) {
        if let Err(e) = self.store.remove(&self.key(key)) {
            warn!(key = key.name(), error = %e, "Failed to clear storage key");
        }
    }

    // ------------------------------------------------------------------
    // History & metrics
    // ------------------------------------------------------------------

    /// Append a completed session (evicting the oldest beyond the limit)
    /// and fold it into the aggregate metrics.
    ///
    /// Returns the updated metrics, which are valid even if nothing could
    /// be written.
    pub fn save_game_session(&self, session: &SessionRecord) -> PerformanceMetrics {
        let mut history = self.load_history();
        history.push(session.clone());
        let limit = self.config.history_limit.max(1);
        if history.len() > limit {
            let excess = history.len() - limit;
            history.drain(..excess);
        }
        self.write(StorageKey::History, &history);

        let mut metrics = self.load_performance_metrics();
        metrics.record(session, &history);
        self.write(StorageKey::PerformanceStats, &metrics);

        info!(
            session = %session.id,
            difficulty = %session.difficulty,
            score = session.score,
            stars = session.stars,
            history_len = history.len(),
            "Game session saved"
        );
        metrics
    }

    /// Completed sessions, oldest first. Empty if absent or unreadable.
    #[must_use]
    pub fn load_history(&self) -> Vec<SessionRecord> {
        self.read(StorageKey::History).unwrap_or_default()
    }

    /// Aggregate metrics; zeroed if absent or unreadable.
    #[must_use]
    pub fn load_performance_metrics(&self) -> PerformanceMetrics {
        self.read(StorageKey::PerformanceStats).unwrap_or_default()
    }

    // ------------------------------------------------------------------
    // Current game
    // ------------------------------------------------------------------

    /// Save the resumable snapshot.
    pub fn save_current_game(&self, snapshot: &GameSnapshot) {
        if self.write(StorageKey::CurrentGame, snapshot) {
            debug!(session = %snapshot.session_id, turns = snapshot.turns, "Current game saved");
        }
    }

    /// Resumable snapshot, if one was saved and is readable.
    #[must_use]
    pub fn load_current_game(&self) -> Option<GameSnapshot> {
        self.read(StorageKey::CurrentGame)
    }

    /// Drop the resumable snapshot.
    pub fn clear_current_game(&self) {
        self.clear(StorageKey::CurrentGame);
    }

    // ------------------------------------------------------------------
    // Preferences
    // ------------------------------------------------------------------

    /// Save preferences.
    pub fn save_preferences(&self, preferences: &Preferences) {
        self.write(StorageKey::Preferences, preferences);
    }

    /// Preferences; defaults if absent or unreadable.
    #[must_use]
    pub fn load_preferences(&self) -> Preferences {
        self.read(StorageKey::Preferences).unwrap_or_default()
    }

    // ------------------------------------------------------------------
    // Bulk
    // ------------------------------------------------------------------

    /// Remove every key this service owns.
    pub fn clear_all_data(&self) {
        for key in StorageKey::ALL {
            self.clear(key);
        }
        info!("All game data cleared");
    }

    /// Pretty-printed JSON of everything stored.
    #[must_use]
    pub fn export_data(&self) -> String {
        let export = DataExport {
            history: Some(self.load_history()),
            current_game: self.load_current_game(),
            metrics: Some(self.load_performance_metrics()),
            preferences: Some(self.load_preferences()),
        };
        serde_json::to_string_pretty(&export).unwrap_or_else(|e| {
            warn!(error = %e, "Failed to export data");
            "{}".to_string()
        })
    }

    /// Replace stored slots with those present in `json`.
    ///
    /// The whole document must parse before anything is written. Returns
    /// `false` on malformed input.
    pub fn import_data(&self, json: &str) -> bool {
        let data: DataExport = match serde_json::from_str(json) {
            Ok(data) => data,
            Err(e) => {
                warn!(error = %e, "Failed to import data");
                return false;
            }
        };

        if let Some(history) = &data.history {
            self.write(StorageKey::History, history);
        }
        if let Some(current) = &data.current_game {
            self.write(StorageKey::CurrentGame, current);
        }
        if let Some(metrics) = &data.metrics {
            self.write(StorageKey::PerformanceStats, metrics);
        }
        if let Some(preferences) = &data.preferences {
            self.write(StorageKey::Preferences, preferences);
        }
        true
    }
}
