//! Advisory preference sync.
//!
//! Listens to the store's change feed and refreshes a cached copy of the
//! preferences whenever the preferences key is written elsewhere (another
//! window, an import). Last write wins; nothing is merged.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use pairs_core::persistence::{GameStorage, Preferences, StorageChange, StorageKey};
use pairs_core::schedule::ScheduledTask;

/// Cached preferences kept fresh from the change feed.
#[derive(Debug)]
pub struct PreferenceSync {
    cached: Arc<RwLock<Preferences>>,
    /// Aborted when the sync is dropped.
    listener: Option<ScheduledTask>,
}

impl PreferenceSync {
    /// Load the current preferences and, if the store has a change feed,
    /// start listening. Must be called from within a tokio runtime.
    #[must_use]
    pub fn spawn(storage: &GameStorage) -> Self {
        let cached = Arc::new(RwLock::new(storage.load_preferences()));
        let key = storage.key(StorageKey::Preferences);

        let listener = storage.subscribe().map(|mut changes| {
            let cache = Arc::clone(&cached);
            ScheduledTask::spawn(async move {
                loop {
                    match changes.recv().await {
                        Ok(change) if change.key == key => apply(&cache, &change),
                        Ok(_) => {}
                        Err(RecvError::Lagged(skipped)) => {
                            debug!(skipped, "Preference sync lagged");
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            })
        });

        Self { cached, listener }
    }

    /// Latest known preferences.
    #[must_use]
    pub fn current(&self) -> Preferences {
        self.cached.read().clone()
    }

    /// Record a local change without waiting for the feed.
    pub fn set_local(&self, preferences: Preferences) {
        *self.cached.write() = preferences;
    }

    /// Whether a change-feed listener is running.
    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.listener.as_ref().is_some_and(|task| !task.is_finished())
    }
}

fn apply(cache: &RwLock<Preferences>, change: &StorageChange) {
    let Some(json) = &change.new_value else {
        *cache.write() = Preferences::default();
        return;
    };
    match serde_json::from_str::<Preferences>(json) {
        Ok(preferences) => {
            debug!(key = %change.key, "Preferences refreshed from store");
            *cache.write() = preferences;
        }
        Err(e) => warn!(key = %change.key, error = %e, "Ignoring malformed preference update"),
    }
}
