//! Process-local key-value store.

use std::collections::HashMap;

use parking_lot::RwLock;
use tokio::sync::broadcast;

use super::{ChangeFeed, KeyValueStore, StorageChange};
use crate::error::Result;

/// In-memory [`KeyValueStore`]. Share it through an `Arc` to model several
/// writers (e.g. two open game windows) on one medium.
#[derive(Debug)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
    feed: ChangeFeed,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            feed: ChangeFeed::new(),
        }
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .write()
            .insert(key.to_string(), value.to_string());
        self.feed.publish(key, Some(value));
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        if self.entries.write().remove(key).is_some() {
            self.feed.publish(key, None);
        }
        Ok(())
    }

    fn subscribe(&self) -> Option<broadcast::Receiver<StorageChange>> {
        Some(self.feed.subscribe())
    }
}
