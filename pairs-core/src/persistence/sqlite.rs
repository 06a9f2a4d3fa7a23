//! SQLite-backed key-value store.
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS kv_store (
//!     key        TEXT PRIMARY KEY,
//!     value      TEXT NOT NULL,
//!     updated_at TEXT NOT NULL,
//!     checksum   TEXT
//! );
//! ```
//!
//! With checksums enabled every value is stored with its CRC-32; a value
//! whose checksum no longer matches is reported as malformed.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{Connection, OpenFlags, OptionalExtension, params};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::{ChangeFeed, KeyValueStore, StorageChange};
use crate::config::StorageConfig;
use crate::error::{PairsError, Result};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS kv_store (
    key        TEXT PRIMARY KEY,
    value      TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    checksum   TEXT
);";

/// CRC-32 (ISO 3309 polynomial) of `data` as lowercase hex.
fn crc32_hex(data: &[u8]) -> String {
    const POLY: u32 = 0xEDB8_8320;
    let crc = data.iter().fold(0xFFFF_FFFF_u32, |acc, &byte| {
        (0..8).fold(acc ^ u32::from(byte), |c, _| {
            if c & 1 == 1 { (c >> 1) ^ POLY } else { c >> 1 }
        })
    });
    format!("{:08x}", !crc)
}

/// [`KeyValueStore`] over a single SQLite file.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    checksum_enabled: bool,
    db_path: PathBuf,
    feed: ChangeFeed,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("db_path", &self.db_path)
            .field("checksum_enabled", &self.checksum_enabled)
            .finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Open (or create) a database at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`PairsError::Database`] on SQLite failures.
    pub fn open<P: AsRef<Path>>(path: P, config: &StorageConfig) -> Result<Self> {
        let db_path = path.as_ref().to_path_buf();
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(&db_path, flags)?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        conn.execute_batch("PRAGMA busy_timeout = 5000;")?;
        conn.execute_batch(SCHEMA)?;

        info!(path = %db_path.display(), "Game store opened");
        Ok(Self::with_connection(conn, config, db_path))
    }

    /// Open an in-memory database (useful for tests).
    ///
    /// # Errors
    ///
    /// Returns [`PairsError::Database`] on SQLite failures.
    pub fn open_in_memory(config: &StorageConfig) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self::with_connection(conn, config, PathBuf::from(":memory:")))
    }

    fn with_connection(conn: Connection, config: &StorageConfig, db_path: PathBuf) -> Self {
        Self {
            conn: Mutex::new(conn),
            checksum_enabled: config.checksum_enabled,
            db_path,
            feed: ChangeFeed::new(),
        }
    }

    /// Path to the database file (or `:memory:`).
    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Number of stored keys.
    ///
    /// # Errors
    ///
    /// Returns [`PairsError::Database`] on SQLite failures.
    pub fn key_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .lock()
            .query_row("SELECT COUNT(*) FROM kv_store", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let start = Instant::now();
        let row: Option<(String, Option<String>)> = {
            let conn = self.conn.lock();
            let mut stmt = conn.prepare_cached("SELECT value, checksum FROM kv_store WHERE key = ?1")?;
            stmt.query_row(params![key], |row| Ok((row.get(0)?, row.get(1)?)))
                .optional()?
        };

        let Some((value, stored_checksum)) = row else {
            return Ok(None);
        };

        if self.checksum_enabled {
            if let Some(expected) = stored_checksum {
                let actual = crc32_hex(value.as_bytes());
                if expected != actual {
                    warn!(key, %expected, %actual, "Checksum mismatch; stored value corrupted");
                    return Err(PairsError::Serialization(format!(
                        "checksum mismatch for {key}"
                    )));
                }
            }
        }

        debug!(key, bytes = value.len(), elapsed_us = start.elapsed().as_micros(), "Loaded value");
        Ok(Some(value))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let checksum = self.checksum_enabled.then(|| crc32_hex(value.as_bytes()));
        let now = Utc::now().to_rfc3339();

        self.conn.lock().execute(
            "INSERT INTO kv_store (key, value, updated_at, checksum)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at,
                checksum = excluded.checksum",
            params![key, value, now, checksum],
        )?;

        debug!(key, bytes = value.len(), "Saved value");
        self.feed.publish(key, Some(value));
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let deleted = self
            .conn
            .lock()
            .execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
        if deleted > 0 {
            self.feed.publish(key, None);
        }
        Ok(())
    }

    fn subscribe(&self) -> Option<broadcast::Receiver<StorageChange>> {
        Some(self.feed.subscribe())
    }
}
