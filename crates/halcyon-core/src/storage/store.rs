//! Key-value persistence collaborators.
//!
//! The engines treat persistence as an external resource with no
//! transactional semantics: reads that fail are a cold start, writes are
//! best-effort. The cache engine is the sole writer of its own key.

use std::collections::HashMap;
use std::sync::Mutex;

use super::database::Database;
use crate::error::PersistenceError;

/// Key for the persisted prediction snapshot.
pub const PREDICTION_STATE_KEY: &str = "prediction-state";
/// Key for the "already prompted for biometrics" flag.
pub const BIOMETRIC_PROMPT_FLAG_KEY: &str = "biometric-prompt-flag";

/// External key-value persistence. Implementations may block; the
/// provider calls through `spawn_blocking`.
pub trait SnapshotStore: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError>;
    fn write(&self, key: &str, value: &str) -> Result<(), PersistenceError>;
}

/// The production store, backed by the SQLite kv table.
pub struct SqliteStore {
    db: Mutex<Database>,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        Self { db: Mutex::new(db) }
    }

    /// Open the default on-disk database.
    pub fn open() -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self::new(Database::open()?))
    }
}

impl SnapshotStore for SqliteStore {
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        let db = self.db.lock().map_err(|e| PersistenceError::ReadFailed {
            key: key.into(),
            message: e.to_string(),
        })?;
        db.kv_get(key).map_err(|e| PersistenceError::ReadFailed {
            key: key.into(),
            message: e.to_string(),
        })
    }

    fn write(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let db = self.db.lock().map_err(|e| PersistenceError::WriteFailed {
            key: key.into(),
            message: e.to_string(),
        })?;
        db.kv_set(key, value)
            .map_err(|e| PersistenceError::WriteFailed {
                key: key.into(),
                message: e.to_string(),
            })
    }
}

/// In-memory store for tests and previews.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed a key (e.g. a snapshot a previous run would have written).
    pub fn seeded(key: &str, value: &str) -> Self {
        let store = Self::new();
        if let Ok(mut entries) = store.entries.lock() {
            entries.insert(key.into(), value.into());
        }
        store
    }
}

impl SnapshotStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        let entries = self.entries.lock().map_err(|e| PersistenceError::ReadFailed {
            key: key.into(),
            message: e.to_string(),
        })?;
        Ok(entries.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| PersistenceError::WriteFailed {
                key: key.into(),
                message: e.to_string(),
            })?;
        entries.insert(key.into(), value.into());
        Ok(())
    }
}
