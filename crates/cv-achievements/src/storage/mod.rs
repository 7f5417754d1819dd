//! Storage layer for ledger state.
//!
//! State lives in a flat key-value store of JSON-encoded strings, the same
//! shape the CV page keeps in the browser's local storage:
//!
//! ```text
//! appInitialized  "true"
//! personalInfo    {name, title, about, githubUsername?}
//! studentId       plain string
//! achievements    [AchievementRecord]
//! verifiedKeys    [string]
//! skills          {skillId: Skill}
//! keyAttempts     [AttemptLogEntry]
//! ```
//!
//! # Modules
//!
//! - [`memory_store`] — in-memory store for tests and embedding.
//! - [`file_store`] — one `{key}.json` file per key in a directory.

pub mod file_store;
pub mod memory_store;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{LedgerError, Result};

pub use file_store::FileStore;
pub use memory_store::MemoryStore;

/// Fixed storage keys.
pub mod keys {
    pub const APP_INITIALIZED: &str = "appInitialized";
    pub const PERSONAL_INFO: &str = "personalInfo";
    pub const STUDENT_ID: &str = "studentId";
    pub const ACHIEVEMENTS: &str = "achievements";
    pub const VERIFIED_KEYS: &str = "verifiedKeys";
    pub const SKILLS: &str = "skills";
    pub const KEY_ATTEMPTS: &str = "keyAttempts";
}

/// A synchronous string key-value store.
///
/// Concurrent writers against the same backing storage are not
/// coordinated; the last write wins.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// Removing an absent key is not an error.
    fn remove(&mut self, key: &str) -> Result<()>;

    /// All keys currently present, in no particular order.
    fn keys(&self) -> Result<Vec<String>>;

    fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }
}

/// Read and deserialize a JSON value.
pub fn read_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Result<Option<T>> {
    match store.get(key)? {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| LedgerError::CorruptValue {
                key: key.to_string(),
                reason: e.to_string(),
            }),
        None => Ok(None),
    }
}

/// Serialize and write a JSON value.
pub fn write_json<T: Serialize + ?Sized>(
    store: &mut dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<()> {
    let json =
        serde_json::to_string(value).map_err(|e| LedgerError::SerializationError(e.to_string()))?;
    store.set(key, &json)
}
