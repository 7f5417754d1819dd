//! Directory-backed key-value store.
//!
//! Each key is stored as a single file named `{key}.json` inside the
//! configured base directory. The file body is the raw stored string.

use std::path::PathBuf;

use crate::error::{LedgerError, Result};

use super::KeyValueStore;

// ── FileStore ─────────────────────────────────────────────────────────────────

/// Filesystem-backed store, one file per key.
///
/// The store is safe for single-process use; concurrent writes from
/// multiple processes are not coordinated.
#[derive(Debug, Clone)]
pub struct FileStore {
    base_dir: PathBuf,
}

impl FileStore {
    /// Create a new `FileStore` rooted at `base_dir`.
    ///
    /// The directory and any missing parents are created if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Io` if the directory cannot be created.
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &std::path::Path {
        &self.base_dir
    }

    // ── Internal helpers ──────────────────────────────────────────────────────

    /// Build the filesystem path for a key.
    ///
    /// Keys are fixed identifiers; anything that could escape the base
    /// directory is refused.
    fn key_path(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(LedgerError::StorageError(format!(
                "invalid storage key: {key:?}"
            )));
        }
        Ok(self.base_dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key)?;
        match std::fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(LedgerError::Io(e)),
        }
    }

    /// Writes to a temporary sibling first, then renames over the target.
    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.key_path(key)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value.as_bytes())?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let path = self.key_path(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(LedgerError::Io(e)),
        }
    }

    fn keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();

        for entry in std::fs::read_dir(&self.base_dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let name_str = name.to_string_lossy();

            if let Some(stem) = name_str.strip_suffix(".json") {
                keys.push(stem.to_string());
            }
        }

        Ok(keys)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
