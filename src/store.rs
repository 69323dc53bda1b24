use simd_r_drive::storage_engine::DataStore;
use simd_r_drive::storage_engine::traits::{DataStoreReader, DataStoreWriter};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::constants::storage::{
    DEFAULT_STORE_DIR, DEFAULT_STORE_FILENAME, VALUE_RECORD_VERSION, VALUE_TOMBSTONE,
};
use crate::errors::TransferError;

/// Browser-scoped key-value store backend.
///
/// Values are text; every write is synchronous and visible to the next read.
/// Implementations report unavailability or exhaustion as
/// [`TransferError::Storage`].
pub trait PersistenceStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>, TransferError>;
    /// Overwrite the value stored under `key`.
    fn set(&self, key: &str, value: &str) -> Result<(), TransferError>;
    /// Remove `key`; removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), TransferError>;
}

/// In-memory store with an optional byte quota.
///
/// The quota counts key and value bytes, like a browser's local storage
/// allowance; writes that would exceed it fail without changing anything.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryStore {
    /// Unbounded, empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that rejects writes once `quota_bytes` would be exceeded.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            quota_bytes: Some(quota_bytes),
        }
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.read().map(|guard| guard.len()).unwrap_or(0)
    }

    /// True when no keys are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore")
            .field("keys", &self.len())
            .field("quota_bytes", &self.quota_bytes)
            .finish()
    }
}

impl PersistenceStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, TransferError> {
        Ok(self
            .entries
            .read()
            .map_err(|_| TransferError::Storage("memory store lock poisoned".into()))?
            .get(key)
            .cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), TransferError> {
        let mut guard = self
            .entries
            .write()
            .map_err(|_| TransferError::Storage("memory store lock poisoned".into()))?;
        if let Some(quota) = self.quota_bytes {
            let used: usize = guard
                .iter()
                .filter(|(existing, _)| existing.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = used + key.len() + value.len();
            if needed > quota {
                return Err(TransferError::Storage(format!(
                    "quota exceeded writing '{key}' ({needed} of {quota} bytes)"
                )));
            }
        }
        guard.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), TransferError> {
        self.entries
            .write()
            .map_err(|_| TransferError::Storage("memory store lock poisoned".into()))?
            .remove(key);
        Ok(())
    }
}

/// File-backed store for state that must survive process restarts.
///
/// Values are written as a version byte followed by UTF-8 text; removals
/// append a tombstone record.
pub struct FileStore {
    store: DataStore,
    path: PathBuf,
}

impl fmt::Debug for FileStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileStore")
            .field("path", &self.path)
            .finish()
    }
}

impl FileStore {
    /// Open (or create) a file-backed store at `path`.
    ///
    /// A directory path resolves to the default filename inside it.
    pub fn open<P: Into<PathBuf>>(path: P) -> Result<Self, TransferError> {
        let path = coerce_store_path(path.into());
        ensure_parent_dir(&path)?;
        let store = DataStore::open(path.as_path()).map_err(map_store_err)?;
        Ok(Self { store, path })
    }

    /// Default store file path under the crate's default store directory.
    pub fn default_path() -> PathBuf {
        Self::default_path_in_dir(DEFAULT_STORE_DIR)
    }

    /// Default store file path inside a custom directory.
    pub fn default_path_in_dir<P: AsRef<Path>>(dir: P) -> PathBuf {
        dir.as_ref().join(DEFAULT_STORE_FILENAME)
    }

    /// Resolved store file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PersistenceStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, TransferError> {
        match self.store.read(key.as_bytes()).map_err(map_store_err)? {
            None => Ok(None),
            Some(entry) => decode_value(entry.as_ref()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), TransferError> {
        let payload = encode_value(value);
        self.store
            .write(key.as_bytes(), payload.as_slice())
            .map_err(map_store_err)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), TransferError> {
        if self.get(key)?.is_none() {
            return Ok(());
        }
        self.store
            .write(key.as_bytes(), &[VALUE_TOMBSTONE])
            .map_err(map_store_err)?;
        Ok(())
    }
}

fn encode_value(value: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(1 + value.len());
    buf.push(VALUE_RECORD_VERSION);
    buf.extend_from_slice(value.as_bytes());
    buf
}

fn decode_value(bytes: &[u8]) -> Result<Option<String>, TransferError> {
    match bytes.split_first() {
        None => Ok(None),
        Some((&VALUE_TOMBSTONE, _)) => Ok(None),
        Some((&VALUE_RECORD_VERSION, text)) => String::from_utf8(text.to_vec())
            .map(Some)
            .map_err(|err| TransferError::Storage(format!("corrupt stored value: {err}"))),
        Some((version, _)) => Err(TransferError::Storage(format!(
            "stored value version mismatch (expected {VALUE_RECORD_VERSION}, found {version})"
        ))),
    }
}

fn coerce_store_path(path: PathBuf) -> PathBuf {
    if path.is_dir() {
        return path.join(DEFAULT_STORE_FILENAME);
    }
    path
}

fn ensure_parent_dir(path: &Path) -> Result<(), TransferError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn map_store_err(err: io::Error) -> TransferError {
    TransferError::Storage(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn memory_store_overwrites_and_removes() {
        let store = MemoryStore::new();
        store.set("records:LMP", "[]").unwrap();
        store.set("records:LMP", "[{}]").unwrap();
        assert_eq!(store.get("records:LMP").unwrap().as_deref(), Some("[{}]"));

        store.remove("records:LMP").unwrap();
        store.remove("records:LMP").unwrap();
        assert_eq!(store.get("records:LMP").unwrap(), None);
        assert!(store.is_empty());
    }

    #[test]
    fn memory_store_quota_rejects_without_partial_write() {
        let store = MemoryStore::with_quota(16);
        store.set("k", "0123456789").unwrap();
        let err = store.set("k2", "0123456789").unwrap_err();
        assert!(err.is_storage());
        assert_eq!(store.get("k2").unwrap(), None);
        // Replacing an existing value only counts the new size.
        store.set("k", "abcdefghijklmno").unwrap();
    }

    #[test]
    fn file_store_values_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("viewer.bin");
        {
            let store = FileStore::open(&path).unwrap();
            store.set("activeNamespace", "BMP").unwrap();
            store.set("selectedId:BMP", "Gadget").unwrap();
            store.remove("selectedId:BMP").unwrap();
        }
        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(
            reopened.get("activeNamespace").unwrap().as_deref(),
            Some("BMP")
        );
        assert_eq!(reopened.get("selectedId:BMP").unwrap(), None);
        assert_eq!(reopened.get("records:LMP").unwrap(), None);
    }

    #[test]
    fn file_store_directory_path_uses_default_filename() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        assert_eq!(store.path(), dir.path().join(DEFAULT_STORE_FILENAME));
    }

    #[test]
    fn decode_value_rejects_unknown_versions() {
        assert_eq!(decode_value(&[VALUE_TOMBSTONE]).unwrap(), None);
        assert_eq!(decode_value(&[]).unwrap(), None);
        assert!(decode_value(&[9, b'x']).is_err());
    }
}
