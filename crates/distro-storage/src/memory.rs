//! In-memory ordered store with snapshot persistence

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::batch::WriteBatch;
use crate::error::{Result, StorageError};
use crate::store::KvStore;

/// Snapshot format version
const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    entries: Vec<(Vec<u8>, Vec<u8>)>,
}

/// Full copy of a store's contents, taken by `MemoryStore::checkpoint`
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StoreCheckpoint(BTreeMap<Vec<u8>, Vec<u8>>);

impl StoreCheckpoint {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Ordered in-memory store
///
/// Backed by a `BTreeMap`, so prefix scans come out in key order. The whole
/// map can be written to and restored from a bincode snapshot file.
pub struct MemoryStore {
    data: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            data: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Copy the current contents
    pub fn checkpoint(&self) -> StoreCheckpoint {
        StoreCheckpoint(self.data.read().clone())
    }

    /// Replace the contents with `checkpoint`
    pub fn restore(&self, checkpoint: StoreCheckpoint) {
        *self.data.write() = checkpoint.0;
    }

    /// Load a snapshot file; a missing file yields an empty store
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no snapshot found, starting empty");
            return Ok(Self::new());
        }

        let bytes = fs::read(path)?;
        let snapshot: Snapshot = bincode::deserialize(&bytes)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(StorageError::Serialization(format!(
                "unsupported snapshot version {}",
                snapshot.version
            )));
        }

        let entries = snapshot.entries.len();
        let store = Self {
            data: RwLock::new(snapshot.entries.into_iter().collect()),
        };
        tracing::debug!(path = %path.display(), entries, "snapshot loaded");
        Ok(store)
    }

    /// Write the whole store to `path` (temp file + rename)
    pub fn save(&self, path: &Path) -> Result<()> {
        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            entries: self
                .data
                .read()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        };
        let bytes = bincode::serialize(&snapshot)?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, path)?;

        tracing::debug!(path = %path.display(), entries = snapshot.entries.len(), "snapshot saved");
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.data.read().get(key).cloned())
    }

    fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.data.write().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        self.data.write().remove(key);
        Ok(())
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let data = self.data.read();
        Ok(data
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn apply(&self, batch: WriteBatch) -> Result<()> {
        let mut data = self.data.write();
        for (key, op) in batch.into_ops() {
            match op {
                Some(value) => {
                    data.insert(key, value);
                }
                None => {
                    data.remove(&key);
                }
            }
        }
        Ok(())
    }

    fn has(&self, key: &[u8]) -> Result<bool> {
        Ok(self.data.read().contains_key(key))
    }
}
