//! Ordered key-value store interface

use crate::batch::WriteBatch;
use crate::error::Result;

/// Ordered key-value store
///
/// Implementations must return `scan_prefix` results in ascending key order
/// and must apply a `WriteBatch` all-or-nothing.
pub trait KvStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    fn set(&self, key: &[u8], value: &[u8]) -> Result<()>;

    fn delete(&self, key: &[u8]) -> Result<()>;

    /// All entries whose key starts with `prefix`, ascending by key
    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>>;

    /// Apply every staged write atomically
    fn apply(&self, batch: WriteBatch) -> Result<()>;

    fn has(&self, key: &[u8]) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }
}

impl<S: KvStore + ?Sized> KvStore for &S {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        (**self).set(key, value)
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        (**self).delete(key)
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        (**self).scan_prefix(prefix)
    }

    fn apply(&self, batch: WriteBatch) -> Result<()> {
        (**self).apply(batch)
    }

    fn has(&self, key: &[u8]) -> Result<bool> {
        (**self).has(key)
    }
}

impl<S: KvStore + ?Sized> KvStore for std::sync::Arc<S> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        (**self).set(key, value)
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        (**self).delete(key)
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        (**self).scan_prefix(prefix)
    }

    fn apply(&self, batch: WriteBatch) -> Result<()> {
        (**self).apply(batch)
    }

    fn has(&self, key: &[u8]) -> Result<bool> {
        (**self).has(key)
    }
}
