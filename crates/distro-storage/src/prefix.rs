//! Namespaced view over a store

use crate::batch::WriteBatch;
use crate::error::Result;
use crate::store::KvStore;

/// A store view where every key is `prefix || key`
///
/// Keys inside a namespace are raw (no length prefix); distinct namespaces
/// use prefixes that cannot be a prefix of one another.
pub struct PrefixStore<'a, S: KvStore + ?Sized> {
    inner: &'a S,
    prefix: &'static [u8],
}

impl<'a, S: KvStore + ?Sized> PrefixStore<'a, S> {
    pub fn new(inner: &'a S, prefix: &'static [u8]) -> Self {
        Self { inner, prefix }
    }

    pub fn prefix(&self) -> &'static [u8] {
        self.prefix
    }

    /// Full store key for `key`
    pub fn full_key(&self, key: &[u8]) -> Vec<u8> {
        let mut full = Vec::with_capacity(self.prefix.len() + key.len());
        full.extend_from_slice(self.prefix);
        full.extend_from_slice(key);
        full
    }

    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.inner.get(&self.full_key(key))
    }

    pub fn has(&self, key: &[u8]) -> Result<bool> {
        self.inner.has(&self.full_key(key))
    }

    pub fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.inner.set(&self.full_key(key), value)
    }

    pub fn delete(&self, key: &[u8]) -> Result<()> {
        self.inner.delete(&self.full_key(key))
    }

    /// Stage a write of `key` into `batch` instead of writing it now
    pub fn stage_set(&self, batch: &mut WriteBatch, key: &[u8], value: &[u8]) {
        batch.set(self.full_key(key), value.to_vec());
    }

    /// All entries in the namespace, prefix stripped, ascending by key
    pub fn scan(&self) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let prefix_len = self.prefix.len();
        Ok(self
            .inner
            .scan_prefix(self.prefix)?
            .into_iter()
            .map(|(k, v)| (k[prefix_len..].to_vec(), v))
            .collect())
    }
}
