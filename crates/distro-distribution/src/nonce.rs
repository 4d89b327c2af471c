//! Nonce registry
//!
//! A nonce is consumed by writing a marker under `nonce/<nonce>`. Presence is
//! the only fact recorded; entries are never pruned, so the namespace grows
//! by one key per accepted instruction.

use distro_core::Nonce;
use distro_storage::{KvStore, PrefixStore, Result, WriteBatch};

use crate::keys::{nonce_key, NONCE_MARKER, NONCE_PREFIX};

/// Consumed-nonce set backed by the store
pub struct NonceRegistry<'a, S: KvStore + ?Sized> {
    view: PrefixStore<'a, S>,
}

impl<'a, S: KvStore + ?Sized> NonceRegistry<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            view: PrefixStore::new(store, NONCE_PREFIX),
        }
    }

    pub fn has_been_used(&self, nonce: &Nonce) -> Result<bool> {
        self.view.has(&nonce_key(nonce))
    }

    /// Record `nonce` as consumed; a second call is a no-op
    pub fn mark_used(&self, nonce: &Nonce) -> Result<()> {
        self.view.set(&nonce_key(nonce), NONCE_MARKER)
    }

    /// Stage the consumption of `nonce` into `batch`
    pub fn stage_mark_used(&self, batch: &mut WriteBatch, nonce: &Nonce) {
        self.view.stage_set(batch, &nonce_key(nonce), NONCE_MARKER);
    }

    /// Number of consumed nonces
    pub fn count(&self) -> Result<usize> {
        Ok(self.view.scan()?.len())
    }
}
