//! Staged writes applied in one step

use std::collections::BTreeMap;

/// Pending writes keyed by full store key
///
/// Later writes to the same key replace earlier ones. Iteration is in key
/// order, so applying a batch is deterministic.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WriteBatch {
    ops: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        self.ops.insert(key.into(), Some(value.into()));
    }

    pub fn delete(&mut self, key: impl Into<Vec<u8>>) {
        self.ops.insert(key.into(), None);
    }

    /// Staged state of `key`: `Some(Some(v))` set, `Some(None)` deleted, `None` untouched
    pub fn staged(&self, key: &[u8]) -> Option<Option<&[u8]>> {
        self.ops.get(key).map(|v| v.as_deref())
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Merge `other` into this batch; `other` wins on conflicts
    pub fn extend(&mut self, other: WriteBatch) {
        self.ops.extend(other.ops);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&[u8], Option<&[u8]>)> {
        self.ops.iter().map(|(k, v)| (k.as_slice(), v.as_deref()))
    }

    pub fn into_ops(self) -> impl Iterator<Item = (Vec<u8>, Option<Vec<u8>>)> {
        self.ops.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_write_wins() {
        let mut batch = WriteBatch::new();
        batch.set(b"k".to_vec(), b"1".to_vec());
        batch.set(b"k".to_vec(), b"2".to_vec());
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.staged(b"k"), Some(Some(&b"2"[..])));

        batch.delete(b"k".to_vec());
        assert_eq!(batch.staged(b"k"), Some(None));
        assert_eq!(batch.staged(b"other"), None);
    }

    #[test]
    fn test_iteration_is_key_ordered() {
        let mut batch = WriteBatch::new();
        batch.set(b"c".to_vec(), b"3".to_vec());
        batch.set(b"a".to_vec(), b"1".to_vec());
        batch.set(b"b".to_vec(), b"2".to_vec());

        let keys: Vec<_> = batch.iter().map(|(k, _)| k.to_vec()).collect();
        assert_eq!(keys, vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
    }

    #[test]
    fn test_extend_prefers_other() {
        let mut a = WriteBatch::new();
        a.set(b"k".to_vec(), b"old".to_vec());
        let mut b = WriteBatch::new();
        b.set(b"k".to_vec(), b"new".to_vec());
        a.extend(b);
        assert_eq!(a.staged(b"k"), Some(Some(&b"new"[..])));
    }
}
