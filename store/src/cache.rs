//! Scoped write cache over a parent store.
//!
//! A `CacheStore` is the isolated working copy an operation mutates. Reads
//! see the cache's own writes first and fall through to the parent; writes
//! never touch the parent. When the operation succeeds the caller turns the
//! cache into a [`WriteBatch`] and applies it to the parent; on failure the
//! cache is simply dropped and every buffered write is discarded.
//!
//! Caches nest: a cache can sit on top of another cache, which is how the
//! execution engine isolates one attempt at running payload actions from the
//! surrounding operation.

use std::collections::BTreeMap;

use crate::batch::WriteBatch;
use crate::kv::KvStore;
use crate::StoreError;

/// Buffered writes over a read-only parent. `None` marks a deletion.
pub struct CacheStore<'a> {
    parent: &'a dyn KvStore,
    pending: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl<'a> CacheStore<'a> {
    pub fn new(parent: &'a dyn KvStore) -> Self {
        Self {
            parent,
            pending: BTreeMap::new(),
        }
    }

    /// Number of keys touched so far.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Consume the cache, yielding its writes for the caller to commit.
    pub fn into_batch(self) -> WriteBatch {
        let mut batch = WriteBatch::new();
        for (key, value) in self.pending {
            match value {
                Some(v) => batch.put(key, v),
                None => batch.delete(key),
            }
        }
        batch
    }
}

impl KvStore for CacheStore<'_> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        match self.pending.get(key) {
            Some(cached) => Ok(cached.clone()),
            None => self.parent.get(key),
        }
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.pending.insert(key.to_vec(), Some(value.to_vec()));
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), StoreError> {
        self.pending.insert(key.to_vec(), None);
        Ok(())
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> =
            self.parent.scan_prefix(prefix)?.into_iter().collect();

        for (key, value) in self
            .pending
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
        {
            match value {
                Some(v) => {
                    merged.insert(key.clone(), v.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }
        Ok(merged.into_iter().collect())
    }

    fn write_batch(&mut self, batch: WriteBatch) -> Result<(), StoreError> {
        for op in batch.into_ops() {
            match op {
                crate::BatchOp::Put(key, value) => {
                    self.pending.insert(key, Some(value));
                }
                crate::BatchOp::Delete(key) => {
                    self.pending.insert(key, None);
                }
            }
        }
        Ok(())
    }
}
