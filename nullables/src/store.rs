//! Nullable store: ordered in-memory storage for testing.

use cohort_store::{KvStore, StoreError, WriteBatch};
use std::collections::BTreeMap;

/// An in-memory [`KvStore`] backed by a `BTreeMap`, so prefix scans come
/// back in key order exactly like a real ordered backend.
///
/// Writes can be switched off to simulate a backend that rejects a commit.
#[derive(Default)]
pub struct NullStore {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
    reject_writes: bool,
}

impl NullStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail with a backend error.
    pub fn set_reject_writes(&mut self, reject: bool) {
        self.reject_writes = reject;
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Full copy of the contents, for before/after comparisons.
    pub fn snapshot(&self) -> BTreeMap<Vec<u8>, Vec<u8>> {
        self.data.clone()
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.reject_writes {
            return Err(StoreError::Backend("writes rejected".into()));
        }
        Ok(())
    }
}

impl KvStore for NullStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.data.get(key).cloned())
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.check_writable()?;
        self.data.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), StoreError> {
        self.check_writable()?;
        self.data.remove(key);
        Ok(())
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        Ok(self
            .data
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    /// All-or-nothing: a rejected batch leaves the map untouched.
    fn write_batch(&mut self, batch: WriteBatch) -> Result<(), StoreError> {
        self.check_writable()?;
        for op in batch.into_ops() {
            match op {
                cohort_store::BatchOp::Put(key, value) => {
                    self.data.insert(key, value);
                }
                cohort_store::BatchOp::Delete(key) => {
                    self.data.remove(&key);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_delete() {
        let mut store = NullStore::new();
        store.put(b"k", b"v").unwrap();
        assert_eq!(store.get(b"k").unwrap(), Some(b"v".to_vec()));
        store.delete(b"k").unwrap();
        assert_eq!(store.get(b"k").unwrap(), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_scan_prefix_is_ordered_and_bounded() {
        let mut store = NullStore::new();
        store.put(&[1, 3], b"c").unwrap();
        store.put(&[1, 1], b"a").unwrap();
        store.put(&[2, 0], b"x").unwrap();
        store.put(&[1, 2], b"b").unwrap();

        let values: Vec<Vec<u8>> = store
            .scan_prefix(&[1])
            .unwrap()
            .into_iter()
            .map(|(_, v)| v)
            .collect();
        assert_eq!(values, vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
    }

    #[test]
    fn test_rejected_batch_changes_nothing() {
        let mut store = NullStore::new();
        store.put(b"k", b"v").unwrap();
        store.set_reject_writes(true);

        let mut batch = WriteBatch::new();
        batch.put(b"a".to_vec(), b"1".to_vec());
        batch.delete(b"k".to_vec());
        assert!(store.write_batch(batch).is_err());
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(b"k").unwrap(), Some(b"v".to_vec()));
    }
}
