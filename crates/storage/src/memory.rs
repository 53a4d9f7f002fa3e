use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::{KeyValueStore, KvIter, StoreError, WriteBatch, WriteOp};

/// BTreeMap-backed store for tests and tools; same ordering guarantees as
/// the on-disk engine.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        let guard = self.inner.read().expect("memory store lock");
        Ok(guard.get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        let mut guard = self.inner.write().expect("memory store lock");
        guard.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<(), StoreError> {
        let mut guard = self.inner.write().expect("memory store lock");
        guard.remove(key);
        Ok(())
    }

    fn write_batch(&self, batch: &WriteBatch) -> Result<(), StoreError> {
        let mut guard = self.inner.write().expect("memory store lock");
        for op in batch.iter() {
            match op {
                WriteOp::Put { key, value } => {
                    guard.insert(key.as_slice().to_vec(), value.as_slice().to_vec());
                }
                WriteOp::Delete { key } => {
                    guard.remove(key.as_slice());
                }
            }
        }
        Ok(())
    }

    fn iterate_from(&self, start: &[u8]) -> Result<KvIter<'_>, StoreError> {
        let guard = self.inner.read().expect("memory store lock");
        let entries: Vec<(Vec<u8>, Vec<u8>)> = guard
            .range(start.to_vec()..)
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        Ok(Box::new(entries.into_iter().map(Ok)))
    }

    fn close(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
