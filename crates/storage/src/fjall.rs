use std::path::Path;

use fjall::{Batch, Config, Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};

use crate::{KeyValueStore, KvIter, StoreError, StoreOptions, WriteBatch, WriteOp};

const PARTITION_NAME: &str = "chainindex";

pub struct FjallStore {
    keyspace: Keyspace,
    partition: PartitionHandle,
}

impl FjallStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::open_with_options(path, StoreOptions::default())
    }

    pub fn open_with_options(
        path: impl AsRef<Path>,
        options: StoreOptions,
    ) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if !options.create_if_missing && !path.exists() {
            return Err(StoreError::Backend(format!(
                "database missing at {}",
                path.display()
            )));
        }
        if options.bloom_bits_per_key != StoreOptions::default().bloom_bits_per_key {
            // Accepted for config compatibility; this engine sizes its own
            // per-segment filters.
            argond_log::log_debug!(
                "bloom_bits_per_key={} has no effect on this engine",
                options.bloom_bits_per_key
            );
        }

        let keyspace = Config::new(path)
            .cache_size(options.cache_bytes)
            .open()
            .map_err(map_err)?;
        let partition = keyspace
            .open_partition(PARTITION_NAME, PartitionCreateOptions::default())
            .map_err(map_err)?;
        Ok(Self {
            keyspace,
            partition,
        })
    }
}

impl KeyValueStore for FjallStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        let value = self.partition.get(key).map_err(map_err)?;
        Ok(value.map(|bytes| bytes.to_vec()))
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.partition.insert(key, value).map_err(map_err)?;
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<(), StoreError> {
        self.partition.remove(key).map_err(map_err)?;
        Ok(())
    }

    fn write_batch(&self, batch: &WriteBatch) -> Result<(), StoreError> {
        if batch.is_empty() {
            return Ok(());
        }

        let mut engine_batch = Batch::with_capacity(self.keyspace.clone(), batch.len())
            .durability(Some(PersistMode::Buffer));
        for op in batch.iter() {
            match op {
                WriteOp::Put { key, value } => {
                    engine_batch.insert(&self.partition, key.as_slice(), value.as_slice());
                }
                WriteOp::Delete { key } => {
                    engine_batch.remove(&self.partition, key.as_slice());
                }
            }
        }
        engine_batch.commit().map_err(map_err)
    }

    fn iterate_from(&self, start: &[u8]) -> Result<KvIter<'_>, StoreError> {
        let iter = self.partition.range(start.to_vec()..).map(|entry| {
            entry
                .map(|(key, value)| (key.to_vec(), value.to_vec()))
                .map_err(map_err)
        });
        Ok(Box::new(iter))
    }

    fn close(&self) -> Result<(), StoreError> {
        self.keyspace.persist(PersistMode::SyncAll).map_err(map_err)
    }
}

fn map_err(err: fjall::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}
