//! Ordered key/value store abstraction with atomic write batches.
//!
//! Keys live in a single keyspace and carry their own canonical tag prefix;
//! iteration is ascending by key, so records of one tag are contiguous.

use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;

pub mod memory;

#[cfg(feature = "fjall")]
pub mod fjall;

#[derive(Debug)]
pub enum StoreError {
    Backend(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Backend(message) => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for StoreError {}

#[derive(Clone, Copy, Debug)]
pub struct StoreOptions {
    pub create_if_missing: bool,
    pub cache_bytes: u64,
    pub bloom_bits_per_key: u32,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            cache_bytes: 25 * 1024 * 1024,
            bloom_bits_per_key: 10,
        }
    }
}

#[derive(Clone, Debug)]
pub struct WriteKey(SmallVec<[u8; 48]>);

impl WriteKey {
    pub fn as_slice(&self) -> &[u8] {
        self.0.as_slice()
    }
}

impl AsRef<[u8]> for WriteKey {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl From<Vec<u8>> for WriteKey {
    fn from(value: Vec<u8>) -> Self {
        Self(SmallVec::from_vec(value))
    }
}

impl From<&[u8]> for WriteKey {
    fn from(value: &[u8]) -> Self {
        Self(SmallVec::from_slice(value))
    }
}

impl<const N: usize> From<[u8; N]> for WriteKey {
    fn from(value: [u8; N]) -> Self {
        Self(SmallVec::from_slice(&value))
    }
}

#[derive(Clone, Debug)]
pub struct WriteValue(SmallVec<[u8; 128]>);

impl WriteValue {
    pub fn as_slice(&self) -> &[u8] {
        self.0.as_slice()
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.0.into_vec()
    }
}

impl AsRef<[u8]> for WriteValue {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl From<Vec<u8>> for WriteValue {
    fn from(value: Vec<u8>) -> Self {
        Self(SmallVec::from_vec(value))
    }
}

impl From<&[u8]> for WriteValue {
    fn from(value: &[u8]) -> Self {
        Self(SmallVec::from_slice(value))
    }
}

impl<const N: usize> From<[u8; N]> for WriteValue {
    fn from(value: [u8; N]) -> Self {
        Self(SmallVec::from_slice(&value))
    }
}

#[derive(Clone, Debug)]
pub enum WriteOp {
    Put { key: WriteKey, value: WriteValue },
    Delete { key: WriteKey },
}

/// Result of probing a pending batch for a key.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BatchLookup {
    Found(Vec<u8>),
    Tombstoned,
    NotInBatch,
}

/// Ordered log of puts and deletes, committed atomically.
#[derive(Clone, Debug, Default)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reserve(&mut self, additional: usize) {
        self.ops.reserve(additional);
    }

    pub fn put(&mut self, key: impl Into<WriteKey>, value: impl Into<WriteValue>) {
        self.ops.push(WriteOp::Put {
            key: key.into(),
            value: value.into(),
        });
    }

    pub fn delete(&mut self, key: impl Into<WriteKey>) {
        self.ops.push(WriteOp::Delete { key: key.into() });
    }

    pub fn iter(&self) -> impl Iterator<Item = &WriteOp> {
        self.ops.iter()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Scan the log for `key`. The last matching operation wins, so a read
    /// through an open batch observes the batch's own pending state.
    pub fn lookup(&self, key: &[u8]) -> BatchLookup {
        let mut found = BatchLookup::NotInBatch;
        for op in &self.ops {
            match op {
                WriteOp::Put { key: op_key, value } if op_key.as_slice() == key => {
                    found = BatchLookup::Found(value.as_slice().to_vec());
                }
                WriteOp::Delete { key: op_key } if op_key.as_slice() == key => {
                    found = BatchLookup::Tombstoned;
                }
                _ => {}
            }
        }
        found
    }
}

pub type KvIter<'a> = Box<dyn Iterator<Item = Result<(Vec<u8>, Vec<u8>), StoreError>> + 'a>;

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;
    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError>;
    fn delete(&self, key: &[u8]) -> Result<(), StoreError>;
    fn write_batch(&self, batch: &WriteBatch) -> Result<(), StoreError>;
    /// Lazy ascending iteration starting at the first key `>= start`.
    fn iterate_from(&self, start: &[u8]) -> Result<KvIter<'_>, StoreError>;
    fn close(&self) -> Result<(), StoreError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        self.as_ref().get(key)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.as_ref().put(key, value)
    }

    fn delete(&self, key: &[u8]) -> Result<(), StoreError> {
        self.as_ref().delete(key)
    }

    fn write_batch(&self, batch: &WriteBatch) -> Result<(), StoreError> {
        self.as_ref().write_batch(batch)
    }

    fn iterate_from(&self, start: &[u8]) -> Result<KvIter<'_>, StoreError> {
        self.as_ref().iterate_from(start)
    }

    fn close(&self) -> Result<(), StoreError> {
        self.as_ref().close()
    }
}
