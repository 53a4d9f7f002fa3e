//! Keyed access to the chain index store with batched transactions.
//!
//! A `ChainDb` wraps the raw store and owns at most one pending write batch.
//! While a transaction is open, writes accumulate in the batch and reads
//! observe the batch's pending state before falling through to the store.

use std::sync::{Arc, Mutex};

use argond_consensus::Hash256;
use argond_primitives::encoding::{decode, encode, Decoder, Encoder};
use argond_primitives::outpoint::OutPoint;
use argond_primitives::transaction::Transaction;
use argond_storage::{BatchLookup, KeyValueStore, StoreError, WriteBatch};
use primitive_types::U256;

use crate::blockindex::DiskBlockIndex;
use crate::error::ChainError;
use crate::keys::{
    singleton_key, tagged_key, KEY_BEST_CHAIN, KEY_BEST_INVALID_TRUST, KEY_CHECKPOINT_PUBKEY,
    KEY_SYNC_CHECKPOINT, KEY_VERSION, TAG_BLOCK_INDEX, TAG_TX,
};
use crate::loader::BlockFiles;
use crate::txindex::{DiskTxPos, TxIndex};

pub const DATABASE_VERSION: u32 = 70510;

pub struct ChainDb<S> {
    store: Arc<S>,
    txn: Mutex<Option<WriteBatch>>,
}

impl<S> ChainDb<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            txn: Mutex::new(None),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }
}

impl<S: KeyValueStore> ChainDb<S> {
    /// Open a transaction. Opening a second one is an invariant violation.
    pub fn txn_begin(&self) {
        let mut guard = self.txn.lock().expect("txn lock");
        assert!(guard.is_none(), "nested chain-db transaction");
        *guard = Some(WriteBatch::new());
    }

    /// Flush the pending batch atomically. On failure the batch is still
    /// discarded and the handle stays usable; the caller retries from
    /// scratch.
    pub fn txn_commit(&self) -> Result<(), ChainError> {
        let batch = self
            .txn
            .lock()
            .expect("txn lock")
            .take()
            .expect("commit without open transaction");
        self.store.write_batch(&batch)?;
        Ok(())
    }

    /// Discard the pending batch.
    pub fn txn_abort(&self) {
        let discarded = self.txn.lock().expect("txn lock").take();
        assert!(discarded.is_some(), "abort without open transaction");
    }

    pub fn txn_open(&self) -> bool {
        self.txn.lock().expect("txn lock").is_some()
    }

    fn read_raw(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        if let Some(batch) = self.txn.lock().expect("txn lock").as_ref() {
            match batch.lookup(key) {
                BatchLookup::Found(value) => return Ok(Some(value)),
                BatchLookup::Tombstoned => return Ok(None),
                BatchLookup::NotInBatch => {}
            }
        }
        self.store.get(key)
    }

    fn write_raw(&self, key: Vec<u8>, value: Vec<u8>) -> Result<(), StoreError> {
        let mut guard = self.txn.lock().expect("txn lock");
        match guard.as_mut() {
            Some(batch) => {
                batch.put(key, value);
                Ok(())
            }
            None => self.store.put(&key, &value),
        }
    }

    fn erase_raw(&self, key: Vec<u8>) -> Result<(), StoreError> {
        let mut guard = self.txn.lock().expect("txn lock");
        match guard.as_mut() {
            Some(batch) => {
                batch.delete(key);
                Ok(())
            }
            None => self.store.delete(&key),
        }
    }

    // --- transaction index ---

    pub fn read_tx_index(&self, hash: &Hash256) -> Result<Option<TxIndex>, ChainError> {
        match self.read_raw(&tagged_key(TAG_TX, hash))? {
            Some(bytes) => Ok(Some(decode::<TxIndex>(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn update_tx_index(&self, hash: &Hash256, txindex: &TxIndex) -> Result<(), ChainError> {
        self.write_raw(tagged_key(TAG_TX, hash), encode(txindex))?;
        Ok(())
    }

    /// Record a freshly connected transaction: position plus one unspent
    /// slot per output.
    pub fn add_tx_index(&self, tx: &Transaction, pos: DiskTxPos) -> Result<(), ChainError> {
        self.update_tx_index(&tx.txid(), &TxIndex::new(pos, tx))
    }

    pub fn erase_tx_index(&self, hash: &Hash256) -> Result<(), ChainError> {
        self.erase_raw(tagged_key(TAG_TX, hash))?;
        Ok(())
    }

    pub fn contains_tx(&self, hash: &Hash256) -> Result<bool, ChainError> {
        Ok(self.read_raw(&tagged_key(TAG_TX, hash))?.is_some())
    }

    /// Read a transaction's index record and the transaction itself from the
    /// block-file store.
    pub fn read_disk_tx(
        &self,
        hash: &Hash256,
        files: &dyn BlockFiles,
    ) -> Result<Option<(Transaction, TxIndex)>, ChainError> {
        let txindex = match self.read_tx_index(hash)? {
            Some(txindex) => txindex,
            None => return Ok(None),
        };
        let tx = files.read_tx(txindex.pos)?;
        Ok(Some((tx, txindex)))
    }

    pub fn read_disk_tx_prevout(
        &self,
        prevout: &OutPoint,
        files: &dyn BlockFiles,
    ) -> Result<Option<(Transaction, TxIndex)>, ChainError> {
        self.read_disk_tx(&prevout.hash, files)
    }

    // --- block index ---

    pub fn read_block_index(&self, hash: &Hash256) -> Result<Option<DiskBlockIndex>, ChainError> {
        match self.read_raw(&tagged_key(TAG_BLOCK_INDEX, hash))? {
            Some(bytes) => Ok(Some(decode::<DiskBlockIndex>(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn write_block_index(&self, disk: &DiskBlockIndex) -> Result<(), ChainError> {
        let key = tagged_key(TAG_BLOCK_INDEX, &disk.block_hash());
        self.write_raw(key, encode(disk))?;
        Ok(())
    }

    pub fn contains_block_index(&self, hash: &Hash256) -> Result<bool, ChainError> {
        Ok(self
            .read_raw(&tagged_key(TAG_BLOCK_INDEX, hash))?
            .is_some())
    }

    // --- singletons ---

    pub fn read_version(&self) -> Result<Option<u32>, ChainError> {
        match self.read_raw(&singleton_key(KEY_VERSION))? {
            Some(bytes) => {
                let mut decoder = Decoder::new(&bytes);
                let version = decoder.read_u32_le()?;
                Ok(Some(version))
            }
            None => Ok(None),
        }
    }

    pub fn write_version(&self, version: u32) -> Result<(), ChainError> {
        let mut encoder = Encoder::with_capacity(4);
        encoder.write_u32_le(version);
        self.write_raw(singleton_key(KEY_VERSION), encoder.into_inner())?;
        Ok(())
    }

    pub fn read_best_chain(&self) -> Result<Option<Hash256>, ChainError> {
        self.read_hash_singleton(KEY_BEST_CHAIN)
    }

    pub fn write_best_chain(&self, hash: &Hash256) -> Result<(), ChainError> {
        self.write_hash_singleton(KEY_BEST_CHAIN, hash)
    }

    pub fn read_sync_checkpoint(&self) -> Result<Option<Hash256>, ChainError> {
        self.read_hash_singleton(KEY_SYNC_CHECKPOINT)
    }

    pub fn write_sync_checkpoint(&self, hash: &Hash256) -> Result<(), ChainError> {
        self.write_hash_singleton(KEY_SYNC_CHECKPOINT, hash)
    }

    pub fn read_best_invalid_trust(&self) -> Result<Option<U256>, ChainError> {
        match self.read_raw(&singleton_key(KEY_BEST_INVALID_TRUST))? {
            Some(bytes) => {
                let mut decoder = Decoder::new(&bytes);
                let raw = decoder.read_fixed::<32>()?;
                Ok(Some(U256::from_little_endian(&raw)))
            }
            None => Ok(None),
        }
    }

    pub fn write_best_invalid_trust(&self, trust: &U256) -> Result<(), ChainError> {
        let mut raw = [0u8; 32];
        trust.to_little_endian(&mut raw);
        self.write_raw(singleton_key(KEY_BEST_INVALID_TRUST), raw.to_vec())?;
        Ok(())
    }

    pub fn read_checkpoint_pubkey(&self) -> Result<Option<String>, ChainError> {
        match self.read_raw(&singleton_key(KEY_CHECKPOINT_PUBKEY))? {
            Some(bytes) => {
                let mut decoder = Decoder::new(&bytes);
                Ok(Some(decoder.read_var_str()?))
            }
            None => Ok(None),
        }
    }

    pub fn write_checkpoint_pubkey(&self, pubkey: &str) -> Result<(), ChainError> {
        let mut encoder = Encoder::with_capacity(pubkey.len() + 1);
        encoder.write_var_str(pubkey);
        self.write_raw(singleton_key(KEY_CHECKPOINT_PUBKEY), encoder.into_inner())?;
        Ok(())
    }

    fn read_hash_singleton(&self, name: &str) -> Result<Option<Hash256>, ChainError> {
        match self.read_raw(&singleton_key(name))? {
            Some(bytes) => {
                let mut decoder = Decoder::new(&bytes);
                Ok(Some(decoder.read_hash()?))
            }
            None => Ok(None),
        }
    }

    fn write_hash_singleton(&self, name: &str, hash: &Hash256) -> Result<(), ChainError> {
        self.write_raw(singleton_key(name), hash.to_vec())?;
        Ok(())
    }
}
