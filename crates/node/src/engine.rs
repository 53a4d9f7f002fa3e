//! Structural validation engine backed by the chain-index store.
//!
//! Covers the checks that need no script evaluation or peer state: header
//! proof bounds, coinbase placement, merkle commitment, transaction sanity,
//! the stake-modifier checksum chain, and the best-chain pointer rewind.

use std::collections::HashSet;

use argond_chaindb::blockindex::BlockIndexEntry;
use argond_chaindb::db::ChainDb;
use argond_chaindb::loader::ConsensusHooks;
use argond_consensus::money::money_range;
use argond_consensus::{target_from_compact, Hash256};
use argond_primitives::block::Block;
use argond_primitives::encoding::Encoder;
use argond_primitives::hash::sha256d;
use argond_primitives::transaction::Transaction;
use argond_storage::KeyValueStore;
use primitive_types::U256;

/// Stake-modifier checksums pinned at known heights. Empty until a release
/// hardens them.
const STAKE_MODIFIER_CHECKPOINTS: [(u32, u32); 0] = [];

pub struct StructuralEngine<'a, S> {
    db: &'a ChainDb<S>,
}

impl<'a, S> StructuralEngine<'a, S> {
    pub fn new(db: &'a ChainDb<S>) -> Self {
        Self { db }
    }
}

impl<S: KeyValueStore> ConsensusHooks for StructuralEngine<'_, S> {
    fn check_index(&self, entry: &BlockIndexEntry) -> bool {
        if entry.is_proof_of_stake() {
            return true;
        }
        match target_from_compact(entry.bits) {
            Some(target) if !target.is_zero() => {
                U256::from_little_endian(&entry.hash) <= target
            }
            _ => false,
        }
    }

    fn check_block(&self, block: &Block, full: bool, _check_sig: bool) -> bool {
        if block.vtx.is_empty() || !block.vtx[0].is_coinbase() {
            return false;
        }
        if block.vtx.iter().skip(1).any(Transaction::is_coinbase) {
            return false;
        }
        if full {
            let txids: Vec<Hash256> = block.vtx.iter().map(Transaction::txid).collect();
            if compute_merkle_root(&txids) != block.header.merkle_root {
                return false;
            }
        }
        block.vtx.iter().all(|tx| self.check_transaction(tx))
    }

    fn check_transaction(&self, tx: &Transaction) -> bool {
        if tx.vin.is_empty() || tx.vout.is_empty() {
            return false;
        }

        let mut total: i64 = 0;
        for output in &tx.vout {
            if !money_range(output.value) {
                return false;
            }
            total = match total.checked_add(output.value) {
                Some(total) if money_range(total) => total,
                _ => return false,
            };
        }

        let mut seen = HashSet::new();
        for input in &tx.vin {
            if !input.prevout.is_null() && !seen.insert(input.prevout.clone()) {
                return false;
            }
        }

        if tx.is_coinbase() {
            (2..=100).contains(&tx.vin[0].script_sig.len())
        } else {
            tx.vin.iter().all(|input| !input.prevout.is_null())
        }
    }

    fn set_best_chain(&self, fork: &Hash256) -> Result<(), String> {
        self.db
            .write_best_chain(fork)
            .map_err(|err| err.to_string())
    }

    fn stake_modifier_checksum(&self, entry: &BlockIndexEntry, parent_checksum: u32) -> u32 {
        let mut encoder = Encoder::with_capacity(48);
        encoder.write_u32_le(parent_checksum);
        encoder.write_u32_le(entry.flags);
        encoder.write_hash(&entry.hash_proof);
        encoder.write_u64_le(entry.stake_modifier);
        let digest = sha256d(&encoder.into_inner());
        // top 32 bits of the 256-bit little-endian value
        u32::from_le_bytes(digest[28..32].try_into().expect("4 bytes"))
    }

    fn verify_checkpoint(&self, height: u32, checksum: u32) -> bool {
        STAKE_MODIFIER_CHECKPOINTS
            .iter()
            .find(|(pinned_height, _)| *pinned_height == height)
            .map(|(_, pinned)| *pinned == checksum)
            .unwrap_or(true)
    }
}

pub fn compute_merkle_root(txids: &[Hash256]) -> Hash256 {
    if txids.is_empty() {
        return [0u8; 32];
    }
    let mut layer = txids.to_vec();
    while layer.len() > 1 {
        if layer.len() % 2 == 1 {
            let last = *layer.last().expect("non-empty");
            layer.push(last);
        }
        let mut next = Vec::with_capacity(layer.len() / 2);
        for pair in layer.chunks(2) {
            let mut buf = [0u8; 64];
            buf[0..32].copy_from_slice(&pair[0]);
            buf[32..64].copy_from_slice(&pair[1]);
            next.push(sha256d(&buf));
        }
        layer = next;
    }
    layer[0]
}
