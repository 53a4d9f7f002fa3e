//! Startup loader: stream the persisted block index, rebuild the in-memory
//! tree, accumulate chain trust, and run the tiered self-check over recent
//! history.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

use argond_consensus::{Hash256, ZERO_HASH};
use argond_primitives::block::Block;
use argond_primitives::encoding::decode;
use argond_primitives::hash::hash_to_hex;
use argond_primitives::outpoint::OutPoint;
use argond_primitives::transaction::Transaction;
use argond_storage::{KeyValueStore, StoreError};
use primitive_types::U256;

use crate::blockindex::{BlockIndexEntry, BlockTree, DiskBlockIndex};
use crate::db::ChainDb;
use crate::error::ChainError;
use crate::keys::{split_key, tagged_key, TAG_BLOCK_INDEX};
use crate::txindex::DiskTxPos;

/// Validation engine contract. The loader reports what it finds; any rewind
/// is performed by the engine through `set_best_chain`.
pub trait ConsensusHooks {
    fn check_index(&self, entry: &BlockIndexEntry) -> bool;
    fn check_block(&self, block: &Block, full: bool, check_sig: bool) -> bool;
    fn check_transaction(&self, tx: &Transaction) -> bool;
    fn set_best_chain(&self, fork: &Hash256) -> Result<(), String>;
    /// Rolling checksum over the stake-modifier chain; `parent_checksum` is
    /// the already-computed value of the parent node (zero at genesis).
    fn stake_modifier_checksum(&self, entry: &BlockIndexEntry, parent_checksum: u32) -> u32;
    fn verify_checkpoint(&self, height: u32, checksum: u32) -> bool;
}

/// Block-file store contract.
pub trait BlockFiles {
    fn read_block(&self, file: u32, block_pos: u32) -> Result<Block, StoreError>;
    fn read_tx(&self, pos: DiskTxPos) -> Result<Transaction, StoreError>;
}

#[derive(Clone, Copy, Debug)]
pub struct CheckParams {
    /// Self-check tier, 0..=7.
    pub level: u32,
    /// Blocks to walk back from the tip; 0 means the whole chain.
    pub depth: u32,
}

impl Default for CheckParams {
    fn default() -> Self {
        Self {
            level: 1,
            depth: 500,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ChainTip {
    pub hash: Hash256,
    pub height: u32,
    pub chain_trust: U256,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOutcome {
    pub best: Option<ChainTip>,
    pub sync_checkpoint: Option<Hash256>,
    pub best_invalid_trust: U256,
    /// `(prevout, stake_time)` pairs of every proof-of-stake block seen,
    /// for duplicate-stake detection.
    pub stake_seen: HashSet<(OutPoint, u32)>,
    /// Deepest block the self-check handed to `set_best_chain`, if any.
    pub reorged_to: Option<Hash256>,
}

/// Rebuild the block tree from the store and verify recent history.
///
/// Runs once per session: a non-empty tree short-circuits. A raised
/// shutdown flag makes every phase return early with whatever state was
/// established.
pub fn load_block_index<S: KeyValueStore>(
    db: &ChainDb<S>,
    tree: &mut BlockTree,
    hooks: &dyn ConsensusHooks,
    files: &dyn BlockFiles,
    check: CheckParams,
    shutdown: &AtomicBool,
) -> Result<LoadOutcome, ChainError> {
    if !tree.is_empty() {
        argond_log::log_debug!("block index already loaded, skipping");
        return Ok(LoadOutcome::default());
    }

    let mut outcome = LoadOutcome::default();

    // Phase 1: stream every blockindex record into the tree.
    let start_key = tagged_key(TAG_BLOCK_INDEX, &ZERO_HASH);
    let iter = db.store().iterate_from(&start_key)?;
    for entry in iter {
        if shutdown.load(Ordering::Relaxed) {
            break;
        }
        let (key, value) = entry?;
        let (tag, _payload) = split_key(&key)?;
        if tag != TAG_BLOCK_INDEX {
            break;
        }
        let disk = decode::<DiskBlockIndex>(&value)?;
        let hash = tree.apply_disk(&disk);
        let node = tree.get(&hash).expect("node just applied");
        if !hooks.check_index(node) {
            return Err(ChainError::IndexCorrupt {
                height: node.height,
            });
        }
        if node.is_proof_of_stake() {
            outcome
                .stake_seen
                .insert((node.prevout_stake.clone(), node.stake_time));
        }
    }
    argond_log::log_info!("loaded {} block index entries", tree.len());

    if shutdown.load(Ordering::Relaxed) {
        return Ok(outcome);
    }

    // Phase 2: accumulate chain trust in deterministic height order and
    // check every node against the stake-modifier checkpoints.
    for hash in tree.hashes_by_height() {
        if shutdown.load(Ordering::Relaxed) {
            return Ok(outcome);
        }
        let (parent_trust, parent_checksum) = {
            let node = tree.get(&hash).expect("sorted hash present");
            node.prev
                .and_then(|prev| tree.get(&prev))
                .map(|prev| (prev.chain_trust, prev.stake_modifier_checksum))
                .unwrap_or_default()
        };
        let node = tree.get_mut(&hash).expect("sorted hash present");
        node.chain_trust = parent_trust + node.block_trust();
        let checksum = hooks.stake_modifier_checksum(node, parent_checksum);
        node.stake_modifier_checksum = checksum;
        if !hooks.verify_checkpoint(node.height, node.stake_modifier_checksum) {
            return Err(ChainError::CheckpointMismatch {
                height: node.height,
            });
        }
    }

    // Phase 3: resolve the tip.
    let best_hash = match db.read_best_chain()? {
        Some(hash) => hash,
        None => {
            if tree.is_empty() {
                // Fresh node, nothing to verify.
                return Ok(outcome);
            }
            return Err(ChainError::BestChainMissing);
        }
    };
    let (best_height, best_trust) = match tree.get(&best_hash) {
        Some(node) => (node.height, node.chain_trust),
        None => return Err(ChainError::BestChainMissing),
    };
    outcome.best = Some(ChainTip {
        hash: best_hash,
        height: best_height,
        chain_trust: best_trust,
    });
    argond_log::log_info!(
        "best chain {} height={} trust={}",
        hash_to_hex(&best_hash),
        best_height,
        best_trust
    );

    let sync_checkpoint = db
        .read_sync_checkpoint()?
        .ok_or(ChainError::SyncCheckpointMissing)?;
    argond_log::log_info!("synchronized checkpoint {}", hash_to_hex(&sync_checkpoint));
    outcome.sync_checkpoint = Some(sync_checkpoint);
    outcome.best_invalid_trust = db.read_best_invalid_trust()?.unwrap_or_default();

    // Phase 4: tiered self-check, walking tip towards genesis. Every tier
    // that finds a defect points the fork at the block's parent; the walk
    // order leaves the deepest flagged ancestor in place.
    let level = check.level.min(7);
    let depth = if check.depth == 0 {
        best_height
    } else {
        check.depth.min(best_height)
    };

    let mut fork: Option<Hash256> = None;

    if level >= 1 {
        argond_log::log_info!("verifying last {depth} blocks at level {level}");
        let mut block_positions: HashMap<(u32, u32), Hash256> = HashMap::new();
        let mut cursor = Some(best_hash);

        while let Some(hash) = cursor {
            if shutdown.load(Ordering::Relaxed) {
                break;
            }
            let node = match tree.get(&hash) {
                Some(node) => node,
                None => break,
            };
            let Some(prev_hash) = node.prev else {
                break; // genesis
            };
            if node.height < best_height.saturating_sub(depth) {
                break;
            }

            let block = files.read_block(node.file, node.block_pos)?;

            // level 1: block validity; level 7 also verifies signatures
            if !hooks.check_block(&block, true, level >= 7) {
                argond_log::log_warn!(
                    "[WARNING] found bad block at {}, hash={}",
                    node.height,
                    hash_to_hex(&hash)
                );
                fork = Some(prev_hash);
            }

            if level >= 2 {
                block_positions.insert((node.file, node.block_pos), hash);

                for tx in &block.vtx {
                    let txid = tx.txid();
                    if let Some(txindex) = db.read_tx_index(&txid)? {
                        // level 2: recheck mislocated positions only;
                        // level 3: recheck every transaction, which also
                        // tolerates benign duplicate tx hashes
                        if level >= 3
                            || txindex.pos.file != node.file
                            || txindex.pos.block_pos != node.block_pos
                        {
                            match files.read_tx(txindex.pos) {
                                Err(_) => {
                                    argond_log::log_warn!(
                                        "[WARNING] cannot read mislocated transaction {}",
                                        hash_to_hex(&txid)
                                    );
                                    fork = Some(prev_hash);
                                }
                                Ok(found) => {
                                    if found.txid() != txid {
                                        argond_log::log_warn!(
                                            "[WARNING] invalid tx position for {}",
                                            hash_to_hex(&txid)
                                        );
                                        fork = Some(prev_hash);
                                    }
                                }
                            }
                        }

                        // level 4: spends must land inside a known block
                        if level >= 4 {
                            for (output, spend) in txindex.spent.iter().enumerate() {
                                if spend.is_null() {
                                    continue;
                                }
                                if !block_positions.contains_key(&(spend.file, spend.block_pos)) {
                                    argond_log::log_warn!(
                                        "[WARNING] found bad spend at {}, hashBlock={}, hashTx={}",
                                        node.height,
                                        hash_to_hex(&hash),
                                        hash_to_hex(&txid)
                                    );
                                    fork = Some(prev_hash);
                                }

                                // level 6: the spender must exist, validate,
                                // and actually consume this output
                                if level >= 6 {
                                    match files.read_tx(*spend) {
                                        Err(_) => {
                                            argond_log::log_warn!(
                                                "[WARNING] cannot read spending transaction of {}:{}",
                                                hash_to_hex(&txid),
                                                output
                                            );
                                            fork = Some(prev_hash);
                                        }
                                        Ok(spender) => {
                                            if !hooks.check_transaction(&spender) {
                                                argond_log::log_warn!(
                                                    "[WARNING] spending transaction of {}:{} is invalid",
                                                    hash_to_hex(&txid),
                                                    output
                                                );
                                                fork = Some(prev_hash);
                                            } else if !spender.vin.iter().any(|input| {
                                                input.prevout.hash == txid
                                                    && input.prevout.index == output as u32
                                            }) {
                                                argond_log::log_warn!(
                                                    "[WARNING] spending transaction of {}:{} does not spend it",
                                                    hash_to_hex(&txid),
                                                    output
                                                );
                                                fork = Some(prev_hash);
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }

                    // level 5: every prevout this transaction consumes must
                    // be marked spent
                    if level >= 5 {
                        for input in &tx.vin {
                            if input.prevout.is_null() {
                                continue;
                            }
                            if let Some(previndex) = db.read_tx_index(&input.prevout.hash)? {
                                let n = input.prevout.index as usize;
                                if previndex.spent.len() <= n || previndex.spent[n].is_null() {
                                    argond_log::log_warn!(
                                        "[WARNING] found unspent prevout {}:{} in {}",
                                        hash_to_hex(&input.prevout.hash),
                                        input.prevout.index,
                                        hash_to_hex(&txid)
                                    );
                                    fork = Some(prev_hash);
                                }
                            }
                        }
                    }
                }
            }

            cursor = Some(prev_hash);
        }
    }

    if let Some(fork_hash) = fork {
        if !shutdown.load(Ordering::Relaxed) {
            let fork_height = tree
                .get(&fork_hash)
                .map(|node| node.height)
                .unwrap_or_default();
            argond_log::log_warn!(
                "[WARNING] moving best chain pointer back to block {fork_height}"
            );
            if let Err(err) = hooks.set_best_chain(&fork_hash) {
                argond_log::log_error!("set_best_chain to height {fork_height} failed: {err}");
            } else {
                outcome.reorged_to = Some(fork_hash);
            }
        }
    }

    Ok(outcome)
}
