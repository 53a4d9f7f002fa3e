//! Block index records: the on-disk form and the in-memory tree.

use std::collections::HashMap;

use argond_consensus::{block_trust, Hash256, ZERO_HASH};
use argond_primitives::block::BlockHeader;
use argond_primitives::encoding::{Decodable, DecodeError, Decoder, Encodable, Encoder};
use argond_primitives::outpoint::OutPoint;
use primitive_types::U256;

pub const BLOCK_PROOF_OF_STAKE: u32 = 1 << 0;
pub const BLOCK_STAKE_ENTROPY: u32 = 1 << 1;
pub const BLOCK_STAKE_MODIFIER: u32 = 1 << 2;

/// Persistent form of a block index entry. Linkage is by hash; the embedded
/// header fields make the record self-identifying via `block_hash`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DiskBlockIndex {
    pub next_hash: Hash256,
    pub file: u32,
    pub block_pos: u32,
    pub height: u32,
    pub mint: i64,
    pub money_supply: i64,
    pub flags: u32,
    pub stake_modifier: u64,
    pub prevout_stake: OutPoint,
    pub stake_time: u32,
    pub hash_proof: Hash256,
    pub version: u32,
    pub prev_hash: Hash256,
    pub merkle_root: Hash256,
    pub time: u32,
    pub bits: u32,
    pub nonce: u32,
}

impl DiskBlockIndex {
    pub fn is_proof_of_stake(&self) -> bool {
        self.flags & BLOCK_PROOF_OF_STAKE != 0
    }

    /// Recompute the block hash from the embedded header fields.
    pub fn block_hash(&self) -> Hash256 {
        BlockHeader {
            version: self.version,
            prev_block: self.prev_hash,
            merkle_root: self.merkle_root,
            time: self.time,
            bits: self.bits,
            nonce: self.nonce,
        }
        .hash()
    }
}

impl Encodable for DiskBlockIndex {
    fn canonical_encode(&self, encoder: &mut Encoder) {
        encoder.write_hash(&self.next_hash);
        encoder.write_u32_le(self.file);
        encoder.write_u32_le(self.block_pos);
        encoder.write_u32_le(self.height);
        encoder.write_i64_le(self.mint);
        encoder.write_i64_le(self.money_supply);
        encoder.write_u32_le(self.flags);
        encoder.write_u64_le(self.stake_modifier);
        self.prevout_stake.canonical_encode(encoder);
        encoder.write_u32_le(self.stake_time);
        encoder.write_hash(&self.hash_proof);
        // header fields last, so block_hash can be rebuilt from the record
        encoder.write_u32_le(self.version);
        encoder.write_hash(&self.prev_hash);
        encoder.write_hash(&self.merkle_root);
        encoder.write_u32_le(self.time);
        encoder.write_u32_le(self.bits);
        encoder.write_u32_le(self.nonce);
    }
}

impl Decodable for DiskBlockIndex {
    fn canonical_decode(decoder: &mut Decoder) -> Result<Self, DecodeError> {
        let next_hash = decoder.read_hash()?;
        let file = decoder.read_u32_le()?;
        let block_pos = decoder.read_u32_le()?;
        let height = decoder.read_u32_le()?;
        let mint = decoder.read_i64_le()?;
        let money_supply = decoder.read_i64_le()?;
        let flags = decoder.read_u32_le()?;
        let stake_modifier = decoder.read_u64_le()?;
        let prevout_stake = OutPoint::canonical_decode(decoder)?;
        let stake_time = decoder.read_u32_le()?;
        let hash_proof = decoder.read_hash()?;
        let version = decoder.read_u32_le()?;
        let prev_hash = decoder.read_hash()?;
        let merkle_root = decoder.read_hash()?;
        let time = decoder.read_u32_le()?;
        let bits = decoder.read_u32_le()?;
        let nonce = decoder.read_u32_le()?;
        Ok(Self {
            next_hash,
            file,
            block_pos,
            height,
            mint,
            money_supply,
            flags,
            stake_modifier,
            prevout_stake,
            stake_time,
            hash_proof,
            version,
            prev_hash,
            merkle_root,
            time,
            bits,
            nonce,
        })
    }
}

/// In-memory block index node. `prev`/`next` are hashes resolved through the
/// owning [`BlockTree`]; the tree never stores back-pointers.
#[derive(Clone, Debug)]
pub struct BlockIndexEntry {
    pub hash: Hash256,
    pub prev: Option<Hash256>,
    pub next: Option<Hash256>,
    pub file: u32,
    pub block_pos: u32,
    pub height: u32,
    pub mint: i64,
    pub money_supply: i64,
    pub flags: u32,
    pub stake_modifier: u64,
    pub stake_modifier_checksum: u32,
    pub prevout_stake: OutPoint,
    pub stake_time: u32,
    pub hash_proof: Hash256,
    pub version: u32,
    pub merkle_root: Hash256,
    pub time: u32,
    pub bits: u32,
    pub nonce: u32,
    pub chain_trust: U256,
}

impl BlockIndexEntry {
    fn placeholder(hash: Hash256) -> Self {
        Self {
            hash,
            prev: None,
            next: None,
            file: 0,
            block_pos: 0,
            height: 0,
            mint: 0,
            money_supply: 0,
            flags: 0,
            stake_modifier: 0,
            stake_modifier_checksum: 0,
            prevout_stake: OutPoint::null(),
            stake_time: 0,
            hash_proof: ZERO_HASH,
            version: 0,
            merkle_root: ZERO_HASH,
            time: 0,
            bits: 0,
            nonce: 0,
            chain_trust: U256::zero(),
        }
    }

    pub fn is_proof_of_stake(&self) -> bool {
        self.flags & BLOCK_PROOF_OF_STAKE != 0
    }

    pub fn block_trust(&self) -> U256 {
        block_trust(self.bits)
    }

    /// Persistent form of this node, with pointer links widened back to
    /// explicit hashes.
    pub fn to_disk(&self) -> DiskBlockIndex {
        DiskBlockIndex {
            next_hash: self.next.unwrap_or(ZERO_HASH),
            file: self.file,
            block_pos: self.block_pos,
            height: self.height,
            mint: self.mint,
            money_supply: self.money_supply,
            flags: self.flags,
            stake_modifier: self.stake_modifier,
            prevout_stake: self.prevout_stake.clone(),
            stake_time: self.stake_time,
            hash_proof: self.hash_proof,
            version: self.version,
            prev_hash: self.prev.unwrap_or(ZERO_HASH),
            merkle_root: self.merkle_root,
            time: self.time,
            bits: self.bits,
            nonce: self.nonce,
        }
    }
}

/// Hash-keyed owning map of block index nodes. Nodes are created during the
/// load pass or on block connection and live until process exit.
#[derive(Default)]
pub struct BlockTree {
    nodes: HashMap<Hash256, BlockIndexEntry>,
}

impl BlockTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, hash: &Hash256) -> bool {
        self.nodes.contains_key(hash)
    }

    pub fn get(&self, hash: &Hash256) -> Option<&BlockIndexEntry> {
        self.nodes.get(hash)
    }

    pub fn get_mut(&mut self, hash: &Hash256) -> Option<&mut BlockIndexEntry> {
        self.nodes.get_mut(hash)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BlockIndexEntry> {
        self.nodes.values()
    }

    /// Insert-or-get: make sure a node exists for `hash`, lazily creating a
    /// placeholder that a later record will populate. The zero hash is the
    /// "absent" sentinel and resolves to `None`.
    pub fn insert_or_get(&mut self, hash: &Hash256) -> Option<Hash256> {
        if *hash == ZERO_HASH {
            return None;
        }
        self.nodes
            .entry(*hash)
            .or_insert_with(|| BlockIndexEntry::placeholder(*hash));
        Some(*hash)
    }

    /// Materialize a disk record into the tree, resolving its hash links.
    /// Returns the block hash of the populated node.
    pub fn apply_disk(&mut self, disk: &DiskBlockIndex) -> Hash256 {
        let hash = disk.block_hash();
        self.insert_or_get(&hash);
        let prev = self.insert_or_get(&disk.prev_hash);
        let next = self.insert_or_get(&disk.next_hash);

        let node = self.nodes.get_mut(&hash).expect("node just inserted");
        node.prev = prev;
        node.next = next;
        node.file = disk.file;
        node.block_pos = disk.block_pos;
        node.height = disk.height;
        node.mint = disk.mint;
        node.money_supply = disk.money_supply;
        node.flags = disk.flags;
        node.stake_modifier = disk.stake_modifier;
        node.prevout_stake = disk.prevout_stake.clone();
        node.stake_time = disk.stake_time;
        node.hash_proof = disk.hash_proof;
        node.version = disk.version;
        node.merkle_root = disk.merkle_root;
        node.time = disk.time;
        node.bits = disk.bits;
        node.nonce = disk.nonce;
        hash
    }

    /// All node hashes, ascending by height with ties broken by hash so the
    /// trust pass is deterministic.
    pub fn hashes_by_height(&self) -> Vec<Hash256> {
        let mut hashes: Vec<Hash256> = self.nodes.keys().copied().collect();
        hashes.sort_by(|a, b| {
            let height_a = self.nodes[a].height;
            let height_b = self.nodes[b].height;
            height_a.cmp(&height_b).then_with(|| a.cmp(b))
        });
        hashes
    }
}
