//! Canonical key construction for the chain index keyspace.
//!
//! Every key starts with a compact-size-prefixed tag string, so records of
//! one kind are contiguous under the store's ascending iteration order.

use argond_consensus::Hash256;
use argond_primitives::encoding::{DecodeError, Decoder, Encoder};

pub const TAG_TX: &str = "tx";
pub const TAG_BLOCK_INDEX: &str = "blockindex";

pub const KEY_VERSION: &str = "version";
pub const KEY_BEST_CHAIN: &str = "hashBestChain";
pub const KEY_SYNC_CHECKPOINT: &str = "hashSyncCheckpoint";
pub const KEY_BEST_INVALID_TRUST: &str = "bnBestInvalidTrust";
pub const KEY_CHECKPOINT_PUBKEY: &str = "strCheckpointPubKey";

pub fn tagged_key(tag: &str, hash: &Hash256) -> Vec<u8> {
    let mut encoder = Encoder::with_capacity(tag.len() + 33);
    encoder.write_var_str(tag);
    encoder.write_hash(hash);
    encoder.into_inner()
}

pub fn singleton_key(name: &str) -> Vec<u8> {
    let mut encoder = Encoder::with_capacity(name.len() + 1);
    encoder.write_var_str(name);
    encoder.into_inner()
}

/// Split a stored key into its tag and payload bytes.
pub fn split_key(key: &[u8]) -> Result<(String, Vec<u8>), DecodeError> {
    let mut decoder = Decoder::new(key);
    let tag = decoder.read_var_str()?;
    let payload = decoder.read_bytes(decoder.remaining())?;
    Ok((tag, payload))
}
