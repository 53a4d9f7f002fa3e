//! Block header and block types.

use argond_consensus::Hash256;

use crate::encoding::{Decodable, DecodeError, Decoder, Encodable, Encoder};
use crate::hash::sha256d;
use crate::transaction::Transaction;

pub const CURRENT_BLOCK_VERSION: u32 = 7;

#[derive(Clone, Debug, PartialEq)]
pub struct BlockHeader {
    pub version: u32,
    pub prev_block: Hash256,
    pub merkle_root: Hash256,
    pub time: u32,
    pub bits: u32,
    pub nonce: u32,
}

impl BlockHeader {
    pub fn hash(&self) -> Hash256 {
        let mut encoder = Encoder::with_capacity(80);
        self.canonical_encode(&mut encoder);
        sha256d(&encoder.into_inner())
    }
}

impl Encodable for BlockHeader {
    fn canonical_encode(&self, encoder: &mut Encoder) {
        encoder.write_u32_le(self.version);
        encoder.write_hash(&self.prev_block);
        encoder.write_hash(&self.merkle_root);
        encoder.write_u32_le(self.time);
        encoder.write_u32_le(self.bits);
        encoder.write_u32_le(self.nonce);
    }
}

impl Decodable for BlockHeader {
    fn canonical_decode(decoder: &mut Decoder) -> Result<Self, DecodeError> {
        let version = decoder.read_u32_le()?;
        let prev_block = decoder.read_hash()?;
        let merkle_root = decoder.read_hash()?;
        let time = decoder.read_u32_le()?;
        let bits = decoder.read_u32_le()?;
        let nonce = decoder.read_u32_le()?;
        Ok(Self {
            version,
            prev_block,
            merkle_root,
            time,
            bits,
            nonce,
        })
    }
}

/// A full block. Proof-of-stake blocks carry a block signature over the
/// header made with the coinstake key; proof-of-work blocks leave it empty.
#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    pub header: BlockHeader,
    pub vtx: Vec<Transaction>,
    pub signature: Vec<u8>,
}

impl Block {
    pub fn hash(&self) -> Hash256 {
        self.header.hash()
    }

    pub fn is_proof_of_stake(&self) -> bool {
        self.vtx.len() > 1 && self.vtx[1].is_coinstake()
    }
}

impl Encodable for Block {
    fn canonical_encode(&self, encoder: &mut Encoder) {
        self.header.canonical_encode(encoder);
        encoder.write_varint(self.vtx.len() as u64);
        for tx in &self.vtx {
            tx.canonical_encode(encoder);
        }
        encoder.write_var_bytes(&self.signature);
    }
}

impl Decodable for Block {
    fn canonical_decode(decoder: &mut Decoder) -> Result<Self, DecodeError> {
        let header = BlockHeader::canonical_decode(decoder)?;
        let count = decoder.read_varint()?;
        let mut vtx = Vec::with_capacity(count.min(1024) as usize);
        for _ in 0..count {
            vtx.push(Transaction::canonical_decode(decoder)?);
        }
        let signature = decoder.read_var_bytes()?;
        Ok(Self {
            header,
            vtx,
            signature,
        })
    }
}
