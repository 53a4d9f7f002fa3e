//! Transaction position records.

use argond_primitives::encoding::{Decodable, DecodeError, Decoder, Encodable, Encoder};
use argond_primitives::transaction::Transaction;

/// Where a transaction lives on disk: block file id, byte offset of the
/// containing block, and the transaction's offset within that block.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct DiskTxPos {
    pub file: u32,
    pub block_pos: u32,
    pub tx_pos: u32,
}

impl DiskTxPos {
    pub fn new(file: u32, block_pos: u32, tx_pos: u32) -> Self {
        Self {
            file,
            block_pos,
            tx_pos,
        }
    }

    /// Sentinel for "unspent": an impossible file id.
    pub fn null() -> Self {
        Self {
            file: u32::MAX,
            block_pos: u32::MAX,
            tx_pos: u32::MAX,
        }
    }

    pub fn is_null(&self) -> bool {
        self.file == u32::MAX
    }
}

impl Encodable for DiskTxPos {
    fn canonical_encode(&self, encoder: &mut Encoder) {
        encoder.write_u32_le(self.file);
        encoder.write_u32_le(self.block_pos);
        encoder.write_u32_le(self.tx_pos);
    }
}

impl Decodable for DiskTxPos {
    fn canonical_decode(decoder: &mut Decoder) -> Result<Self, DecodeError> {
        let file = decoder.read_u32_le()?;
        let block_pos = decoder.read_u32_le()?;
        let tx_pos = decoder.read_u32_le()?;
        Ok(Self {
            file,
            block_pos,
            tx_pos,
        })
    }
}

/// Disk position of a transaction plus one spend slot per output. A null
/// slot means the output is unspent; `spent.len()` always equals the
/// transaction's output count at insertion time.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TxIndex {
    pub pos: DiskTxPos,
    pub spent: Vec<DiskTxPos>,
}

impl TxIndex {
    pub fn new(pos: DiskTxPos, tx: &Transaction) -> Self {
        Self {
            pos,
            spent: vec![DiskTxPos::null(); tx.vout.len()],
        }
    }

    pub fn is_output_spent(&self, output: u32) -> bool {
        self.spent
            .get(output as usize)
            .map(|pos| !pos.is_null())
            .unwrap_or(false)
    }
}

impl Encodable for TxIndex {
    fn canonical_encode(&self, encoder: &mut Encoder) {
        self.pos.canonical_encode(encoder);
        encoder.write_varint(self.spent.len() as u64);
        for pos in &self.spent {
            pos.canonical_encode(encoder);
        }
    }
}

impl Decodable for TxIndex {
    fn canonical_decode(decoder: &mut Decoder) -> Result<Self, DecodeError> {
        let pos = DiskTxPos::canonical_decode(decoder)?;
        let count = decoder.read_varint()?;
        let mut spent = Vec::with_capacity(count.min(1024) as usize);
        for _ in 0..count {
            spent.push(DiskTxPos::canonical_decode(decoder)?);
        }
        Ok(Self { pos, spent })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argond_primitives::encoding::{decode, encode};
    use argond_primitives::outpoint::OutPoint;
    use argond_primitives::transaction::{TxIn, TxOut};

    fn tx_with_outputs(count: usize) -> Transaction {
        Transaction {
            version: 1,
            time: 0,
            vin: vec![TxIn {
                prevout: OutPoint::null(),
                script_sig: Vec::new(),
                sequence: u32::MAX,
            }],
            vout: (0..count)
                .map(|i| TxOut {
                    value: i as i64,
                    script_pubkey: Vec::new(),
                })
                .collect(),
            lock_time: 0,
        }
    }

    #[test]
    fn spent_vector_matches_output_count() {
        for outputs in [0usize, 1, 3, 17] {
            let tx = tx_with_outputs(outputs);
            let txindex = TxIndex::new(DiskTxPos::new(1, 2, 3), &tx);
            assert_eq!(txindex.spent.len(), tx.vout.len());
            assert!(txindex.spent.iter().all(DiskTxPos::is_null));
        }
    }

    #[test]
    fn roundtrip() {
        let mut txindex = TxIndex::new(DiskTxPos::new(2, 4096, 81), &tx_with_outputs(3));
        txindex.spent[1] = DiskTxPos::new(2, 8192, 405);

        let decoded = decode::<TxIndex>(&encode(&txindex)).expect("decode");
        assert_eq!(decoded, txindex);
        assert!(!decoded.is_output_spent(0));
        assert!(decoded.is_output_spent(1));
        assert!(!decoded.is_output_spent(9));
    }

    #[test]
    fn null_sentinel() {
        let null = DiskTxPos::null();
        assert!(null.is_null());
        assert!(!DiskTxPos::new(0, 0, 0).is_null());

        let decoded = decode::<DiskTxPos>(&encode(&null)).expect("decode");
        assert!(decoded.is_null());
    }
}
