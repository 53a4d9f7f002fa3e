//! The spork wire message.

use argond_consensus::Hash256;
use argond_primitives::encoding::{Decodable, DecodeError, Decoder, Encodable, Encoder};
use argond_primitives::hash::sha256d;

/// A signed governance flag. The signature is detached: it covers the
/// content hash of the three value fields, not the wire bytes.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SporkMessage {
    pub spork_id: i32,
    pub value: i64,
    pub time_signed: i64,
    pub signature: Vec<u8>,
}

impl SporkMessage {
    pub fn new(spork_id: i32, value: i64, time_signed: i64) -> Self {
        Self {
            spork_id,
            value,
            time_signed,
            signature: Vec::new(),
        }
    }

    /// Content hash: SHA-256d over the canonical bytes of
    /// `(spork_id, value, time_signed)` in field order.
    pub fn hash(&self) -> Hash256 {
        let mut encoder = Encoder::with_capacity(20);
        encoder.write_i32_le(self.spork_id);
        encoder.write_i64_le(self.value);
        encoder.write_i64_le(self.time_signed);
        sha256d(&encoder.into_inner())
    }
}

impl Encodable for SporkMessage {
    fn canonical_encode(&self, encoder: &mut Encoder) {
        encoder.write_i32_le(self.spork_id);
        encoder.write_i64_le(self.value);
        encoder.write_i64_le(self.time_signed);
        encoder.write_var_bytes(&self.signature);
    }
}

impl Decodable for SporkMessage {
    fn canonical_decode(decoder: &mut Decoder) -> Result<Self, DecodeError> {
        let spork_id = decoder.read_i32_le()?;
        let value = decoder.read_i64_le()?;
        let time_signed = decoder.read_i64_le()?;
        let signature = decoder.read_var_bytes()?;
        Ok(Self {
            spork_id,
            value,
            time_signed,
            signature,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argond_primitives::encoding::{decode, encode};

    #[test]
    fn wire_roundtrip() {
        let mut msg = SporkMessage::new(10008, 1_544_940_000, 1_560_000_000);
        msg.signature = vec![0x30, 0x44, 0x02, 0x20];
        let decoded = decode::<SporkMessage>(&encode(&msg)).expect("decode");
        assert_eq!(decoded, msg);
    }

    #[test]
    fn hash_ignores_signature() {
        let mut a = SporkMessage::new(10001, 5, 100);
        let mut b = a.clone();
        a.signature = vec![1, 2, 3];
        b.signature = vec![4, 5, 6];
        assert_eq!(a.hash(), b.hash());

        let c = SporkMessage::new(10001, 5, 101);
        assert_ne!(a.hash(), c.hash());
    }
}
