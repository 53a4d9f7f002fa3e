use argond_primitives::block::{Block, BlockHeader};
use argond_primitives::encoding::{decode, encode, DecodeError, Decoder, Encoder};
use argond_primitives::outpoint::OutPoint;
use argond_primitives::transaction::{Transaction, TxIn, TxOut};

fn sample_tx() -> Transaction {
    Transaction {
        version: 1,
        time: 1_393_221_600,
        vin: vec![TxIn {
            prevout: OutPoint {
                hash: [0x11; 32],
                index: 3,
            },
            script_sig: vec![0x51],
            sequence: u32::MAX,
        }],
        vout: vec![
            TxOut {
                value: 5_000_000,
                script_pubkey: vec![0x76, 0xa9],
            },
            TxOut {
                value: 0,
                script_pubkey: Vec::new(),
            },
        ],
        lock_time: 0,
    }
}

#[test]
fn varint_thresholds() {
    for (value, expected_len) in [
        (0u64, 1usize),
        (0xfc, 1),
        (0xfd, 3),
        (0xffff, 3),
        (0x1_0000, 5),
        (0x01ff_ffff, 5),
    ] {
        let mut encoder = Encoder::new();
        encoder.write_varint(value);
        let bytes = encoder.into_inner();
        assert_eq!(bytes.len(), expected_len, "varint({value})");

        let mut decoder = Decoder::new(&bytes);
        assert_eq!(decoder.read_varint(), Ok(value));
        assert!(decoder.is_empty());
    }
}

#[test]
fn varint_rejects_non_canonical() {
    // 0xfd prefix carrying a value that fits a single byte.
    let mut decoder = Decoder::new(&[0xfd, 0x10, 0x00]);
    assert_eq!(decoder.read_varint(), Err(DecodeError::NonCanonicalVarInt));

    let mut decoder = Decoder::new(&[0xfe, 0xff, 0xff, 0x00, 0x00]);
    assert_eq!(decoder.read_varint(), Err(DecodeError::NonCanonicalVarInt));
}

#[test]
fn varint_rejects_oversize() {
    let mut decoder = Decoder::new(&[0xfe, 0x01, 0x00, 0x00, 0x02]);
    assert_eq!(decoder.read_varint(), Err(DecodeError::SizeTooLarge));
}

#[test]
fn truncated_input_is_malformed() {
    let bytes = encode(&sample_tx());
    for cut in [0, 1, bytes.len() / 2, bytes.len() - 1] {
        assert!(decode::<Transaction>(&bytes[..cut]).is_err(), "cut {cut}");
    }
}

#[test]
fn trailing_bytes_rejected() {
    let mut bytes = encode(&sample_tx());
    bytes.push(0);
    assert_eq!(
        decode::<Transaction>(&bytes),
        Err(DecodeError::TrailingBytes)
    );
}

#[test]
fn transaction_roundtrip() {
    let tx = sample_tx();
    let decoded = decode::<Transaction>(&encode(&tx)).expect("decode");
    assert_eq!(decoded, tx);
    assert_eq!(decoded.txid(), tx.txid());
}

#[test]
fn var_str_roundtrip() {
    let mut encoder = Encoder::new();
    encoder.write_var_str("hashBestChain");
    let bytes = encoder.into_inner();
    assert_eq!(bytes[0] as usize, "hashBestChain".len());

    let mut decoder = Decoder::new(&bytes);
    assert_eq!(decoder.read_var_str().expect("str"), "hashBestChain");
}

#[test]
fn block_roundtrip_and_hash() {
    let coinbase = Transaction {
        version: 1,
        time: 1_393_221_600,
        vin: vec![TxIn {
            prevout: OutPoint::null(),
            script_sig: vec![0x04, 0xff, 0xff, 0x00, 0x1d],
            sequence: u32::MAX,
        }],
        vout: vec![TxOut {
            value: 0,
            script_pubkey: vec![0x51],
        }],
        lock_time: 0,
    };
    let block = Block {
        header: BlockHeader {
            version: 7,
            prev_block: [0xaa; 32],
            merkle_root: coinbase.txid(),
            time: 1_393_221_660,
            bits: 0x1e0f_ffff,
            nonce: 42,
        },
        vtx: vec![coinbase],
        signature: Vec::new(),
    };

    let decoded = decode::<Block>(&encode(&block)).expect("decode");
    assert_eq!(decoded, block);
    assert_eq!(decoded.hash(), block.header.hash());
    assert!(!decoded.is_proof_of_stake());
}

#[test]
fn coinstake_detection() {
    let mut tx = sample_tx();
    assert!(!tx.is_coinstake());

    tx.vout.insert(
        0,
        TxOut {
            value: 0,
            script_pubkey: Vec::new(),
        },
    );
    assert!(tx.is_coinstake());
    assert!(!tx.is_coinbase());
}
