//! Chain parameter definitions.

use crate::Hash256;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Network {
    Mainnet,
    Testnet,
    Regtest,
}

/// Spork master public keys compiled in per network. The second key pair
/// takes over once protocol-v3 enforcement is signalled.
#[derive(Clone, Copy, Debug)]
pub struct SporkKeys {
    pub legacy: &'static str,
    pub v3: &'static str,
}

#[derive(Clone, Debug)]
pub struct ChainParams {
    pub network: Network,
    pub hash_genesis_block: Hash256,
    pub message_start: [u8; 4],
    pub default_port: u16,
    pub spork_keys: SporkKeys,
}

const MAINNET_SPORK_KEY_LEGACY: &str = "04cc53cdd3e788d3ea9ca63468b9f2bcc2838af920d8e72985739e8ac4159d518d1a1597da13b1854d8331def51778aa6a01951cef7763fa4300341f34431bad49";
const MAINNET_SPORK_KEY_V3: &str = "042b98d4150746cc5ee1b5a991244f8a2b155630efbfa490fee76202912ed2d6e9b6e5c62d424b9f5878ee7aff68e9aa84d10821a33e99de27fed2d77f57247954";
const TESTNET_SPORK_KEY_LEGACY: &str = "042e0e340b40681eefb7c67b7cbe968e3ab47f4a393e3626e13309cfdc5a1c5d5b9537cd3ceba3b5b1656d2949355cada0f5ee74c4edccbef84bf80151ef3b0c0a";

const MAINNET_GENESIS: &str = "00000f639db5734b2b861ef8dbccc33aa46bf23bed72c219cca9f5dcb6e4d239";
const TESTNET_GENESIS: &str = "0000724595fb3b9609d441cbfb9577615c292abf07d996d3edabc48de843642d";
const REGTEST_GENESIS: &str = "3d2160a3b5dc4a9d62e7e66a295f70313ac808440ef7400d6c0772171ce973a5";

pub fn chain_params(network: Network) -> ChainParams {
    match network {
        Network::Mainnet => ChainParams {
            network,
            hash_genesis_block: hash256_from_hex(MAINNET_GENESIS).expect("genesis hex"),
            message_start: [0xa3, 0xd2, 0x7a, 0x03],
            default_port: 39320,
            spork_keys: SporkKeys {
                legacy: MAINNET_SPORK_KEY_LEGACY,
                v3: MAINNET_SPORK_KEY_V3,
            },
        },
        Network::Testnet => ChainParams {
            network,
            hash_genesis_block: hash256_from_hex(TESTNET_GENESIS).expect("genesis hex"),
            message_start: [0x1b, 0x32, 0x4c, 0xd1],
            default_port: 39321,
            spork_keys: SporkKeys {
                legacy: TESTNET_SPORK_KEY_LEGACY,
                v3: MAINNET_SPORK_KEY_V3,
            },
        },
        Network::Regtest => ChainParams {
            network,
            hash_genesis_block: hash256_from_hex(REGTEST_GENESIS).expect("genesis hex"),
            message_start: [0xfa, 0xbf, 0xb5, 0xda],
            default_port: 39322,
            spork_keys: SporkKeys {
                legacy: TESTNET_SPORK_KEY_LEGACY,
                v3: MAINNET_SPORK_KEY_V3,
            },
        },
    }
}

/// Parse a 64-digit hex block hash (display order) into internal byte order.
pub fn hash256_from_hex(input: &str) -> Option<Hash256> {
    let hex = input.trim();
    let hex = hex.strip_prefix("0x").unwrap_or(hex);
    if hex.len() != 64 {
        return None;
    }

    let mut bytes = [0u8; 32];
    for (i, out) in bytes.iter_mut().enumerate() {
        let hi = hex_digit(hex.as_bytes()[2 * i])?;
        let lo = hex_digit(hex.as_bytes()[2 * i + 1])?;
        *out = (hi << 4) | lo;
    }
    bytes.reverse();
    Some(bytes)
}

fn hex_digit(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genesis_hashes_parse() {
        for network in [Network::Mainnet, Network::Testnet, Network::Regtest] {
            let params = chain_params(network);
            assert_ne!(params.hash_genesis_block, [0u8; 32]);
        }
    }

    #[test]
    fn hex_parse_rejects_bad_input() {
        assert!(hash256_from_hex("").is_none());
        assert!(hash256_from_hex("zz").is_none());
        assert!(hash256_from_hex(&"0".repeat(63)).is_none());
    }

    #[test]
    fn hex_parse_reverses_to_internal_order() {
        let hash = hash256_from_hex(
            "0100000000000000000000000000000000000000000000000000000000000000",
        )
        .expect("parse");
        assert_eq!(hash[31], 0x01);
        assert_eq!(hash[0], 0x00);
    }
}
