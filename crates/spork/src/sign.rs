//! Spork signing and verification capabilities.
//!
//! The message type stays plain data; key material lives here.

use std::fmt;
use std::sync::OnceLock;

use argond_consensus::Hash256;
use secp256k1::ecdsa::Signature;
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey, SignOnly, VerifyOnly};

static SECP256K1_VERIFY: OnceLock<Secp256k1<VerifyOnly>> = OnceLock::new();
static SECP256K1_SIGN: OnceLock<Secp256k1<SignOnly>> = OnceLock::new();

fn verify_context() -> &'static Secp256k1<VerifyOnly> {
    SECP256K1_VERIFY.get_or_init(Secp256k1::verification_only)
}

fn sign_context() -> &'static Secp256k1<SignOnly> {
    SECP256K1_SIGN.get_or_init(Secp256k1::signing_only)
}

#[derive(Debug, Eq, PartialEq)]
pub enum KeyError {
    InvalidHex,
    InvalidKey,
    KeyMismatch,
}

impl fmt::Display for KeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyError::InvalidHex => write!(f, "key is not valid hex"),
            KeyError::InvalidKey => write!(f, "key bytes are not a valid secp256k1 key"),
            KeyError::KeyMismatch => write!(f, "signing key does not match the master public key"),
        }
    }
}

impl std::error::Error for KeyError {}

/// Verifies detached spork signatures against one master public key.
#[derive(Clone, Debug)]
pub struct SporkVerifier {
    pubkey: PublicKey,
}

impl SporkVerifier {
    pub fn from_hex(hex_key: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_key).map_err(|_| KeyError::InvalidHex)?;
        let pubkey = PublicKey::from_slice(&bytes).map_err(|_| KeyError::InvalidKey)?;
        Ok(Self { pubkey })
    }

    pub fn from_public_key(pubkey: PublicKey) -> Self {
        Self { pubkey }
    }

    pub fn verify(&self, digest: &Hash256, signature: &[u8]) -> bool {
        let Ok(signature) = Signature::from_der(signature) else {
            return false;
        };
        let message = Message::from_digest(*digest);
        verify_context()
            .verify_ecdsa(&message, &signature, &self.pubkey)
            .is_ok()
    }
}

/// Holds the master private key; only its holder can mint sporks.
pub struct SporkSigner {
    secret: SecretKey,
}

impl SporkSigner {
    pub fn from_hex(hex_key: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_key).map_err(|_| KeyError::InvalidHex)?;
        let secret = SecretKey::from_slice(&bytes).map_err(|_| KeyError::InvalidKey)?;
        Ok(Self { secret })
    }

    pub fn public_key(&self) -> PublicKey {
        self.secret.public_key(sign_context())
    }

    pub fn sign(&self, digest: &Hash256) -> Vec<u8> {
        let message = Message::from_digest(*digest);
        sign_context()
            .sign_ecdsa(&message, &self.secret)
            .serialize_der()
            .to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_signer() -> SporkSigner {
        SporkSigner::from_hex(&"42".repeat(32)).expect("test key")
    }

    #[test]
    fn sign_verify_roundtrip() {
        let signer = test_signer();
        let verifier = SporkVerifier::from_public_key(signer.public_key());

        let digest = [0x5a; 32];
        let signature = signer.sign(&digest);
        assert!(verifier.verify(&digest, &signature));
        assert!(!verifier.verify(&[0x5b; 32], &signature));
        assert!(!verifier.verify(&digest, &[0u8; 70]));
    }

    #[test]
    fn rejects_bad_key_material() {
        assert_eq!(SporkVerifier::from_hex("zz").unwrap_err(), KeyError::InvalidHex);
        assert_eq!(
            SporkVerifier::from_hex("0011").unwrap_err(),
            KeyError::InvalidKey
        );
        // An all-zero scalar is not a valid secret key.
        assert!(matches!(
            SporkSigner::from_hex(&"00".repeat(32)),
            Err(KeyError::InvalidKey)
        ));
    }
}
