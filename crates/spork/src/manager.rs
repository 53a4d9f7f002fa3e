//! Spork state and gossip policy.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use argond_consensus::{ChainParams, Hash256};
use argond_primitives::encoding::decode;

use crate::catalog::{self, SPORK_4_PAYMENT_ENFORCEMENT_DOS_VALUE, SPORK_9_PROTOCOL_V3_ENFORCEMENT};
use crate::message::SporkMessage;
use crate::sign::{KeyError, SporkSigner, SporkVerifier};

pub const COMMAND_SPORK: &str = "spork";
pub const COMMAND_GET_SPORKS: &str = "getsporks";

pub type PeerId = u64;

/// Peer-facing side effects the manager needs from the network layer.
pub trait PeerTransport {
    fn is_initial_block_download(&self) -> bool;
    fn relay_spork(&self, msg: &SporkMessage);
    fn send_spork(&self, peer: PeerId, msg: &SporkMessage);
    fn misbehaving(&self, peer: PeerId, weight: i64);
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SporkError {
    Malformed,
    ReplayOrStale,
    SignatureInvalid,
    NotSigner,
}

impl fmt::Display for SporkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SporkError::Malformed => write!(f, "malformed spork payload"),
            SporkError::ReplayOrStale => write!(f, "spork is a replay or not strictly newer"),
            SporkError::SignatureInvalid => write!(f, "spork signature verification failed"),
            SporkError::NotSigner => write!(f, "no spork signing key configured"),
        }
    }
}

impl std::error::Error for SporkError {}

#[derive(Default)]
struct SporkState {
    /// Every accepted message keyed by content hash, for relay dedup.
    by_hash: HashMap<Hash256, SporkMessage>,
    /// Latest accepted message per spork id.
    active: HashMap<i32, SporkMessage>,
}

enum Verdict {
    Accepted,
    BadSignature { weight: i64 },
}

/// Holds the live spork values and enforces the gossip acceptance policy.
///
/// Lock order: callers holding the block-tree lock may consult sporks, so
/// the internal state lock is always innermost and no spork call takes the
/// tree lock.
pub struct SporkManager {
    verifier: SporkVerifier,
    signer: Mutex<Option<SporkSigner>>,
    state: Mutex<SporkState>,
}

impl SporkManager {
    /// Build a manager for the given network. The master key pair is chosen
    /// once: if protocol-v3 enforcement has already activated by its
    /// compiled-in schedule, the v3 key is in force; the choice is not
    /// re-evaluated when sporks arrive.
    pub fn new(params: &ChainParams) -> Result<Self, KeyError> {
        let v3_active = catalog::default_value(SPORK_9_PROTOCOL_V3_ENFORCEMENT)
            .map(|activation| activation < unix_time())
            .unwrap_or(false);
        let key = if v3_active {
            params.spork_keys.v3
        } else {
            params.spork_keys.legacy
        };
        Ok(Self::with_verifier(SporkVerifier::from_hex(key)?))
    }

    pub fn with_verifier(verifier: SporkVerifier) -> Self {
        Self {
            verifier,
            signer: Mutex::new(None),
            state: Mutex::new(SporkState::default()),
        }
    }

    /// Install the master private key after proving it matches the
    /// configured public key by test-signing.
    pub fn set_signing_key(&self, hex_secret: &str) -> Result<(), KeyError> {
        let signer = SporkSigner::from_hex(hex_secret)?;
        let probe = SporkMessage::new(0, 0, 0).hash();
        if !self.verifier.verify(&probe, &signer.sign(&probe)) {
            return Err(KeyError::KeyMismatch);
        }
        *self.signer.lock().expect("signer lock") = Some(signer);
        argond_log::log_info!("initialized as spork signer");
        Ok(())
    }

    /// Handle a spork-related peer message.
    pub fn process_message(
        &self,
        peer: PeerId,
        command: &str,
        payload: &[u8],
        net: &dyn PeerTransport,
    ) -> Result<(), SporkError> {
        match command {
            COMMAND_SPORK => {
                let msg =
                    decode::<SporkMessage>(payload).map_err(|_| SporkError::Malformed)?;
                self.submit(Some(peer), msg, net)
            }
            COMMAND_GET_SPORKS => {
                self.flush_to_peer(peer, net);
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Administrative set: sign a fresh message and push it through the
    /// same acceptance path as gossip, so validation and relay behave
    /// identically.
    pub fn update_spork(
        &self,
        spork_id: i32,
        value: i64,
        net: &dyn PeerTransport,
    ) -> Result<(), SporkError> {
        let mut msg = SporkMessage::new(spork_id, value, unix_time());
        {
            let guard = self.signer.lock().expect("signer lock");
            let signer = guard.as_ref().ok_or(SporkError::NotSigner)?;
            msg.signature = signer.sign(&msg.hash());
        }
        self.submit(None, msg, net)
    }

    fn submit(
        &self,
        peer: Option<PeerId>,
        msg: SporkMessage,
        net: &dyn PeerTransport,
    ) -> Result<(), SporkError> {
        if net.is_initial_block_download() {
            return Ok(());
        }
        if catalog::name(msg.spork_id).is_none() {
            // Unknown or deleted id: not an offense, just noise.
            argond_log::log_debug!("ignoring unknown spork id {}", msg.spork_id);
            return Ok(());
        }

        let hash = msg.hash();
        let verdict = {
            let mut state = self.state.lock().expect("spork lock");
            if state.by_hash.contains_key(&hash) {
                return Err(SporkError::ReplayOrStale);
            }
            if let Some(existing) = state.active.get(&msg.spork_id) {
                // Strictly newer only; an equal timestamp cannot impose an
                // order between two values.
                if existing.time_signed >= msg.time_signed {
                    return Err(SporkError::ReplayOrStale);
                }
            }

            if self.verifier.verify(&hash, &msg.signature) {
                state.by_hash.insert(hash, msg.clone());
                state.active.insert(msg.spork_id, msg.clone());
                Verdict::Accepted
            } else {
                let weight = state
                    .active
                    .get(&SPORK_4_PAYMENT_ENFORCEMENT_DOS_VALUE)
                    .map(|spork| spork.value)
                    .or_else(|| catalog::default_value(SPORK_4_PAYMENT_ENFORCEMENT_DOS_VALUE))
                    .unwrap_or(0);
                Verdict::BadSignature { weight }
            }
        };

        match verdict {
            Verdict::Accepted => {
                argond_log::log_info!(
                    "accepted spork {} value={} signed={}",
                    msg.spork_id,
                    msg.value,
                    msg.time_signed
                );
                self.execute_spork(msg.spork_id, msg.value);
                net.relay_spork(&msg);
                Ok(())
            }
            Verdict::BadSignature { weight } => {
                argond_log::log_warn!("spork {} has an invalid signature", msg.spork_id);
                if let Some(peer) = peer {
                    net.misbehaving(peer, weight);
                }
                Err(SporkError::SignatureInvalid)
            }
        }
    }

    /// Hook for sporks with an immediate side effect on acceptance; none of
    /// the current catalog needs one.
    fn execute_spork(&self, _spork_id: i32, _value: i64) {}

    fn flush_to_peer(&self, peer: PeerId, net: &dyn PeerTransport) {
        let mut sporks: Vec<SporkMessage> = {
            let state = self.state.lock().expect("spork lock");
            state.active.values().cloned().collect()
        };
        sporks.sort_by_key(|msg| msg.spork_id);
        for msg in sporks {
            net.send_spork(peer, &msg);
        }
    }

    /// Live value for a spork id, falling back to the compiled-in default.
    pub fn get_spork_value(&self, spork_id: i32) -> Option<i64> {
        let state = self.state.lock().expect("spork lock");
        state
            .active
            .get(&spork_id)
            .map(|msg| msg.value)
            .or_else(|| catalog::default_value(spork_id))
    }

    /// Enforcement sporks carry an activation timestamp: active once it has
    /// passed. Unknown ids are never active.
    pub fn is_spork_active(&self, spork_id: i32) -> bool {
        self.get_spork_value(spork_id)
            .map(|value| value < unix_time())
            .unwrap_or(false)
    }

    /// Whether a message with this content hash has been accepted.
    pub fn seen(&self, hash: &Hash256) -> bool {
        self.state
            .lock()
            .expect("spork lock")
            .by_hash
            .contains_key(hash)
    }

    /// Snapshot of the active set, ascending by id.
    pub fn active_sporks(&self) -> Vec<SporkMessage> {
        let mut sporks: Vec<SporkMessage> = {
            let state = self.state.lock().expect("spork lock");
            state.active.values().cloned().collect()
        };
        sporks.sort_by_key(|msg| msg.spork_id);
        sporks
    }
}

fn unix_time() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() as i64)
        .unwrap_or_default()
}
