use std::cell::RefCell;

use argond_primitives::encoding::encode;
use argond_spork::catalog::{
    SPORK_1_MASTERNODE_PAYMENTS_ENFORCEMENT, SPORK_2_MASTERNODE_WINNER_ENFORCEMENT,
    SPORK_8_PROTOCOL_V210_ENFORCEMENT, SPORK_10_V3_DEV_PAYMENTS_ENFORCEMENT,
};
use argond_spork::{
    PeerId, PeerTransport, SporkError, SporkManager, SporkMessage, SporkSigner, SporkVerifier,
    COMMAND_GET_SPORKS, COMMAND_SPORK,
};

const PEER: PeerId = 7;
const T0: i64 = 1_600_000_000;

#[derive(Default)]
struct MockNet {
    initial_download: bool,
    relayed: RefCell<Vec<SporkMessage>>,
    sent: RefCell<Vec<(PeerId, SporkMessage)>>,
    misbehaving: RefCell<Vec<(PeerId, i64)>>,
}

impl PeerTransport for MockNet {
    fn is_initial_block_download(&self) -> bool {
        self.initial_download
    }

    fn relay_spork(&self, msg: &SporkMessage) {
        self.relayed.borrow_mut().push(msg.clone());
    }

    fn send_spork(&self, peer: PeerId, msg: &SporkMessage) {
        self.sent.borrow_mut().push((peer, msg.clone()));
    }

    fn misbehaving(&self, peer: PeerId, weight: i64) {
        self.misbehaving.borrow_mut().push((peer, weight));
    }
}

fn test_rig() -> (SporkManager, SporkSigner) {
    let signer = SporkSigner::from_hex(&"42".repeat(32)).expect("test key");
    let manager = SporkManager::with_verifier(SporkVerifier::from_public_key(signer.public_key()));
    (manager, signer)
}

fn signed(signer: &SporkSigner, spork_id: i32, value: i64, time_signed: i64) -> SporkMessage {
    let mut msg = SporkMessage::new(spork_id, value, time_signed);
    msg.signature = signer.sign(&msg.hash());
    msg
}

fn submit(manager: &SporkManager, net: &MockNet, msg: &SporkMessage) -> Result<(), SporkError> {
    manager.process_message(PEER, COMMAND_SPORK, &encode(msg), net)
}

#[test]
fn accepted_spork_is_stored_and_relayed() {
    let (manager, signer) = test_rig();
    let net = MockNet::default();

    let msg = signed(&signer, SPORK_8_PROTOCOL_V210_ENFORCEMENT, 99, T0);
    submit(&manager, &net, &msg).expect("accept");

    assert_eq!(
        manager.get_spork_value(SPORK_8_PROTOCOL_V210_ENFORCEMENT),
        Some(99)
    );
    assert!(manager.seen(&msg.hash()));
    assert_eq!(net.relayed.borrow().len(), 1);
    assert!(net.misbehaving.borrow().is_empty());
}

#[test]
fn equal_timestamp_is_rejected() {
    let (manager, signer) = test_rig();
    let net = MockNet::default();

    let first = signed(&signer, SPORK_8_PROTOCOL_V210_ENFORCEMENT, 1111, T0);
    submit(&manager, &net, &first).expect("accept");

    // Same id and timestamp but a different value; without strictness two
    // peers could disagree about which one won.
    let second = signed(&signer, SPORK_8_PROTOCOL_V210_ENFORCEMENT, 2222, T0);
    assert_eq!(
        submit(&manager, &net, &second),
        Err(SporkError::ReplayOrStale)
    );

    assert_eq!(
        manager.get_spork_value(SPORK_8_PROTOCOL_V210_ENFORCEMENT),
        Some(1111)
    );
    assert_eq!(net.relayed.borrow().len(), 1);
}

#[test]
fn accepted_timestamps_are_strictly_increasing() {
    let (manager, signer) = test_rig();
    let net = MockNet::default();
    let id = SPORK_1_MASTERNODE_PAYMENTS_ENFORCEMENT;

    let mut accepted = Vec::new();
    for (value, offset) in [(1i64, 0i64), (2, 5), (3, 3), (4, 5), (5, 6)] {
        if submit(&manager, &net, &signed(&signer, id, value, T0 + offset)).is_ok() {
            accepted.push(T0 + offset);
        }
    }

    assert_eq!(accepted, vec![T0, T0 + 5, T0 + 6]);
    assert_eq!(manager.get_spork_value(id), Some(5));
    assert!(accepted.windows(2).all(|pair| pair[0] < pair[1]));
}

#[test]
fn duplicate_content_hash_is_dropped() {
    let (manager, signer) = test_rig();
    let net = MockNet::default();

    let msg = signed(&signer, SPORK_8_PROTOCOL_V210_ENFORCEMENT, 1, T0);
    submit(&manager, &net, &msg).expect("accept");
    assert_eq!(submit(&manager, &net, &msg), Err(SporkError::ReplayOrStale));
    assert_eq!(net.relayed.borrow().len(), 1);
}

#[test]
fn bad_signature_draws_default_misbehavior_weight() {
    let (manager, signer) = test_rig();
    let net = MockNet::default();

    submit(
        &manager,
        &net,
        &signed(&signer, SPORK_8_PROTOCOL_V210_ENFORCEMENT, 1, T0),
    )
    .expect("accept");

    // Newer timestamp, stale signature: fails verification.
    let mut tampered = signed(&signer, SPORK_8_PROTOCOL_V210_ENFORCEMENT, 1, T0);
    tampered.time_signed = T0 + 60;
    assert_eq!(
        submit(&manager, &net, &tampered),
        Err(SporkError::SignatureInvalid)
    );

    // Weight comes from the live value of spork 10004 (default 10).
    assert_eq!(*net.misbehaving.borrow(), vec![(PEER, 10)]);
    assert_eq!(
        manager.get_spork_value(SPORK_8_PROTOCOL_V210_ENFORCEMENT),
        Some(1)
    );
    assert_eq!(net.relayed.borrow().len(), 1);
}

#[test]
fn malformed_payload_is_rejected() {
    let (manager, _signer) = test_rig();
    let net = MockNet::default();
    assert_eq!(
        manager.process_message(PEER, COMMAND_SPORK, &[0x01, 0x02], &net),
        Err(SporkError::Malformed)
    );
}

#[test]
fn initial_block_download_drops_silently() {
    let (manager, signer) = test_rig();
    let net = MockNet {
        initial_download: true,
        ..MockNet::default()
    };

    let msg = signed(&signer, SPORK_8_PROTOCOL_V210_ENFORCEMENT, 1, T0);
    submit(&manager, &net, &msg).expect("silent drop");

    assert!(!manager.seen(&msg.hash()));
    assert!(net.relayed.borrow().is_empty());
    assert!(manager.active_sporks().is_empty());
}

#[test]
fn unknown_spork_id_is_ignored() {
    let (manager, signer) = test_rig();
    let net = MockNet::default();

    submit(&manager, &net, &signed(&signer, 99_999, 1, T0)).expect("ignored");
    assert!(manager.active_sporks().is_empty());
    assert!(net.relayed.borrow().is_empty());
}

#[test]
fn getsporks_flushes_active_set() {
    let (manager, signer) = test_rig();
    let net = MockNet::default();

    submit(
        &manager,
        &net,
        &signed(&signer, SPORK_8_PROTOCOL_V210_ENFORCEMENT, 8, T0),
    )
    .expect("accept");
    submit(
        &manager,
        &net,
        &signed(&signer, SPORK_1_MASTERNODE_PAYMENTS_ENFORCEMENT, 1, T0),
    )
    .expect("accept");

    manager
        .process_message(PEER, COMMAND_GET_SPORKS, &[], &net)
        .expect("getsporks");

    let sent = net.sent.borrow();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].0, PEER);
    assert_eq!(sent[0].1.spork_id, SPORK_1_MASTERNODE_PAYMENTS_ENFORCEMENT);
    assert_eq!(sent[1].1.spork_id, SPORK_8_PROTOCOL_V210_ENFORCEMENT);
}

#[test]
fn active_map_entries_are_all_seen_by_hash() {
    let (manager, signer) = test_rig();
    let net = MockNet::default();

    for (id, value) in [
        (SPORK_1_MASTERNODE_PAYMENTS_ENFORCEMENT, 5),
        (SPORK_8_PROTOCOL_V210_ENFORCEMENT, 6),
        (SPORK_2_MASTERNODE_WINNER_ENFORCEMENT, 7),
    ] {
        submit(&manager, &net, &signed(&signer, id, value, T0)).expect("accept");
    }
    // One replacement, so the seen set is larger than the active set.
    submit(
        &manager,
        &net,
        &signed(&signer, SPORK_8_PROTOCOL_V210_ENFORCEMENT, 60, T0 + 1),
    )
    .expect("accept");

    let active = manager.active_sporks();
    assert_eq!(active.len(), 3);
    for msg in active {
        assert!(manager.seen(&msg.hash()));
    }
}

#[test]
fn update_spork_signs_and_reenters_ingress() {
    let (manager, _signer) = test_rig();
    let net = MockNet::default();

    // No key installed yet.
    assert_eq!(
        manager.update_spork(SPORK_2_MASTERNODE_WINNER_ENFORCEMENT, 7, &net),
        Err(SporkError::NotSigner)
    );

    manager.set_signing_key(&"42".repeat(32)).expect("key");
    manager
        .update_spork(SPORK_2_MASTERNODE_WINNER_ENFORCEMENT, 7, &net)
        .expect("update");

    assert_eq!(
        manager.get_spork_value(SPORK_2_MASTERNODE_WINNER_ENFORCEMENT),
        Some(7)
    );
    assert_eq!(net.relayed.borrow().len(), 1);
    // An activation timestamp deep in the past means active.
    assert!(manager.is_spork_active(SPORK_2_MASTERNODE_WINNER_ENFORCEMENT));
}

#[test]
fn set_signing_key_rejects_mismatched_secret() {
    let (manager, _signer) = test_rig();
    assert!(manager.set_signing_key(&"43".repeat(32)).is_err());
}

#[test]
fn defaults_apply_when_no_message_accepted() {
    let (manager, _signer) = test_rig();

    assert_eq!(manager.get_spork_value(10004), Some(10));
    // Scheduled far in the future: off by default.
    assert!(!manager.is_spork_active(SPORK_10_V3_DEV_PAYMENTS_ENFORCEMENT));
    // Unknown ids have no value and are never active.
    assert_eq!(manager.get_spork_value(31_337), None);
    assert!(!manager.is_spork_active(31_337));
}
