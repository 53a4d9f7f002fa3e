//! Spork catalog: identifiers, compiled-in defaults, and the name/id
//! bijection used by the CLI.
//!
//! Identifiers are never reused. Entries deprecated by protocol upgrades
//! stay reserved so old peers cannot confuse one spork for another.

pub const SPORK_START: i32 = 10001;
pub const SPORK_END: i32 = 10010;

pub const SPORK_1_MASTERNODE_PAYMENTS_ENFORCEMENT: i32 = 10001;
pub const SPORK_2_MASTERNODE_WINNER_ENFORCEMENT: i32 = 10002;
pub const SPORK_3_DEVELOPER_PAYMENTS_ENFORCEMENT: i32 = 10003;
pub const SPORK_4_PAYMENT_ENFORCEMENT_DOS_VALUE: i32 = 10004;
pub const SPORK_5_ENFORCE_NEW_PROTOCOL_V200: i32 = 10005; // deprecated
pub const SPORK_6_UPDATED_DEV_PAYMENTS_ENFORCEMENT: i32 = 10006; // deprecated
pub const SPORK_7_PROTOCOL_V201_ENFORCEMENT: i32 = 10007; // deprecated
pub const SPORK_8_PROTOCOL_V210_ENFORCEMENT: i32 = 10008;
pub const SPORK_9_PROTOCOL_V3_ENFORCEMENT: i32 = 10009;
pub const SPORK_10_V3_DEV_PAYMENTS_ENFORCEMENT: i32 = 10010;

pub const ALL: [i32; 10] = [
    SPORK_1_MASTERNODE_PAYMENTS_ENFORCEMENT,
    SPORK_2_MASTERNODE_WINNER_ENFORCEMENT,
    SPORK_3_DEVELOPER_PAYMENTS_ENFORCEMENT,
    SPORK_4_PAYMENT_ENFORCEMENT_DOS_VALUE,
    SPORK_5_ENFORCE_NEW_PROTOCOL_V200,
    SPORK_6_UPDATED_DEV_PAYMENTS_ENFORCEMENT,
    SPORK_7_PROTOCOL_V201_ENFORCEMENT,
    SPORK_8_PROTOCOL_V210_ENFORCEMENT,
    SPORK_9_PROTOCOL_V3_ENFORCEMENT,
    SPORK_10_V3_DEV_PAYMENTS_ENFORCEMENT,
];

/// Compiled-in value used while no signed message for the id has been
/// accepted. Enforcement-style sporks carry an activation timestamp; a
/// value far in the future means "off".
pub fn default_value(spork_id: i32) -> Option<i64> {
    match spork_id {
        SPORK_1_MASTERNODE_PAYMENTS_ENFORCEMENT => Some(1_525_030_000),
        SPORK_2_MASTERNODE_WINNER_ENFORCEMENT => Some(4_000_000_000),
        SPORK_3_DEVELOPER_PAYMENTS_ENFORCEMENT => Some(1_525_030_000),
        SPORK_4_PAYMENT_ENFORCEMENT_DOS_VALUE => Some(10),
        SPORK_5_ENFORCE_NEW_PROTOCOL_V200 => Some(1_513_466_452),
        SPORK_6_UPDATED_DEV_PAYMENTS_ENFORCEMENT => Some(1_524_890_000),
        SPORK_7_PROTOCOL_V201_ENFORCEMENT => Some(1_524_890_000),
        SPORK_8_PROTOCOL_V210_ENFORCEMENT => Some(1_544_940_000),
        SPORK_9_PROTOCOL_V3_ENFORCEMENT => Some(1_562_561_521),
        SPORK_10_V3_DEV_PAYMENTS_ENFORCEMENT => Some(4_070_908_800),
        _ => None,
    }
}

pub fn name(spork_id: i32) -> Option<&'static str> {
    match spork_id {
        SPORK_1_MASTERNODE_PAYMENTS_ENFORCEMENT => Some("SPORK_1_MASTERNODE_PAYMENTS_ENFORCEMENT"),
        SPORK_2_MASTERNODE_WINNER_ENFORCEMENT => Some("SPORK_2_MASTERNODE_WINNER_ENFORCEMENT"),
        SPORK_3_DEVELOPER_PAYMENTS_ENFORCEMENT => Some("SPORK_3_DEVELOPER_PAYMENTS_ENFORCEMENT"),
        SPORK_4_PAYMENT_ENFORCEMENT_DOS_VALUE => Some("SPORK_4_PAYMENT_ENFORCEMENT_DOS_VALUE"),
        SPORK_5_ENFORCE_NEW_PROTOCOL_V200 => Some("SPORK_5_ENFORCE_NEW_PROTOCOL_V200"),
        SPORK_6_UPDATED_DEV_PAYMENTS_ENFORCEMENT => {
            Some("SPORK_6_UPDATED_DEV_PAYMENTS_ENFORCEMENT")
        }
        SPORK_7_PROTOCOL_V201_ENFORCEMENT => Some("SPORK_7_PROTOCOL_V201_ENFORCEMENT"),
        SPORK_8_PROTOCOL_V210_ENFORCEMENT => Some("SPORK_8_PROTOCOL_V210_ENFORCEMENT"),
        SPORK_9_PROTOCOL_V3_ENFORCEMENT => Some("SPORK_9_PROTOCOL_V3_ENFORCEMENT"),
        SPORK_10_V3_DEV_PAYMENTS_ENFORCEMENT => Some("SPORK_10_V3_DEV_PAYMENTS_ENFORCEMENT"),
        _ => None,
    }
}

pub fn id_by_name(spork_name: &str) -> Option<i32> {
    ALL.into_iter().find(|&id| name(id) == Some(spork_name))
}
