//! Consensus constants, chain parameters, and trust arithmetic.

pub mod money;
pub mod params;
pub mod trust;

pub type Hash256 = [u8; 32];

pub const ZERO_HASH: Hash256 = [0u8; 32];

pub use params::{chain_params, ChainParams, Network, SporkKeys};
pub use trust::{block_trust, target_from_compact};
