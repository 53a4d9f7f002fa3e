//! Persistent chain index: typed records, batched writes, and the startup
//! loader with tiered self-checks.

pub mod blockindex;
pub mod db;
pub mod error;
pub mod keys;
pub mod loader;
pub mod txindex;

#[cfg(feature = "fjall")]
pub mod open;
