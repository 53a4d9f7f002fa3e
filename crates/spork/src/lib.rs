//! Network governance flags ("sporks"): signed key/value messages that
//! toggle or parameterize policies at runtime, replicated over gossip.

pub mod catalog;
pub mod manager;
pub mod message;
pub mod sign;

pub use manager::{PeerId, PeerTransport, SporkError, SporkManager, COMMAND_GET_SPORKS, COMMAND_SPORK};
pub use message::SporkMessage;
pub use sign::{KeyError, SporkSigner, SporkVerifier};
