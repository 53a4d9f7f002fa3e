use std::fmt;

use argond_primitives::encoding::DecodeError;
use argond_storage::StoreError;

/// Fatal conditions surfaced while opening or loading the chain index.
///
/// Self-check findings are not errors: they are logged, accumulated into the
/// fork pointer, and handed to the consensus engine for a rewind.
#[derive(Debug)]
pub enum ChainError {
    Malformed(DecodeError),
    Store(StoreError),
    IndexCorrupt { height: u32 },
    CheckpointMismatch { height: u32 },
    BestChainMissing,
    SyncCheckpointMissing,
}

impl fmt::Display for ChainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainError::Malformed(err) => write!(f, "malformed record: {err}"),
            ChainError::Store(err) => write!(f, "store error: {err}"),
            ChainError::IndexCorrupt { height } => {
                write!(f, "block index check failed at height {height}")
            }
            ChainError::CheckpointMismatch { height } => {
                write!(f, "stake modifier checkpoint mismatch at height {height}")
            }
            ChainError::BestChainMissing => {
                write!(f, "best chain pointer missing despite indexed blocks")
            }
            ChainError::SyncCheckpointMissing => {
                write!(f, "synchronized checkpoint not found")
            }
        }
    }
}

impl std::error::Error for ChainError {}

impl From<DecodeError> for ChainError {
    fn from(err: DecodeError) -> Self {
        ChainError::Malformed(err)
    }
}

impl From<StoreError> for ChainError {
    fn from(err: StoreError) -> Self {
        ChainError::Store(err)
    }
}
