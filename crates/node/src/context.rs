//! The composed node context: one value owning the store handle, block
//! tree, and spork manager, threaded through the call graph instead of
//! module-level globals.

use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::RwLock;

use argond_chaindb::blockindex::BlockTree;
use argond_chaindb::db::ChainDb;
use argond_chaindb::error::ChainError;
use argond_chaindb::loader::{load_block_index, CheckParams, LoadOutcome};
use argond_chaindb::open::open_chain_db;
use argond_consensus::ChainParams;
use argond_spork::{KeyError, SporkManager};
use argond_storage::fjall::FjallStore;
use argond_storage::StoreOptions;

use crate::blockfiles::BlockFileStore;
use crate::engine::StructuralEngine;

pub struct NodeContext {
    params: ChainParams,
    db: ChainDb<FjallStore>,
    tree: RwLock<BlockTree>,
    files: BlockFileStore,
    sporks: SporkManager,
}

#[derive(Debug)]
pub enum ContextError {
    Chain(ChainError),
    Key(KeyError),
}

impl std::fmt::Display for ContextError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContextError::Chain(err) => write!(f, "{err}"),
            ContextError::Key(err) => write!(f, "spork key: {err}"),
        }
    }
}

impl std::error::Error for ContextError {}

impl NodeContext {
    pub fn open(
        params: ChainParams,
        data_dir: &Path,
        options: StoreOptions,
    ) -> Result<Self, ContextError> {
        let db = open_chain_db(data_dir, options).map_err(ContextError::Chain)?;
        let sporks = SporkManager::new(&params).map_err(ContextError::Key)?;
        Ok(Self {
            params,
            db,
            tree: RwLock::new(BlockTree::new()),
            files: BlockFileStore::new(data_dir),
            sporks,
        })
    }

    pub fn params(&self) -> &ChainParams {
        &self.params
    }

    pub fn db(&self) -> &ChainDb<FjallStore> {
        &self.db
    }

    pub fn tree(&self) -> &RwLock<BlockTree> {
        &self.tree
    }

    pub fn sporks(&self) -> &SporkManager {
        &self.sporks
    }

    /// Rebuild the block tree and self-check recent history. Runs before
    /// concurrent users exist and holds the tree lock for the whole pass.
    pub fn startup(
        &self,
        check: CheckParams,
        shutdown: &AtomicBool,
    ) -> Result<LoadOutcome, ChainError> {
        let mut tree = self.tree.write().expect("block tree lock");
        let engine = StructuralEngine::new(&self.db);
        load_block_index(&self.db, &mut tree, &engine, &self.files, check, shutdown)
    }
}
