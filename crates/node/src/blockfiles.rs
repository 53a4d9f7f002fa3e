//! Read-only access to the numbered block files (`blk0001.dat`, ...).

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::PathBuf;

use argond_chaindb::loader::BlockFiles;
use argond_chaindb::txindex::DiskTxPos;
use argond_primitives::block::Block;
use argond_primitives::encoding::{Decodable, Decoder};
use argond_primitives::transaction::Transaction;
use argond_storage::StoreError;

/// Upper bound on a single record read; anything larger is corrupt.
const MAX_RECORD_BYTES: u64 = 2 * 1024 * 1024;

pub struct BlockFileStore {
    data_dir: PathBuf,
}

impl BlockFileStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn read_chunk(&self, file: u32, offset: u32) -> Result<Vec<u8>, StoreError> {
        let path = self.data_dir.join(format!("blk{file:04}.dat"));
        let mut handle =
            File::open(&path).map_err(|err| StoreError::Backend(format!("{}: {err}", path.display())))?;
        handle
            .seek(SeekFrom::Start(offset as u64))
            .map_err(|err| StoreError::Backend(format!("{}: {err}", path.display())))?;
        let mut chunk = Vec::new();
        handle
            .take(MAX_RECORD_BYTES)
            .read_to_end(&mut chunk)
            .map_err(|err| StoreError::Backend(format!("{}: {err}", path.display())))?;
        Ok(chunk)
    }
}

impl BlockFiles for BlockFileStore {
    fn read_block(&self, file: u32, block_pos: u32) -> Result<Block, StoreError> {
        let chunk = self.read_chunk(file, block_pos)?;
        let mut decoder = Decoder::new(&chunk);
        Block::canonical_decode(&mut decoder)
            .map_err(|err| StoreError::Backend(format!("block at {file}:{block_pos}: {err}")))
    }

    fn read_tx(&self, pos: DiskTxPos) -> Result<Transaction, StoreError> {
        // `tx_pos` is the transaction's byte offset within the stored block.
        let offset = pos
            .block_pos
            .checked_add(pos.tx_pos)
            .ok_or_else(|| StoreError::Backend("transaction offset overflow".to_string()))?;
        let chunk = self.read_chunk(pos.file, offset)?;
        let mut decoder = Decoder::new(&chunk);
        Transaction::canonical_decode(&mut decoder).map_err(|err| {
            StoreError::Backend(format!("tx at {}:{offset}: {err}", pos.file))
        })
    }
}
