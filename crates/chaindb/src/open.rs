//! Database open and schema migration for the on-disk chain index.

use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;

use argond_storage::fjall::FjallStore;
use argond_storage::{KeyValueStore, StoreError, StoreOptions};

use crate::db::{ChainDb, DATABASE_VERSION};
use crate::error::ChainError;

const DB_DIR_NAME: &str = "txleveldb";

/// Open (or create) the chain index under `<data_dir>/txleveldb`.
///
/// A schema version older than `DATABASE_VERSION` — or one that no longer
/// decodes — wipes the index directory together with every `blk<NNNN>.dat`
/// file, then recreates a fresh store carrying the current version.
pub fn open_chain_db(
    data_dir: &Path,
    options: StoreOptions,
) -> Result<ChainDb<FjallStore>, ChainError> {
    let db_dir = data_dir.join(DB_DIR_NAME);
    argond_log::log_info!("opening chain index in {}", db_dir.display());

    let db = ChainDb::new(Arc::new(FjallStore::open_with_options(&db_dir, options)?));

    let rebuild = match db.read_version() {
        Ok(Some(version)) if version >= DATABASE_VERSION => {
            argond_log::log_info!("chain index version is {version}");
            false
        }
        Ok(Some(version)) => {
            argond_log::log_info!(
                "chain index version is {version}, required {DATABASE_VERSION}, removing old database"
            );
            true
        }
        Ok(None) => {
            db.write_version(DATABASE_VERSION)?;
            false
        }
        Err(ChainError::Malformed(_)) => {
            argond_log::log_warn!("chain index version record is corrupt, removing old database");
            true
        }
        Err(err) => return Err(err),
    };

    if !rebuild {
        return Ok(db);
    }

    db.store().close()?;
    drop(db);
    wipe_database(data_dir, &db_dir)?;

    let fresh = StoreOptions {
        create_if_missing: true,
        ..options
    };
    let db = ChainDb::new(Arc::new(FjallStore::open_with_options(&db_dir, fresh)?));
    db.write_version(DATABASE_VERSION)?;
    Ok(db)
}

/// Remove the index directory and the block files it indexed: `blk0001.dat`
/// upward until the first gap in the sequence.
fn wipe_database(data_dir: &Path, db_dir: &Path) -> Result<(), ChainError> {
    if let Err(err) = std::fs::remove_dir_all(db_dir) {
        if err.kind() != ErrorKind::NotFound {
            return Err(map_io(db_dir, err));
        }
    }

    let mut file_number = 1u32;
    loop {
        let block_file = data_dir.join(format!("blk{file_number:04}.dat"));
        if !block_file.exists() {
            break;
        }
        std::fs::remove_file(&block_file).map_err(|err| map_io(&block_file, err))?;
        file_number += 1;
    }
    Ok(())
}

fn map_io(path: &Path, err: std::io::Error) -> ChainError {
    ChainError::Store(StoreError::Backend(format!(
        "{}: {err}",
        path.display()
    )))
}
