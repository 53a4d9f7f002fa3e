#![cfg(feature = "fjall")]

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use argond_chaindb::db::{ChainDb, DATABASE_VERSION};
use argond_chaindb::open::open_chain_db;
use argond_storage::fjall::FjallStore;
use argond_storage::{KeyValueStore, StoreOptions};

fn temp_data_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    std::env::temp_dir().join(format!("{prefix}-{}-{nanos}", std::process::id()))
}

#[test]
fn fresh_directory_records_current_version() {
    let data_dir = temp_data_dir("argond-migrate-fresh");
    fs::create_dir_all(&data_dir).expect("create data dir");

    let db = open_chain_db(&data_dir, StoreOptions::default()).expect("open");
    assert_eq!(db.read_version().expect("version"), Some(DATABASE_VERSION));
    assert!(data_dir.join("txleveldb").is_dir());

    db.store().close().expect("close");
    drop(db);
    let _ = fs::remove_dir_all(&data_dir);
}

#[test]
fn outdated_version_wipes_index_and_block_files() {
    let data_dir = temp_data_dir("argond-migrate-old");
    fs::create_dir_all(&data_dir).expect("create data dir");

    // Seed a database carrying an outdated schema version plus some state
    // that must not survive the rebuild.
    {
        let store = FjallStore::open(data_dir.join("txleveldb")).expect("seed open");
        let db = ChainDb::new(Arc::new(store));
        db.write_version(DATABASE_VERSION - 1).expect("old version");
        db.write_best_chain(&[0x42; 32]).expect("stale tip");
        db.store().close().expect("close");
    }

    // Block files 1 and 2 are contiguous and must go; 4 sits after a gap
    // and stays.
    for name in ["blk0001.dat", "blk0002.dat", "blk0004.dat"] {
        fs::write(data_dir.join(name), b"stale").expect("block file");
    }

    let db = open_chain_db(&data_dir, StoreOptions::default()).expect("reopen");
    assert_eq!(db.read_version().expect("version"), Some(DATABASE_VERSION));
    assert_eq!(db.read_best_chain().expect("best chain"), None);
    assert!(!data_dir.join("blk0001.dat").exists());
    assert!(!data_dir.join("blk0002.dat").exists());
    assert!(data_dir.join("blk0004.dat").exists());

    db.store().close().expect("close");
    drop(db);
    let _ = fs::remove_dir_all(&data_dir);
}

#[test]
fn current_version_is_left_alone() {
    let data_dir = temp_data_dir("argond-migrate-current");
    fs::create_dir_all(&data_dir).expect("create data dir");

    {
        let db = open_chain_db(&data_dir, StoreOptions::default()).expect("open");
        db.write_best_chain(&[0x17; 32]).expect("tip");
        db.store().close().expect("close");
    }

    let db = open_chain_db(&data_dir, StoreOptions::default()).expect("reopen");
    assert_eq!(db.read_version().expect("version"), Some(DATABASE_VERSION));
    assert_eq!(db.read_best_chain().expect("best chain"), Some([0x17; 32]));

    db.store().close().expect("close");
    drop(db);
    let _ = fs::remove_dir_all(&data_dir);
}
