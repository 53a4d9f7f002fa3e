use argond_storage::memory::MemoryStore;
use argond_storage::{BatchLookup, KeyValueStore, WriteBatch};

#[test]
fn batch_lookup_last_op_wins() {
    let mut batch = WriteBatch::new();
    assert_eq!(batch.lookup(b"a"), BatchLookup::NotInBatch);

    batch.put(b"a".as_slice(), b"1".as_slice());
    assert_eq!(batch.lookup(b"a"), BatchLookup::Found(b"1".to_vec()));

    batch.put(b"a".as_slice(), b"2".as_slice());
    assert_eq!(batch.lookup(b"a"), BatchLookup::Found(b"2".to_vec()));

    batch.delete(b"a".as_slice());
    assert_eq!(batch.lookup(b"a"), BatchLookup::Tombstoned);

    batch.put(b"a".as_slice(), b"3".as_slice());
    assert_eq!(batch.lookup(b"a"), BatchLookup::Found(b"3".to_vec()));

    assert_eq!(batch.lookup(b"b"), BatchLookup::NotInBatch);
}

#[test]
fn batch_commit_is_atomic_over_memory() {
    let store = MemoryStore::new();
    store.put(b"keep", b"old").expect("put");
    store.put(b"gone", b"old").expect("put");

    let mut batch = WriteBatch::new();
    batch.put(b"keep".as_slice(), b"new".as_slice());
    batch.delete(b"gone".as_slice());
    batch.put(b"fresh".as_slice(), b"v".as_slice());
    store.write_batch(&batch).expect("commit");

    assert_eq!(store.get(b"keep").expect("get"), Some(b"new".to_vec()));
    assert_eq!(store.get(b"gone").expect("get"), None);
    assert_eq!(store.get(b"fresh").expect("get"), Some(b"v".to_vec()));
}

#[test]
fn delete_of_absent_key_succeeds() {
    let store = MemoryStore::new();
    store.delete(b"never-written").expect("delete");
}

#[test]
fn iterate_from_is_ordered() {
    let store = MemoryStore::new();
    for key in [b"b1".as_slice(), b"a2", b"b0", b"c9", b"a1"] {
        store.put(key, b"x").expect("put");
    }

    let keys: Vec<Vec<u8>> = store
        .iterate_from(b"a2")
        .expect("iter")
        .map(|entry| entry.expect("entry").0)
        .collect();
    assert_eq!(keys, vec![b"a2".to_vec(), b"b0".to_vec(), b"b1".to_vec(), b"c9".to_vec()]);
}
