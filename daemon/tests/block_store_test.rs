//! Block store: one 32 byte index record per block number pointing into an
//! append only block log.

use std::fs;

use meridian_common::{
    block::{Block, BlockHeader, BlockId},
    config::WITNESS_ACCOUNT,
    crypto::Hash,
};
use meridian_daemon::{
    config::BLOCK_INDEX_FILE_NAME,
    core::{
        error::BlockchainError,
        storage::{BlockStore, INDEX_ENTRY_SIZE},
    },
};
use tempdir::TempDir;

// Linked blocks 1..=count
fn chain_of(count: u32) -> Vec<(BlockId, Block)> {
    let mut previous = BlockId::zero();
    (1..=count)
        .map(|i| {
            let header = BlockHeader {
                previous,
                timestamp: 1_000 + i as u64 * 5,
                witness: WITNESS_ACCOUNT,
                transaction_merkle_root: Hash::zero(),
            };
            let block = Block::new(header, Vec::new());
            let id = block.id().unwrap();
            previous = id;
            (id, block)
        })
        .collect()
}

#[test]
fn test_store_and_fetch() {
    let dir = TempDir::new("meridian-blocks").unwrap();
    let mut store = BlockStore::open(dir.path()).unwrap();
    let blocks = chain_of(3);

    for (id, block) in &blocks {
        store.store(id, block).unwrap();
    }

    for (id, block) in &blocks {
        assert!(store.contains(id).unwrap());
        assert_eq!(store.fetch_block_id(id.num()).unwrap(), *id);
        assert_eq!(store.fetch_optional(id).unwrap().as_ref(), Some(block));
        assert_eq!(store.fetch_by_number(id.num()).unwrap().as_ref(), Some(block));
    }
    assert_eq!(store.last_id().unwrap(), Some(blocks[2].0));
    assert_eq!(store.last().unwrap().as_ref(), Some(&blocks[2].1));

    // Record n sits at byte 32 * n
    let index_len = fs::metadata(dir.path().join(BLOCK_INDEX_FILE_NAME))
        .unwrap()
        .len();
    assert_eq!(index_len, 4 * INDEX_ENTRY_SIZE as u64);
}

#[test]
fn test_blocks_survive_reopen() {
    let dir = TempDir::new("meridian-blocks").unwrap();
    let blocks = chain_of(2);
    {
        let mut store = BlockStore::open(dir.path()).unwrap();
        for (id, block) in &blocks {
            store.store(id, block).unwrap();
        }
        store.flush().unwrap();
    }

    let mut store = BlockStore::open(dir.path()).unwrap();
    assert_eq!(store.last_id().unwrap(), Some(blocks[1].0));
    assert_eq!(store.fetch_optional(&blocks[0].0).unwrap().as_ref(), Some(&blocks[0].1));
}

#[test]
fn test_remove_leaves_a_tombstone() {
    let dir = TempDir::new("meridian-blocks").unwrap();
    let mut store = BlockStore::open(dir.path()).unwrap();
    let blocks = chain_of(2);
    for (id, block) in &blocks {
        store.store(id, block).unwrap();
    }
    let (id, _) = &blocks[1];
    let before = store.read_entry(id.num()).unwrap().unwrap();

    store.remove(id).unwrap();

    let after = store.read_entry(id.num()).unwrap().unwrap();
    assert!(after.is_tombstone());
    assert_eq!(after.block_id, before.block_id);
    assert_eq!(after.offset, before.offset);
    assert!(!store.contains(id).unwrap());
    assert_eq!(store.fetch_optional(id).unwrap(), None);
    assert_eq!(store.fetch_by_number(id.num()).unwrap(), None);
    assert_eq!(store.last_id().unwrap(), Some(blocks[0].0));

    // Removing again is harmless
    store.remove(id).unwrap();
}

#[test]
fn test_remove_of_other_id_is_ignored() {
    let dir = TempDir::new("meridian-blocks").unwrap();
    let mut store = BlockStore::open(dir.path()).unwrap();
    let blocks = chain_of(1);
    let (id, block) = &blocks[0];
    store.store(id, block).unwrap();

    let other = BlockId::from_digest(1, &[0x55; 20]);
    assert_ne!(&other, id);
    store.remove(&other).unwrap();
    assert!(store.contains(id).unwrap());
}

#[test]
fn test_remove_past_the_index_is_not_found() {
    let dir = TempDir::new("meridian-blocks").unwrap();
    let mut store = BlockStore::open(dir.path()).unwrap();
    let blocks = chain_of(3);
    store.store(&blocks[0].0, &blocks[0].1).unwrap();

    let (missing, _) = &blocks[2];
    assert!(matches!(
        store.remove(missing),
        Err(BlockchainError::BlockNotFound(id)) if id == *missing
    ));
    assert!(!store.contains(missing).unwrap());
    assert_eq!(store.fetch_by_number(missing.num()).unwrap(), None);
}

#[test]
fn test_storing_a_number_again_replaces_the_record() {
    let dir = TempDir::new("meridian-blocks").unwrap();
    let mut store = BlockStore::open(dir.path()).unwrap();
    let (first_id, first) = chain_of(1).remove(0);

    let fork = Block::new(
        BlockHeader {
            timestamp: first.timestamp + 1,
            ..first.get_header().clone()
        },
        Vec::new(),
    );
    let fork_id = fork.id().unwrap();
    assert_eq!(fork_id.num(), first_id.num());

    store.store(&first_id, &first).unwrap();
    store.store(&fork_id, &fork).unwrap();

    assert!(!store.contains(&first_id).unwrap());
    assert_eq!(store.fetch_block_id(1).unwrap(), fork_id);
    assert_eq!(store.fetch_by_number(1).unwrap(), Some(fork));
}

#[test]
fn test_closed_store_refuses_access() {
    let dir = TempDir::new("meridian-blocks").unwrap();
    let mut store = BlockStore::open(dir.path()).unwrap();
    store.close().unwrap();
    assert!(!store.is_open());
    assert!(matches!(
        store.fetch_by_number(1),
        Err(BlockchainError::BlockStoreClosed)
    ));
}
