//! Block application and popping through the whole chain.
//!
//! A block is applied as one unit on top of the head: every transaction in
//! it succeeds or the state is left exactly as it was.

mod common;

use common::{TestNode, BLOCK_INTERVAL, GENESIS_TIME};
use meridian_common::{
    asset::{AssetAmount, AssetOptions},
    config::CORE_ASSET,
    object::AccountId,
    transaction::{AssetCreatePayload, Operation, Transaction, TransferPayload},
};
use meridian_daemon::core::{
    error::BlockchainError, evaluator::SkipFlags, hard_fork::HardForkSchedule,
    state::AssetObject, storage::BlockStore,
};

fn transfer(from: AccountId, to: AccountId, amount: u64) -> Operation {
    Operation::Transfer(TransferPayload::new(
        from,
        to,
        AssetAmount::new(amount, CORE_ASSET),
    ))
}

fn funded_node() -> (TestNode, AccountId, AccountId) {
    let mut node = TestNode::new(HardForkSchedule::all_active());
    let alice = node.account("alice");
    let bob = node.account("bob");
    node.fund(alice, 1_000);
    (node, alice, bob)
}

#[test]
fn test_blocks_apply_and_pop_in_order() -> anyhow::Result<()> {
    let (mut node, alice, bob) = funded_node();

    let mut ids = Vec::new();
    for amount in [100, 200, 300] {
        let tx = node.transaction(vec![transfer(alice, bob, amount)]);
        node.produce_block(vec![tx])?;
        ids.push(node.chain.get_head_block_id()?);
    }
    assert_eq!(node.chain.get_head_block_num()?, 3);
    assert_eq!(node.chain.get_head_block_time()?, GENESIS_TIME + 3 * BLOCK_INTERVAL);
    assert_eq!(node.core_balance(bob), 600);

    assert_eq!(node.chain.pop_block()?, ids[2]);
    assert_eq!(node.core_balance(bob), 300);
    assert_eq!(node.chain.get_head_block_id()?, ids[1]);

    assert_eq!(node.chain.pop_block()?, ids[1]);
    assert_eq!(node.core_balance(bob), 100);
    assert_eq!(node.chain.get_head_block_num()?, 1);
    assert_eq!(node.chain.get_head_block_time()?, GENESIS_TIME + BLOCK_INTERVAL);

    // The chain continues from the new head
    let tx = node.transaction(vec![transfer(alice, bob, 50)]);
    node.produce_block(vec![tx])?;
    assert_eq!(node.chain.get_head_block_num()?, 2);
    assert_eq!(node.core_balance(bob), 150);
    Ok(())
}

#[test]
fn test_invalid_transaction_rejects_block() -> anyhow::Result<()> {
    let (mut node, alice, bob) = funded_node();

    let ok = node.transaction(vec![transfer(alice, bob, 900)]);
    let overdraft = node.transaction(vec![transfer(alice, bob, 200)]);
    assert!(node.produce_block(vec![ok, overdraft]).is_err());

    assert_eq!(node.chain.get_head_block_num()?, 0);
    assert_eq!(node.core_balance(alice), 1_000);
    assert_eq!(node.core_balance(bob), 0);
    assert_eq!(node.chain.get_store().indexes().transactions_count(), 0);
    assert_eq!(node.chain.get_store().session_depth(), 0);
    Ok(())
}

#[test]
fn test_duplicate_in_later_block() -> anyhow::Result<()> {
    let (mut node, alice, bob) = funded_node();

    let tx = node.transaction(vec![transfer(alice, bob, 10)]);
    node.produce_block(vec![tx.clone()])?;

    assert!(matches!(
        node.produce_block(vec![tx.clone()]),
        Err(BlockchainError::DuplicateTransaction(_))
    ));

    // Same transaction twice in one block
    let other = node.transaction(vec![transfer(alice, bob, 20)]);
    assert!(matches!(
        node.produce_block(vec![other.clone(), other]),
        Err(BlockchainError::DuplicateTransaction(_))
    ));
    assert_eq!(node.core_balance(bob), 10);
    Ok(())
}

#[test]
fn test_transaction_must_reference_recent_block() -> anyhow::Result<()> {
    let (mut node, alice, bob) = funded_node();
    node.produce_block(Vec::new())?;
    let (num, prefix) = node.chain.tapos_reference()?;
    assert_eq!(num, 1);

    let expiration = node.chain.get_head_block_time()? + 60;
    let forged = Transaction::new(num, prefix ^ 1, expiration, vec![transfer(alice, bob, 1)]);
    assert!(matches!(
        node.chain.push_transaction(&forged),
        Err(BlockchainError::InvalidReferenceBlock { .. })
    ));

    node.chain.set_skip_flags(SkipFlags::SKIP_TAPOS_CHECK);
    node.chain.push_transaction(&forged)?;
    assert_eq!(node.core_balance(bob), 1);
    Ok(())
}

#[test]
fn test_blocks_are_persisted() -> anyhow::Result<()> {
    let (mut node, alice, bob) = funded_node();
    let tx = node.transaction(vec![transfer(alice, bob, 10)]);
    let first = node.produce_block(vec![tx])?;
    let second = node.produce_block(Vec::new())?;
    node.chain.pop_block()?;
    node.chain.get_block_store().flush()?;

    let mut store = BlockStore::open(node.dir.path())?;
    assert_eq!(store.fetch_by_number(1)?, Some(first));
    assert_eq!(store.fetch_optional(&second.id()?)?, None);
    assert_eq!(store.last_id()?, Some(node.chain.get_head_block_id()?));
    Ok(())
}

#[test]
fn test_pop_is_limited_by_undo_history() -> anyhow::Result<()> {
    let (node, _, _) = funded_node();
    let TestNode { chain, dir } = node;
    let mut node = TestNode {
        chain: chain.with_max_undo_history(2),
        dir,
    };

    for _ in 0..4 {
        node.produce_block(Vec::new())?;
    }
    node.chain.pop_block()?;
    node.chain.pop_block()?;
    assert!(matches!(node.chain.pop_block(), Err(BlockchainError::NoBlockToPop)));
    assert_eq!(node.chain.get_head_block_num()?, 2);
    Ok(())
}

#[test]
fn test_pushed_transaction_is_accepted_in_a_block() -> anyhow::Result<()> {
    let (mut node, alice, bob) = funded_node();
    let tx = node.transaction(vec![transfer(alice, bob, 10)]);
    node.chain.push_transaction(&tx)?;

    node.produce_block(vec![tx])?;
    assert_eq!(node.core_balance(bob), 10);
    assert!(node.chain.get_pending_transactions().is_empty());

    // Same state as a node that only saw the block
    let (mut replica, _, _) = funded_node();
    let block = node.chain.fetch_block_by_number(1)?.expect("block 1");
    replica.chain.apply_block(&block)?;
    assert_eq!(replica.core_balance(bob), 10);
    assert_eq!(replica.chain.get_head_block_id()?, node.chain.get_head_block_id()?);
    Ok(())
}

#[test]
fn test_pop_with_pending_asset_keeps_ids_unique() -> anyhow::Result<()> {
    let (mut node, alice, _) = funded_node();
    node.produce_block(Vec::new())?;
    let create = |symbol: &str| {
        Operation::AssetCreate(AssetCreatePayload::new(
            alice,
            symbol.to_string(),
            5,
            AssetOptions::default(),
            None,
            false,
        ))
    };

    node.push(vec![create("AAA")])?;
    node.chain.pop_block()?;
    node.push(vec![create("BBB")])?;

    let store = node.chain.get_store();
    assert_eq!(store.indexes().find_asset_by_symbol("AAA"), None);
    let bbb = store.indexes().find_asset_by_symbol("BBB").expect("BBB");
    assert_eq!(store.get::<AssetObject>(bbb)?.symbol, "BBB");
    Ok(())
}
