//! Assert operations: a transaction only applies while its predicates hold.

mod common;

use common::TestNode;
use meridian_common::{
    config::{COMMITTEE_ACCOUNT, CORE_ASSET, CORE_SYMBOL},
    parameters::ChainParameters,
    transaction::{verify::VerificationError, AssertPayload, Operation, Predicate},
};
use meridian_daemon::core::{
    error::BlockchainError, evaluator::SkipFlags, hard_fork::HardForkSchedule,
};
use proptest::prelude::*;

fn node() -> TestNode {
    let parameters = ChainParameters {
        max_predicate_opcode: 3,
        ..ChainParameters::default()
    };
    TestNode::with_parameters(HardForkSchedule::all_active(), parameters)
}

fn assert_op(predicates: Vec<Predicate>) -> Vec<Operation> {
    vec![Operation::Assert(AssertPayload::new(COMMITTEE_ACCOUNT, predicates))]
}

fn is_violation(res: &Result<impl std::fmt::Debug, BlockchainError>) -> bool {
    matches!(
        res,
        Err(BlockchainError::Verification(VerificationError::PredicateViolation(_)))
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn account_name_predicate_holds_only_for_the_name(
        name in "[a-z][a-z0-9]{2,12}",
        other in "[a-z][a-z0-9]{2,12}",
    ) {
        let mut node = node();
        let account = node.account(&name);

        let res = node.push(assert_op(vec![Predicate::AccountNameEqualsLiteral {
            account_id: account,
            name: other.clone(),
        }]));
        if name == other {
            prop_assert!(res.is_ok());
        } else {
            prop_assert!(is_violation(&res));
        }
    }
}

#[test]
fn test_asset_symbol_predicate() {
    let mut node = node();
    node.push(assert_op(vec![Predicate::AssetSymbolEqualsLiteral {
        asset_id: CORE_ASSET,
        symbol: CORE_SYMBOL.to_string(),
    }]))
    .unwrap();

    let res = node.push(assert_op(vec![Predicate::AssetSymbolEqualsLiteral {
        asset_id: CORE_ASSET,
        symbol: "USD".to_string(),
    }]));
    assert!(is_violation(&res), "got {:?}", res);
}

#[test]
fn test_block_id_predicate_follows_the_chain() {
    let mut node = node();
    node.produce_block(Vec::new()).unwrap();
    let head = node.chain.get_head_block_id().unwrap();

    node.push(assert_op(vec![Predicate::BlockIdMatches { id: head }]))
        .unwrap();

    // Once popped the block is no longer part of the chain
    node.chain.pop_block().unwrap();
    let res = node.push(assert_op(vec![Predicate::BlockIdMatches { id: head }]));
    assert!(is_violation(&res), "got {:?}", res);
}

#[test]
fn test_every_predicate_must_hold() {
    let mut node = node();
    let alice = node.account("alice");
    let res = node.push(assert_op(vec![
        Predicate::AccountNameEqualsLiteral {
            account_id: alice,
            name: "alice".to_string(),
        },
        Predicate::AccountNameEqualsLiteral {
            account_id: alice,
            name: "bob".to_string(),
        },
    ]));
    assert!(is_violation(&res), "got {:?}", res);
}

#[test]
fn test_predicates_above_max_opcode_are_rejected() {
    let mut node = TestNode::new(HardForkSchedule::all_active());
    let max = node.chain.get_parameters().max_predicate_opcode;
    let predicate = Predicate::BlockIdMatches {
        id: node.chain.get_head_block_id().unwrap(),
    };
    assert!(predicate.opcode() >= max);

    let res = node.push(assert_op(vec![predicate]));
    assert!(is_violation(&res), "got {:?}", res);
}

#[test]
fn test_asserts_are_only_skipped_in_blocks() {
    let mut node = node();
    let alice = node.account("alice");
    node.chain.set_skip_flags(SkipFlags::SKIP_ASSERT_EVALUATION);
    let tx = node.transaction(assert_op(vec![Predicate::AccountNameEqualsLiteral {
        account_id: alice,
        name: "bob".to_string(),
    }]));

    let res = node.chain.push_transaction(&tx);
    assert!(is_violation(&res), "got {:?}", res);
    assert!(node.chain.get_pending_transactions().is_empty());

    node.produce_block(vec![tx]).unwrap();
    assert_eq!(node.chain.get_head_block_num().unwrap(), 1);
}
