use log::trace;
use meridian_common::{
    config::BLOCK_SUMMARY_MASK,
    object::BlockSummaryId,
    transaction::{verify::VerificationError, AssertPayload, OperationResult, Predicate},
};

use super::{EvalContext, Evaluator, SkipFlags};
use crate::core::state::{AccountObject, AssetObject, BlockSummaryObject, ObjectStore};

fn evaluate_predicate(store: &ObjectStore, predicate: &Predicate) -> Result<(), VerificationError> {
    match predicate {
        Predicate::AccountNameEqualsLiteral { account_id, name } => {
            let account = store.get::<AccountObject>(*account_id)?;
            if account.name != *name {
                return Err(VerificationError::PredicateViolation(format!(
                    "account {} is named '{}', not '{}'",
                    account_id, account.name, name
                )));
            }
        }
        Predicate::AssetSymbolEqualsLiteral { asset_id, symbol } => {
            let asset = store.get::<AssetObject>(*asset_id)?;
            if asset.symbol != *symbol {
                return Err(VerificationError::PredicateViolation(format!(
                    "asset {} has symbol '{}', not '{}'",
                    asset_id, asset.symbol, symbol
                )));
            }
        }
        Predicate::BlockIdMatches { id } => {
            let slot = BlockSummaryId::new((id.num() & BLOCK_SUMMARY_MASK) as u64);
            let matches = store
                .find::<BlockSummaryObject>(slot)
                .is_some_and(|summary| summary.block_id == *id);
            if !matches {
                return Err(VerificationError::PredicateViolation(format!(
                    "block {} is not in the recent history of this chain",
                    id
                )));
            }
        }
    }
    Ok(())
}

/// Gate on chain facts, never mutates anything
#[derive(Default)]
pub struct AssertEvaluator;

impl Evaluator for AssertEvaluator {
    type Payload = AssertPayload;

    fn evaluate(
        &mut self,
        ctx: &EvalContext,
        store: &ObjectStore,
        op: &AssertPayload,
    ) -> Result<(), VerificationError> {
        if ctx.should_skip(SkipFlags::SKIP_ASSERT_EVALUATION) {
            trace!("skipping assert evaluation");
            return Ok(());
        }

        let max_opcode = ctx.parameters.max_predicate_opcode;
        for predicate in op.get_predicates() {
            if predicate.opcode() >= max_opcode {
                return Err(VerificationError::PredicateViolation(format!(
                    "predicate {} (opcode {}) is not enabled, max opcode is {}",
                    predicate.name(),
                    predicate.opcode(),
                    max_opcode
                )));
            }
            evaluate_predicate(store, predicate)?;
        }
        Ok(())
    }

    fn apply(
        &mut self,
        _: &EvalContext,
        _: &mut ObjectStore,
        _: &AssertPayload,
    ) -> Result<OperationResult, VerificationError> {
        Ok(OperationResult::Void)
    }
}
