use meridian_common::transaction::{verify::VerificationError, OperationResult, TransferPayload};

use super::{EvalContext, Evaluator};
use crate::core::state::{AccountObject, AssetObject, ObjectStore};

#[derive(Default)]
pub struct TransferEvaluator;

impl Evaluator for TransferEvaluator {
    type Payload = TransferPayload;

    fn evaluate(
        &mut self,
        _: &EvalContext,
        store: &ObjectStore,
        op: &TransferPayload,
    ) -> Result<(), VerificationError> {
        store.get::<AccountObject>(op.get_from())?;
        store.get::<AccountObject>(op.get_to())?;
        let amount = op.get_amount();
        store.get::<AssetObject>(amount.asset_id)?;

        let available = store.get_balance(op.get_from(), amount.asset_id).amount;
        if available < amount.amount {
            return Err(VerificationError::InsufficientBalance {
                available,
                required: amount.amount,
            });
        }
        Ok(())
    }

    fn apply(
        &mut self,
        _: &EvalContext,
        store: &mut ObjectStore,
        op: &TransferPayload,
    ) -> Result<OperationResult, VerificationError> {
        store.debit_balance(op.get_from(), *op.get_amount())?;
        store.credit_balance(op.get_to(), *op.get_amount())?;
        Ok(OperationResult::Void)
    }
}
