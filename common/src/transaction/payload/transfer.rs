use serde::{Deserialize, Serialize};

use crate::{
    asset::AssetAmount, object::AccountId, transaction::verify::VerificationError,
};

// Moves an amount of one asset between two accounts
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TransferPayload {
    from: AccountId,
    to: AccountId,
    amount: AssetAmount,
}

impl TransferPayload {
    pub fn new(from: AccountId, to: AccountId, amount: AssetAmount) -> Self {
        Self { from, to, amount }
    }

    #[inline]
    pub fn get_from(&self) -> AccountId {
        self.from
    }

    #[inline]
    pub fn get_to(&self) -> AccountId {
        self.to
    }

    #[inline]
    pub fn get_amount(&self) -> &AssetAmount {
        &self.amount
    }

    pub fn validate(&self) -> Result<(), VerificationError> {
        if self.amount.amount == 0 {
            return Err(VerificationError::InvalidAmount);
        }
        if self.from == self.to {
            return Err(VerificationError::SenderIsReceiver);
        }
        Ok(())
    }
}
