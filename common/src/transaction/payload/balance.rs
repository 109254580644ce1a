use serde::{Deserialize, Serialize};

use crate::{
    asset::AssetAmount,
    config::CORE_ASSET,
    crypto::PublicKey,
    object::{AccountId, BalanceId},
    transaction::verify::VerificationError,
};

// Claims a genesis or vesting balance into an account.
// Claiming frees chain state, so it is never charged a fee.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct BalanceClaimPayload {
    deposit_to_account: AccountId,
    balance_to_claim: BalanceId,
    balance_owner_key: PublicKey,
    total_claimed: AssetAmount,
}

impl BalanceClaimPayload {
    pub fn new(
        deposit_to_account: AccountId,
        balance_to_claim: BalanceId,
        balance_owner_key: PublicKey,
        total_claimed: AssetAmount,
    ) -> Self {
        Self {
            deposit_to_account,
            balance_to_claim,
            balance_owner_key,
            total_claimed,
        }
    }

    #[inline]
    pub fn get_deposit_to_account(&self) -> AccountId {
        self.deposit_to_account
    }

    #[inline]
    pub fn get_balance_to_claim(&self) -> BalanceId {
        self.balance_to_claim
    }

    #[inline]
    pub fn get_balance_owner_key(&self) -> &PublicKey {
        &self.balance_owner_key
    }

    #[inline]
    pub fn get_total_claimed(&self) -> &AssetAmount {
        &self.total_claimed
    }

    pub fn fee(&self) -> AssetAmount {
        AssetAmount::zero(CORE_ASSET)
    }

    pub fn validate(&self) -> Result<(), VerificationError> {
        // A null key can never own anything
        if self.balance_owner_key.as_bytes().iter().all(|b| *b == 0) {
            return Err(VerificationError::InvalidOptions("null balance owner key"));
        }
        Ok(())
    }
}
