use log::debug;
use meridian_common::{
    account::VestingContext,
    config::BALANCE_CLAIM_PERIOD,
    crypto::Address,
    object::BalanceId,
    transaction::{verify::VerificationError, BalanceClaimPayload, OperationResult},
};

use super::{EvalContext, Evaluator};
use crate::core::state::{AccountObject, BalanceObject, ObjectStore};

/// Moves an address owned balance into an account
#[derive(Default)]
pub struct BalanceClaimEvaluator {
    balance_id: Option<BalanceId>,
}

impl Evaluator for BalanceClaimEvaluator {
    type Payload = BalanceClaimPayload;

    fn evaluate(
        &mut self,
        ctx: &EvalContext,
        store: &ObjectStore,
        op: &BalanceClaimPayload,
    ) -> Result<(), VerificationError> {
        let balance = store.get::<BalanceObject>(op.get_balance_to_claim())?;
        store.get::<AccountObject>(op.get_deposit_to_account())?;

        let key = op.get_balance_owner_key();
        if !Address::owner_candidates(key).contains(&balance.owner) {
            return Err(VerificationError::OwnershipMismatch {
                claimed: *key,
                owner: balance.owner,
            });
        }

        let claimed = op.get_total_claimed();
        if claimed.asset_id != balance.asset_type() {
            return Err(VerificationError::AssetMismatch {
                expected: balance.asset_type(),
                got: claimed.asset_id,
            });
        }

        match &balance.vesting_policy {
            Some(policy) => {
                if ctx.head_time.saturating_sub(balance.last_claim_date) < BALANCE_CLAIM_PERIOD {
                    return Err(VerificationError::ClaimTooFrequent {
                        last_claim: balance.last_claim_date,
                        next_claim: balance.last_claim_date + BALANCE_CLAIM_PERIOD,
                    });
                }
                let vesting = VestingContext::new(balance.balance, ctx.head_time, *claimed);
                if !policy.is_withdraw_allowed(&vesting) {
                    return Err(VerificationError::InvalidClaimAmount {
                        claimed: claimed.amount,
                        available: balance.available(ctx.head_time).amount,
                    });
                }
            }
            None => {
                if claimed.amount != balance.balance.amount {
                    return Err(VerificationError::InvalidClaimAmount {
                        claimed: claimed.amount,
                        available: balance.balance.amount,
                    });
                }
            }
        }

        self.balance_id = Some(balance.id);
        Ok(())
    }

    fn apply(
        &mut self,
        ctx: &EvalContext,
        store: &mut ObjectStore,
        op: &BalanceClaimPayload,
    ) -> Result<OperationResult, VerificationError> {
        let balance_id = self
            .balance_id
            .ok_or_else(|| VerificationError::NotFound(op.get_balance_to_claim().into()))?;
        let balance = store.get::<BalanceObject>(balance_id)?;
        let claimed = *op.get_total_claimed();

        if balance.is_vesting_balance() && claimed.amount < balance.balance.amount {
            let now = ctx.head_time;
            store.modify::<BalanceObject>(balance_id, |b| {
                let vesting = VestingContext::new(b.balance, now, claimed);
                if let Some(policy) = b.vesting_policy.as_mut() {
                    policy.on_withdraw(&vesting);
                }
                b.balance.amount -= claimed.amount;
                b.last_claim_date = now;
            })?;
        } else {
            // Emptied balances are freed
            store.remove::<BalanceObject>(balance_id)?;
        }

        store.credit_balance(op.get_deposit_to_account(), claimed)?;
        debug!(
            "claimed {} from balance {} into {}",
            claimed,
            balance_id,
            op.get_deposit_to_account()
        );
        Ok(OperationResult::Void)
    }
}

#[cfg(test)]
mod tests {
    use meridian_common::{
        account::{CddVestingPolicy, LinearVestingPolicy, VestingPolicy},
        asset::AssetAmount,
        config::{CORE_ASSET, SECONDS_PER_DAY},
        crypto::{PtsAddress, PublicKey, PTS_VERSION_BTC, PTS_VERSION_PTS},
        object::AssetId,
        time::TIMESTAMP_ZERO,
    };

    use super::*;
    use crate::core::{
        error::BlockchainError,
        evaluator::test_helpers::TestChain,
        hard_fork::HardForkSchedule,
    };

    fn key(seed: u8) -> PublicKey {
        let secret = libsecp256k1::SecretKey::parse(&[seed; 32]).unwrap();
        PublicKey::new(libsecp256k1::PublicKey::from_secret_key(&secret).serialize_compressed())
    }

    fn core(amount: u64) -> AssetAmount {
        AssetAmount::new(amount, CORE_ASSET)
    }

    fn add_balance(
        chain: &mut TestChain,
        owner: Address,
        amount: u64,
        vesting_policy: Option<VestingPolicy>,
    ) -> BalanceId {
        chain.store.create(|id| BalanceObject {
            id,
            owner,
            balance: core(amount),
            vesting_policy,
            last_claim_date: TIMESTAMP_ZERO,
        })
    }

    fn claim(
        chain: &mut TestChain,
        to: meridian_common::object::AccountId,
        balance: BalanceId,
        key: PublicKey,
        amount: AssetAmount,
    ) -> Result<OperationResult, BlockchainError> {
        chain.run::<BalanceClaimEvaluator>(&BalanceClaimPayload::new(to, balance, key, amount))
    }

    #[test]
    fn test_full_claim_removes_balance_and_credits() {
        let mut chain = TestChain::new(HardForkSchedule::all_active());
        let alice = chain.account("alice");
        let owner_key = key(1);
        let balance = add_balance(&mut chain, Address::from_public_key(&owner_key), 1_000, None);

        claim(&mut chain, alice, balance, owner_key, core(1_000)).unwrap();
        assert!(chain.store.find::<BalanceObject>(balance).is_none());
        assert_eq!(chain.store.get_balance(alice, CORE_ASSET).amount, 1_000);
        assert_eq!(chain.store.balances_pending_maintenance().len(), 1);
    }

    #[test]
    fn test_every_legacy_encoding_is_accepted() {
        let owner_key = key(2);
        for version in [PTS_VERSION_PTS, PTS_VERSION_BTC] {
            for compressed in [false, true] {
                let mut chain = TestChain::new(HardForkSchedule::all_active());
                let alice = chain.account("alice");
                let pts = PtsAddress::from_public_key(&owner_key, compressed, version).unwrap();
                let balance = add_balance(&mut chain, Address::from_pts(&pts), 10, None);
                assert!(claim(&mut chain, alice, balance, owner_key, core(10)).is_ok());
            }
        }
    }

    #[test]
    fn test_foreign_key_is_rejected() {
        let mut chain = TestChain::new(HardForkSchedule::all_active());
        let alice = chain.account("alice");
        let balance = add_balance(&mut chain, Address::from_public_key(&key(3)), 10, None);
        assert!(matches!(
            claim(&mut chain, alice, balance, key(4), core(10)),
            Err(BlockchainError::Verification(VerificationError::OwnershipMismatch { .. }))
        ));
    }

    #[test]
    fn test_plain_balance_is_all_or_nothing() {
        let mut chain = TestChain::new(HardForkSchedule::all_active());
        let alice = chain.account("alice");
        let owner_key = key(5);
        let balance = add_balance(&mut chain, Address::from_public_key(&owner_key), 10, None);
        assert!(matches!(
            claim(&mut chain, alice, balance, owner_key, core(9)),
            Err(BlockchainError::Verification(VerificationError::InvalidClaimAmount {
                claimed: 9,
                available: 10
            }))
        ));
        assert!(matches!(
            claim(&mut chain, alice, balance, owner_key, AssetAmount::new(10, AssetId::new(1))),
            Err(BlockchainError::Verification(VerificationError::AssetMismatch { .. }))
        ));
    }

    #[test]
    fn test_partial_vesting_claim_then_daily_limit() {
        let mut chain = TestChain::new(HardForkSchedule::all_active());
        let alice = chain.account("alice");
        let owner_key = key(6);
        let policy = VestingPolicy::Linear(LinearVestingPolicy {
            begin_timestamp: 0,
            vesting_cliff_seconds: 0,
            vesting_duration_seconds: 2 * chain.head_time,
            begin_balance: 1_000,
        });
        let balance = add_balance(
            &mut chain,
            Address::from_public_key(&owner_key),
            1_000,
            Some(policy),
        );

        // half of the duration elapsed
        assert!(matches!(
            claim(&mut chain, alice, balance, owner_key, core(501)),
            Err(BlockchainError::Verification(VerificationError::InvalidClaimAmount {
                claimed: 501,
                available: 500
            }))
        ));
        claim(&mut chain, alice, balance, owner_key, core(200)).unwrap();

        let object = chain.store.get::<BalanceObject>(balance).unwrap();
        assert_eq!(object.balance.amount, 800);
        assert_eq!(object.last_claim_date, chain.head_time);
        assert_eq!(chain.store.get_balance(alice, CORE_ASSET).amount, 200);

        // even a tiny claim is refused the same day
        chain.head_time += SECONDS_PER_DAY - 1;
        assert!(matches!(
            claim(&mut chain, alice, balance, owner_key, core(1)),
            Err(BlockchainError::Verification(VerificationError::ClaimTooFrequent { .. }))
        ));
        chain.head_time += 1;
        assert!(claim(&mut chain, alice, balance, owner_key, core(1)).is_ok());
    }

    #[test]
    fn test_cdd_claim_burns_coin_seconds() {
        let mut chain = TestChain::new(HardForkSchedule::all_active());
        let alice = chain.account("alice");
        let owner_key = key(7);
        let start = chain.head_time - SECONDS_PER_DAY;
        let policy = VestingPolicy::CoinDaysDestroyed(CddVestingPolicy::new(
            (2 * SECONDS_PER_DAY) as u32,
            start,
        ));
        let balance = add_balance(
            &mut chain,
            Address::from_public_key(&owner_key),
            1_000,
            Some(policy),
        );

        claim(&mut chain, alice, balance, owner_key, core(500)).unwrap();
        let object = chain.store.get::<BalanceObject>(balance).unwrap();
        assert_eq!(object.balance.amount, 500);
        assert_eq!(object.available(chain.head_time).amount, 0);
    }

    #[test]
    fn test_full_vesting_claim_removes_balance() {
        let mut chain = TestChain::new(HardForkSchedule::all_active());
        let alice = chain.account("alice");
        let owner_key = key(8);
        let policy = VestingPolicy::Linear(LinearVestingPolicy {
            begin_timestamp: 0,
            vesting_cliff_seconds: 0,
            vesting_duration_seconds: 1,
            begin_balance: 300,
        });
        let balance = add_balance(
            &mut chain,
            Address::from_public_key(&owner_key),
            300,
            Some(policy),
        );
        claim(&mut chain, alice, balance, owner_key, core(300)).unwrap();
        assert!(chain.store.find::<BalanceObject>(balance).is_none());
    }
}
