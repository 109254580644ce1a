// Vesting policies
//
// A vesting policy decides how much of a balance may be withdrawn at a
// given time. Policies are pure data plus arithmetic: the caller passes the
// current balance, the block time and the requested amount, and writes the
// mutated policy back through the store.

use serde::{Deserialize, Serialize};

use crate::{asset::AssetAmount, time::TimestampSeconds};

/// Inputs every policy decision is made against
#[derive(Debug, Clone, Copy)]
pub struct VestingContext {
    /// Current balance held under the policy
    pub balance: AssetAmount,
    /// Head block time
    pub now: TimestampSeconds,
    /// Requested withdraw or deposit
    pub amount: AssetAmount,
}

impl VestingContext {
    pub fn new(balance: AssetAmount, now: TimestampSeconds, amount: AssetAmount) -> Self {
        Self {
            balance,
            now,
            amount,
        }
    }
}

/// Linear unlock of `begin_balance` over `vesting_duration_seconds`,
/// nothing withdrawable before the cliff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinearVestingPolicy {
    pub begin_timestamp: TimestampSeconds,
    pub vesting_cliff_seconds: u64,
    pub vesting_duration_seconds: u64,
    pub begin_balance: u64,
}

impl LinearVestingPolicy {
    pub fn get_allowed_withdraw(&self, ctx: &VestingContext) -> AssetAmount {
        let mut allowed = 0;
        if ctx.now > self.begin_timestamp {
            let elapsed = ctx.now - self.begin_timestamp;
            if elapsed >= self.vesting_cliff_seconds {
                let total_vested = if elapsed < self.vesting_duration_seconds {
                    ((self.begin_balance as u128 * elapsed as u128)
                        / self.vesting_duration_seconds as u128) as u64
                } else {
                    self.begin_balance
                };
                let withdrawn_already = self.begin_balance.saturating_sub(ctx.balance.amount);
                allowed = total_vested
                    .saturating_sub(withdrawn_already)
                    .min(ctx.balance.amount);
            }
        }
        AssetAmount::new(allowed, ctx.balance.asset_id)
    }
}

/// Coin days destroyed policy: coin-seconds accrue at `balance` per second
/// up to `balance * vesting_seconds`, and withdrawing `x` burns
/// `x * vesting_seconds` of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CddVestingPolicy {
    pub vesting_seconds: u32,
    pub coin_seconds_earned: u128,
    pub coin_seconds_earned_last_update: TimestampSeconds,
    /// Nothing may be claimed before this time
    pub start_claim: TimestampSeconds,
}

impl CddVestingPolicy {
    pub fn new(vesting_seconds: u32, now: TimestampSeconds) -> Self {
        Self {
            vesting_seconds,
            coin_seconds_earned: 0,
            coin_seconds_earned_last_update: now,
            start_claim: now,
        }
    }

    pub fn compute_coin_seconds_earned(&self, ctx: &VestingContext) -> u128 {
        if ctx.now <= self.start_claim {
            return 0;
        }
        let delta_seconds = ctx
            .now
            .saturating_sub(self.coin_seconds_earned_last_update) as u128;
        let delta_coin_seconds = ctx.balance.amount as u128 * delta_seconds;
        let coin_seconds_earned_max = ctx.balance.amount as u128 * self.vesting_seconds as u128;
        (self.coin_seconds_earned + delta_coin_seconds).min(coin_seconds_earned_max)
    }

    fn update_coin_seconds_earned(&mut self, ctx: &VestingContext) {
        self.coin_seconds_earned = self.compute_coin_seconds_earned(ctx);
        self.coin_seconds_earned_last_update = ctx.now;
    }

    pub fn get_allowed_withdraw(&self, ctx: &VestingContext) -> AssetAmount {
        if ctx.now <= self.start_claim {
            return AssetAmount::zero(ctx.balance.asset_id);
        }
        let earned = self.compute_coin_seconds_earned(ctx);
        let available = earned / (self.vesting_seconds.max(1) as u128);
        let allowed = available.min(ctx.balance.amount as u128) as u64;
        AssetAmount::new(allowed, ctx.balance.asset_id)
    }

    fn on_deposit(&mut self, ctx: &VestingContext) {
        self.update_coin_seconds_earned(ctx);
    }

    fn on_withdraw(&mut self, ctx: &VestingContext) {
        self.update_coin_seconds_earned(ctx);
        let to_remove = ctx.amount.amount as u128 * self.vesting_seconds as u128;
        self.coin_seconds_earned = self.coin_seconds_earned.saturating_sub(to_remove);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VestingPolicy {
    Linear(LinearVestingPolicy),
    CoinDaysDestroyed(CddVestingPolicy),
}

impl VestingPolicy {
    pub fn get_allowed_withdraw(&self, ctx: &VestingContext) -> AssetAmount {
        match self {
            VestingPolicy::Linear(policy) => policy.get_allowed_withdraw(ctx),
            VestingPolicy::CoinDaysDestroyed(policy) => policy.get_allowed_withdraw(ctx),
        }
    }

    pub fn is_withdraw_allowed(&self, ctx: &VestingContext) -> bool {
        ctx.amount.asset_id == ctx.balance.asset_id
            && ctx.amount.amount <= self.get_allowed_withdraw(ctx).amount
    }

    pub fn is_deposit_allowed(&self, ctx: &VestingContext) -> bool {
        ctx.amount.asset_id == ctx.balance.asset_id
            && ctx.balance.amount.checked_add(ctx.amount.amount).is_some()
    }

    // Must only be called once the withdraw was checked
    pub fn on_withdraw(&mut self, ctx: &VestingContext) {
        match self {
            VestingPolicy::Linear(_) => {}
            VestingPolicy::CoinDaysDestroyed(policy) => policy.on_withdraw(ctx),
        }
    }

    pub fn on_deposit(&mut self, ctx: &VestingContext) {
        match self {
            VestingPolicy::Linear(_) => {}
            VestingPolicy::CoinDaysDestroyed(policy) => policy.on_deposit(ctx),
        }
    }
}
