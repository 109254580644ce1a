// Operation evaluators
//
// Every operation is processed in two phases. `evaluate` only reads the
// store and decides whether the operation is valid, `apply` performs the
// mutation and may rely on what `evaluate` checked and cached. An apply
// failure means evaluate missed something: the caller rejects the block.

mod assert;
mod asset;
mod balance;
mod transfer;

use std::ops::{BitOr, BitOrAssign};

use log::debug;
use meridian_common::{
    parameters::ChainParameters,
    time::TimestampSeconds,
    transaction::{verify::VerificationError, Operation, OperationResult},
};

use super::{
    error::BlockchainError,
    hard_fork::{HardForkFeature, HardForkSchedule},
    state::ObjectStore,
};

pub use assert::AssertEvaluator;
pub use asset::{check_children_of_bitasset, AssetCreateEvaluator, AssetUpdateBitassetEvaluator};
pub use balance::BalanceClaimEvaluator;
pub use transfer::TransferEvaluator;

/// Validation steps a node may skip, usually when replaying blocks it
/// already validated once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SkipFlags(u32);

impl SkipFlags {
    pub const NONE: SkipFlags = SkipFlags(0);
    pub const SKIP_ASSERT_EVALUATION: SkipFlags = SkipFlags(1 << 0);
    pub const SKIP_TRANSACTION_DUPE_CHECK: SkipFlags = SkipFlags(1 << 1);
    // Reserved, blocks carry no size limit yet
    pub const SKIP_BLOCK_SIZE_CHECK: SkipFlags = SkipFlags(1 << 2);
    pub const SKIP_TAPOS_CHECK: SkipFlags = SkipFlags(1 << 3);
    pub const SKIP_MERKLE_CHECK: SkipFlags = SkipFlags(1 << 4);

    pub const fn bits(&self) -> u32 {
        self.0
    }

    pub const fn contains(&self, other: SkipFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: SkipFlags) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: SkipFlags) {
        self.0 &= !other.0;
    }
}

impl BitOr for SkipFlags {
    type Output = SkipFlags;

    fn bitor(self, rhs: SkipFlags) -> SkipFlags {
        SkipFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for SkipFlags {
    fn bitor_assign(&mut self, rhs: SkipFlags) {
        self.insert(rhs);
    }
}

/// Chain context an operation is evaluated against
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    // Time of the current head block
    pub head_time: TimestampSeconds,
    pub head_block_num: u32,
    pub next_maintenance_time: TimestampSeconds,
    pub skip: SkipFlags,
    pub parameters: &'a ChainParameters,
    pub hard_forks: &'a HardForkSchedule,
}

impl<'a> EvalContext<'a> {
    #[inline]
    pub fn is_active(&self, feature: HardForkFeature) -> bool {
        self.hard_forks.is_active(feature, self.head_time)
    }

    #[inline]
    pub fn should_skip(&self, flag: SkipFlags) -> bool {
        self.skip.contains(flag)
    }
}

/// Two phase processing of one operation kind.
///
/// A fresh evaluator is used per operation, so it may keep what evaluate
/// resolved for apply.
pub trait Evaluator: Default {
    type Payload;

    fn evaluate(
        &mut self,
        ctx: &EvalContext,
        store: &ObjectStore,
        op: &Self::Payload,
    ) -> Result<(), VerificationError>;

    fn apply(
        &mut self,
        ctx: &EvalContext,
        store: &mut ObjectStore,
        op: &Self::Payload,
    ) -> Result<OperationResult, VerificationError>;
}

fn run<E: Evaluator>(
    ctx: &EvalContext,
    store: &mut ObjectStore,
    op: &E::Payload,
) -> Result<OperationResult, BlockchainError> {
    let mut evaluator = E::default();
    evaluator.evaluate(ctx, store, op)?;
    evaluator
        .apply(ctx, store, op)
        .map_err(BlockchainError::ApplyFailed)
}

/// Evaluate then apply one operation
pub fn dispatch(
    ctx: &EvalContext,
    store: &mut ObjectStore,
    op: &Operation,
) -> Result<OperationResult, BlockchainError> {
    let res = match op {
        Operation::Transfer(payload) => run::<TransferEvaluator>(ctx, store, payload),
        Operation::AssetCreate(payload) => run::<AssetCreateEvaluator>(ctx, store, payload),
        Operation::AssetUpdateBitasset(payload) => {
            run::<AssetUpdateBitassetEvaluator>(ctx, store, payload)
        }
        Operation::Assert(payload) => run::<AssertEvaluator>(ctx, store, payload),
        Operation::BalanceClaim(payload) => run::<BalanceClaimEvaluator>(ctx, store, payload),
    };

    if let Err(e) = &res {
        debug!(
            "{} operation rejected at block {}: {}",
            op.name(),
            ctx.head_block_num + 1,
            e
        );
    }
    res
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_flags() {
        let mut flags = SkipFlags::SKIP_ASSERT_EVALUATION | SkipFlags::SKIP_TAPOS_CHECK;
        assert!(flags.contains(SkipFlags::SKIP_ASSERT_EVALUATION));
        assert!(!flags.contains(SkipFlags::SKIP_TRANSACTION_DUPE_CHECK));
        flags.remove(SkipFlags::SKIP_ASSERT_EVALUATION);
        assert!(!flags.contains(SkipFlags::SKIP_ASSERT_EVALUATION));
        assert!(flags.contains(SkipFlags::NONE));
        assert_eq!(flags.bits(), 1 << 3);
    }
}
