use serde::{Deserialize, Serialize};
use strum::{EnumCount, IntoStaticStr};

use crate::{
    crypto::{Hash, Hashable},
    object::ObjectId,
    time::TimestampSeconds,
};

pub mod verify;

mod payload;

pub use payload::*;

use verify::VerificationError;

// Maximum number of operations in one transaction
pub const MAX_OPERATIONS_PER_TRANSACTION: usize = 255;

/// Every state changing action. Variant order is the opcode, new kinds are
/// appended.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, IntoStaticStr, EnumCount)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Operation {
    Transfer(TransferPayload),
    AssetCreate(AssetCreatePayload),
    AssetUpdateBitasset(AssetUpdateBitassetPayload),
    Assert(AssertPayload),
    BalanceClaim(BalanceClaimPayload),
}

impl Operation {
    pub fn opcode(&self) -> u8 {
        match self {
            Operation::Transfer(_) => 0,
            Operation::AssetCreate(_) => 1,
            Operation::AssetUpdateBitasset(_) => 2,
            Operation::Assert(_) => 3,
            Operation::BalanceClaim(_) => 4,
        }
    }

    pub fn name(&self) -> &'static str {
        self.into()
    }

    // Checks that do not need the chain state
    pub fn validate(&self) -> Result<(), VerificationError> {
        match self {
            Operation::Transfer(payload) => payload.validate(),
            Operation::AssetCreate(payload) => payload.validate(),
            Operation::AssetUpdateBitasset(payload) => payload.validate(),
            Operation::Assert(payload) => payload.validate(),
            Operation::BalanceClaim(payload) => payload.validate(),
        }
    }
}

/// What applying an operation produced
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OperationResult {
    Void,
    Created(ObjectId),
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    // Low 16 bits of a recent block number
    ref_block_num: u16,
    // Bytes 4..8 of the same block id, ties the transaction to one fork
    ref_block_prefix: u32,
    expiration: TimestampSeconds,
    operations: Vec<Operation>,
}

impl Transaction {
    pub fn new(
        ref_block_num: u16,
        ref_block_prefix: u32,
        expiration: TimestampSeconds,
        operations: Vec<Operation>,
    ) -> Self {
        Self {
            ref_block_num,
            ref_block_prefix,
            expiration,
            operations,
        }
    }

    #[inline]
    pub fn get_ref_block_num(&self) -> u16 {
        self.ref_block_num
    }

    #[inline]
    pub fn get_ref_block_prefix(&self) -> u32 {
        self.ref_block_prefix
    }

    #[inline]
    pub fn get_expiration(&self) -> TimestampSeconds {
        self.expiration
    }

    #[inline]
    pub fn get_operations(&self) -> &[Operation] {
        &self.operations
    }

    // Fingerprint used for duplicate detection
    pub fn id(&self) -> Result<Hash, bincode::Error> {
        self.hash()
    }

    pub fn validate(&self) -> Result<(), VerificationError> {
        if self.operations.is_empty() {
            return Err(VerificationError::EmptyTransaction);
        }
        if self.operations.len() > MAX_OPERATIONS_PER_TRANSACTION {
            return Err(VerificationError::InvalidOptions("too many operations"));
        }
        for op in &self.operations {
            op.validate()?;
        }
        Ok(())
    }
}

impl Hashable for Transaction {}
