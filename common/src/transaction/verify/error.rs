use thiserror::Error;

use crate::{
    crypto::{Address, PublicKey},
    object::{AccountId, AssetId, ObjectId},
    time::TimestampSeconds,
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerificationError {
    #[error("Predicate violation: {0}")]
    PredicateViolation(String),
    #[error("Balance owner key {claimed} does not match owner {owner}")]
    OwnershipMismatch { claimed: PublicKey, owner: Address },
    #[error("Attempted to claim {claimed} from a vesting balance with {available} available")]
    InvalidClaimAmount { claimed: u64, available: u64 },
    #[error("Vesting balance claimed at {last_claim}, next claim allowed at {next_claim}")]
    ClaimTooFrequent {
        last_claim: TimestampSeconds,
        next_claim: TimestampSeconds,
    },
    #[error("Asset rule violation: {0}")]
    AssetRuleViolation(String),
    #[error("Object {0} not found")]
    NotFound(ObjectId),
    #[error("Invalid asset symbol '{0}'")]
    InvalidSymbol(String),
    #[error("Invalid account name '{0}'")]
    InvalidAccountName(String),
    #[error("Invalid precision {0}")]
    InvalidPrecision(u8),
    #[error("Invalid amount")]
    InvalidAmount,
    #[error("Invalid options: {0}")]
    InvalidOptions(&'static str),
    #[error("Asset mismatch: expected {expected}, got {got}")]
    AssetMismatch { expected: AssetId, got: AssetId },
    #[error("Insufficient balance: available {available}, required {required}")]
    InsufficientBalance { available: u64, required: u64 },
    #[error("Account {0} is not allowed to perform this operation")]
    Unauthorized(AccountId),
    #[error("Sender is receiver")]
    SenderIsReceiver,
    #[error("Transaction has no operations")]
    EmptyTransaction,
    #[error("Assert operation has no predicates")]
    NoPredicates,
    #[error("Transaction expired at {expiration}, head time is {now}")]
    Expired {
        expiration: TimestampSeconds,
        now: TimestampSeconds,
    },
    #[error("Transaction expiration {expiration} is too far in the future, head time is {now}")]
    ExpirationTooFar {
        expiration: TimestampSeconds,
        now: TimestampSeconds,
    },
    #[error("Arithmetic overflow during balance calculation")]
    Overflow,
}
