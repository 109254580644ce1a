use thiserror::Error;

use meridian_common::{
    block::BlockId, crypto::Hash, time::TimestampSeconds,
    transaction::verify::VerificationError,
};

#[derive(Error, Debug)]
pub enum BlockchainError {
    #[error(transparent)]
    Verification(#[from] VerificationError),
    // Apply must never fail once evaluate passed, the whole block is rejected
    #[error("Operation apply failed: {0}")]
    ApplyFailed(VerificationError),
    #[error("Transaction {0} was already included")]
    DuplicateTransaction(Hash),
    #[error("Transaction references block {ref_block_num} with prefix {prefix}, which is not in the recent chain")]
    InvalidReferenceBlock { ref_block_num: u16, prefix: u32 },
    #[error("Block {block} does not link to head block {head}")]
    UnlinkableBlock { block: BlockId, head: BlockId },
    #[error("Block timestamp {got} must be after head block time {head}")]
    InvalidBlockTimestamp {
        got: TimestampSeconds,
        head: TimestampSeconds,
    },
    #[error("Invalid transaction merkle root in block {0}")]
    InvalidMerkleRoot(BlockId),
    #[error("Block {0} not found")]
    BlockNotFound(BlockId),
    #[error("No block to pop")]
    NoBlockToPop,
    #[error("No undo session is active")]
    NoUndoSession,
    #[error("Block store is not open")]
    BlockStoreClosed,
    #[error("Corrupted block index: {0}")]
    CorruptedIndex(String),
    #[error("Invalid chain parameters: {0}")]
    InvalidParameters(&'static str),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<bincode::Error> for BlockchainError {
    fn from(err: bincode::Error) -> Self {
        BlockchainError::Serialization(err.to_string())
    }
}
