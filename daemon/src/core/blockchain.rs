// Chain commit boundaries
//
// `Blockchain` ties the object store, the block store and the rule set
// together. A transaction runs in its own undo session nested inside the
// block session: a failing transaction leaves nothing behind, a failing
// block undoes every transaction it contained. The undo log of each applied
// block is kept so the head block can be popped again.
//
// Transactions pushed outside of a block share one pending session on top
// of the head state. That session is undone before a block is applied or
// popped, and the pending transactions still valid afterwards are applied
// again.

use std::{collections::VecDeque, path::Path};

use log::{debug, info, trace, warn};
use meridian_common::{
    asset::AssetOptions,
    block::{Block, BlockId},
    config::{
        BLOCK_SUMMARY_MASK, COMMITTEE_ACCOUNT, CORE_SYMBOL, BLOCKCHAIN_PRECISION_DIGITS,
        NULL_ACCOUNT, RELAXED_COMMITTEE_ACCOUNT, TEMP_ACCOUNT, WITNESS_ACCOUNT,
    },
    crypto::Hash,
    network::Network,
    object::{AccountId, BlockSummaryId},
    parameters::ChainParameters,
    time::TimestampSeconds,
    transaction::{verify::VerificationError, OperationResult, Transaction},
};

use super::{
    dedup::{clear_expired_transactions, is_known_transaction, record_transaction},
    error::BlockchainError,
    evaluator::{dispatch, EvalContext, SkipFlags},
    hard_fork::HardForkSchedule,
    state::{
        AccountBalanceObject, AccountObject, AssetObject, BlockSummaryObject,
        DynamicGlobalPropertyObject, ObjectStore, UndoState,
    },
    storage::BlockStore,
};
use crate::config::{skip_asserts_forced, BLOCK_SUMMARY_RING_SIZE, DEFAULT_UNDO_HISTORY};

// System accounts every chain starts with
const SYSTEM_ACCOUNTS: [(AccountId, &str); 5] = [
    (COMMITTEE_ACCOUNT, "committee-account"),
    (WITNESS_ACCOUNT, "witness-account"),
    (RELAXED_COMMITTEE_ACCOUNT, "relaxed-committee-account"),
    (NULL_ACCOUNT, "null-account"),
    (TEMP_ACCOUNT, "temp-account"),
];

/// Result of a transaction accepted into the state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionReceipt {
    pub trx_id: Hash,
    pub results: Vec<OperationResult>,
}

// Checks and applies one transaction. The caller owns the undo session.
fn apply_transaction(
    store: &mut ObjectStore,
    ctx: &EvalContext,
    tx: &Transaction,
) -> Result<TransactionReceipt, BlockchainError> {
    tx.validate()?;
    let trx_id = tx.id()?;

    let check_dupes = !ctx.should_skip(SkipFlags::SKIP_TRANSACTION_DUPE_CHECK);
    if check_dupes && is_known_transaction(store, &trx_id) {
        return Err(BlockchainError::DuplicateTransaction(trx_id));
    }

    if !ctx.should_skip(SkipFlags::SKIP_TAPOS_CHECK) {
        let slot = BlockSummaryId::new(tx.get_ref_block_num() as u64);
        let summary = store.get::<BlockSummaryObject>(slot)?;
        if tapos_prefix(&summary.block_id) != tx.get_ref_block_prefix() {
            return Err(BlockchainError::InvalidReferenceBlock {
                ref_block_num: tx.get_ref_block_num(),
                prefix: tx.get_ref_block_prefix(),
            });
        }
    }

    let now = ctx.head_time;
    let expiration = tx.get_expiration();
    if expiration < now {
        return Err(VerificationError::Expired { expiration, now }.into());
    }
    if expiration > now + ctx.parameters.maximum_time_until_expiration as u64 {
        return Err(VerificationError::ExpirationTooFar { expiration, now }.into());
    }

    if check_dupes {
        record_transaction(store, trx_id, expiration);
    }

    let mut results = Vec::with_capacity(tx.get_operations().len());
    for op in tx.get_operations() {
        results.push(dispatch(ctx, store, op)?);
    }

    if log::log_enabled!(log::Level::Trace) {
        trace!("applied transaction {} ({} operations)", trx_id, results.len());
    }
    Ok(TransactionReceipt { trx_id, results })
}

// Bytes 4..8 of a block id, which transactions commit to
fn tapos_prefix(id: &BlockId) -> u32 {
    let bytes = id.as_bytes();
    u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]])
}

pub struct Blockchain {
    network: Network,
    store: ObjectStore,
    blocks: BlockStore,
    parameters: ChainParameters,
    hard_forks: HardForkSchedule,
    skip_flags: SkipFlags,
    // Undo logs of the last applied blocks, oldest first
    undo_history: VecDeque<UndoState>,
    max_undo_history: usize,
    // Accepted outside of any block, in order. The pending session is open
    // exactly when this is not empty.
    pending: Vec<Transaction>,
}

impl Blockchain {
    /// Open the block store in `dir` and build the initial state: system
    /// accounts, the core asset and an empty block summary ring.
    ///
    /// Blocks already present in the store are not replayed.
    pub fn new(
        network: Network,
        dir: impl AsRef<Path>,
        parameters: ChainParameters,
        genesis_time: TimestampSeconds,
    ) -> Result<Self, BlockchainError> {
        parameters
            .validate()
            .map_err(BlockchainError::InvalidParameters)?;

        let mut blocks = BlockStore::open(dir)?;
        if let Some(last) = blocks.last_id()? {
            warn!(
                "block store already holds blocks up to {}, they will not be replayed",
                last.num()
            );
        }

        let mut store = ObjectStore::new();
        for (expected, name) in SYSTEM_ACCOUNTS {
            let id = store.create(|id| AccountObject::new(id, name));
            debug_assert_eq!(id, expected);
        }
        store.create(|id| AssetObject {
            id,
            symbol: CORE_SYMBOL.to_string(),
            issuer: COMMITTEE_ACCOUNT,
            precision: BLOCKCHAIN_PRECISION_DIGITS,
            options: AssetOptions::default(),
            bitasset_data_id: None,
        });
        store.create(|id| DynamicGlobalPropertyObject {
            id,
            head_block_number: 0,
            head_block_id: BlockId::zero(),
            time: genesis_time,
            next_maintenance_time: genesis_time + parameters.maintenance_interval as u64,
        });
        for _ in 0..BLOCK_SUMMARY_RING_SIZE {
            store.create(|id| BlockSummaryObject {
                id,
                block_id: BlockId::zero(),
            });
        }

        if skip_asserts_forced() {
            warn!("assert evaluation is disabled from the environment for blocks");
        }

        info!("{} chain initialized at time {}", network, genesis_time);
        Ok(Self {
            network,
            store,
            blocks,
            hard_forks: HardForkSchedule::for_network(&network),
            parameters,
            skip_flags: SkipFlags::NONE,
            undo_history: VecDeque::new(),
            max_undo_history: DEFAULT_UNDO_HISTORY,
            pending: Vec::new(),
        })
    }

    pub fn with_hard_forks(mut self, hard_forks: HardForkSchedule) -> Self {
        self.hard_forks = hard_forks;
        self
    }

    pub fn with_max_undo_history(mut self, max_undo_history: usize) -> Self {
        self.max_undo_history = max_undo_history;
        self
    }

    #[inline]
    pub fn get_network(&self) -> &Network {
        &self.network
    }

    #[inline]
    pub fn get_store(&self) -> &ObjectStore {
        &self.store
    }

    /// Run `import` directly on the head state, used to import genesis
    /// records. Pending transactions are set aside meanwhile, so the changes
    /// are not covered by any undo log.
    pub fn import_state<R>(
        &mut self,
        import: impl FnOnce(&mut ObjectStore) -> R,
    ) -> Result<R, BlockchainError> {
        let pending = self.clear_pending()?;
        let res = import(&mut self.store);
        self.restore_pending(pending);
        Ok(res)
    }

    #[inline]
    pub fn get_pending_transactions(&self) -> &[Transaction] {
        &self.pending
    }

    #[inline]
    pub fn get_block_store(&mut self) -> &mut BlockStore {
        &mut self.blocks
    }

    #[inline]
    pub fn get_parameters(&self) -> &ChainParameters {
        &self.parameters
    }

    #[inline]
    pub fn get_hard_forks(&self) -> &HardForkSchedule {
        &self.hard_forks
    }

    #[inline]
    pub fn get_skip_flags(&self) -> SkipFlags {
        self.skip_flags
    }

    pub fn set_skip_flags(&mut self, skip_flags: SkipFlags) {
        self.skip_flags = skip_flags;
    }

    // Transactions seen for the first time always have their asserts evaluated
    fn first_time_skip_flags(&self) -> SkipFlags {
        let mut skip = self.skip_flags;
        skip.remove(SkipFlags::SKIP_ASSERT_EVALUATION);
        skip
    }

    fn block_skip_flags(&self) -> SkipFlags {
        let mut skip = self.skip_flags;
        if skip_asserts_forced() {
            skip.insert(SkipFlags::SKIP_ASSERT_EVALUATION);
        }
        skip
    }

    fn dynamic_global_properties(&self) -> Result<&DynamicGlobalPropertyObject, BlockchainError> {
        Ok(self.store.get_dynamic_global_properties()?)
    }

    pub fn get_head_block_num(&self) -> Result<u32, BlockchainError> {
        Ok(self.dynamic_global_properties()?.head_block_number)
    }

    pub fn get_head_block_id(&self) -> Result<BlockId, BlockchainError> {
        Ok(self.dynamic_global_properties()?.head_block_id)
    }

    pub fn get_head_block_time(&self) -> Result<TimestampSeconds, BlockchainError> {
        Ok(self.dynamic_global_properties()?.time)
    }

    /// `(ref_block_num, ref_block_prefix)` binding a new transaction to the
    /// current head block
    pub fn tapos_reference(&self) -> Result<(u16, u32), BlockchainError> {
        let dgp = self.dynamic_global_properties()?;
        Ok((
            (dgp.head_block_number & 0xFFFF) as u16,
            tapos_prefix(&dgp.head_block_id),
        ))
    }

    /// Check a transaction against the head state and the pending
    /// transactions, without keeping any of its effects
    pub fn validate_transaction(&mut self, tx: &Transaction) -> Result<TransactionReceipt, BlockchainError> {
        let dgp = self.store.get_dynamic_global_properties()?.clone();
        let ctx = EvalContext {
            head_time: dgp.time,
            head_block_num: dgp.head_block_number,
            next_maintenance_time: dgp.next_maintenance_time,
            skip: self.first_time_skip_flags(),
            parameters: &self.parameters,
            hard_forks: &self.hard_forks,
        };

        self.store.start_undo_session();
        let res = apply_transaction(&mut self.store, &ctx, tx);
        self.store.undo_session()?;
        res
    }

    /// Apply a transaction on top of the pending state and keep it pending
    /// until a block is applied.
    pub fn push_transaction(&mut self, tx: &Transaction) -> Result<TransactionReceipt, BlockchainError> {
        let dgp = self.store.get_dynamic_global_properties()?.clone();
        let ctx = EvalContext {
            head_time: dgp.time,
            head_block_num: dgp.head_block_number,
            next_maintenance_time: dgp.next_maintenance_time,
            skip: self.first_time_skip_flags(),
            parameters: &self.parameters,
            hard_forks: &self.hard_forks,
        };

        let opens_pending = self.pending.is_empty();
        if opens_pending {
            self.store.start_undo_session();
        }
        self.store.start_undo_session();
        match apply_transaction(&mut self.store, &ctx, tx) {
            Ok(receipt) => {
                self.store.commit_undo_session()?;
                self.pending.push(tx.clone());
                Ok(receipt)
            }
            Err(e) => {
                self.store.undo_session()?;
                if opens_pending {
                    self.store.undo_session()?;
                }
                Err(e)
            }
        }
    }

    // Undo the pending session, handing back its transactions
    fn clear_pending(&mut self) -> Result<Vec<Transaction>, BlockchainError> {
        if self.pending.is_empty() {
            return Ok(Vec::new());
        }
        self.store.undo_session()?;
        Ok(std::mem::take(&mut self.pending))
    }

    // Push again what is still valid on top of the new head
    fn restore_pending(&mut self, pending: Vec<Transaction>) {
        let count = pending.len();
        for tx in pending {
            if let Err(e) = self.push_transaction(&tx) {
                debug!("dropped pending transaction: {}", e);
            }
        }
        if count > 0 {
            trace!("{} of {} pending transactions kept", self.pending.len(), count);
        }
    }

    /// Apply `block` on top of the head block. Either every transaction is
    /// applied and the block is stored, or the state is left untouched.
    /// Pending transactions are applied again on top of the result.
    pub fn apply_block(&mut self, block: &Block) -> Result<BlockId, BlockchainError> {
        let pending = self.clear_pending()?;
        let res = self.apply_block_on_head(block);
        self.restore_pending(pending);
        res
    }

    fn apply_block_on_head(&mut self, block: &Block) -> Result<BlockId, BlockchainError> {
        let head = self.dynamic_global_properties()?.clone();
        let id = block.id()?;

        if block.previous != head.head_block_id {
            return Err(BlockchainError::UnlinkableBlock {
                block: id,
                head: head.head_block_id,
            });
        }
        if block.timestamp <= head.time {
            return Err(BlockchainError::InvalidBlockTimestamp {
                got: block.timestamp,
                head: head.time,
            });
        }
        if !self.skip_flags.contains(SkipFlags::SKIP_MERKLE_CHECK)
            && Block::compute_merkle_root(block.get_transactions())? != block.transaction_merkle_root
        {
            return Err(BlockchainError::InvalidMerkleRoot(id));
        }

        self.store.start_undo_session();
        if let Err(e) = self.apply_block_in_session(block, &id, &head) {
            debug!("block {} rejected: {}", id, e);
            self.store.undo_session()?;
            return Err(e);
        }

        let undo = self.store.detach_undo_session()?;
        self.undo_history.push_back(undo);
        while self.undo_history.len() > self.max_undo_history {
            self.undo_history.pop_front();
        }

        debug!(
            "applied block {} at height {} with {} transactions",
            id,
            id.num(),
            block.get_txs_count()
        );
        Ok(id)
    }

    fn apply_block_in_session(
        &mut self,
        block: &Block,
        id: &BlockId,
        head: &DynamicGlobalPropertyObject,
    ) -> Result<(), BlockchainError> {
        // Operations see the state as of the previous block
        let ctx = EvalContext {
            head_time: head.time,
            head_block_num: head.head_block_number,
            next_maintenance_time: head.next_maintenance_time,
            skip: self.block_skip_flags(),
            parameters: &self.parameters,
            hard_forks: &self.hard_forks,
        };

        for tx in block.get_transactions() {
            self.store.start_undo_session();
            match apply_transaction(&mut self.store, &ctx, tx) {
                Ok(_) => self.store.commit_undo_session()?,
                Err(e) => {
                    self.store.undo_session()?;
                    return Err(e);
                }
            }
        }

        let num = id.num();
        let timestamp = block.timestamp;
        let maintenance_interval = self.parameters.maintenance_interval as u64;
        let maintenance_due = timestamp >= head.next_maintenance_time;
        self.store
            .modify::<DynamicGlobalPropertyObject>(DynamicGlobalPropertyObject::ID, |dgp| {
                dgp.head_block_number = num;
                dgp.head_block_id = *id;
                dgp.time = timestamp;
                while dgp.next_maintenance_time <= timestamp {
                    dgp.next_maintenance_time += maintenance_interval;
                }
            })?;

        let slot = BlockSummaryId::new((num & BLOCK_SUMMARY_MASK) as u64);
        self.store
            .modify::<BlockSummaryObject>(slot, |summary| summary.block_id = *id)?;

        if maintenance_due {
            self.perform_maintenance()?;
        }

        clear_expired_transactions(&mut self.store, timestamp)?;

        self.blocks.store(id, block)?;
        Ok(())
    }

    // Housekeeping pass, currently resets the balance change flags
    fn perform_maintenance(&mut self) -> Result<(), BlockchainError> {
        let flagged = self.store.balances_pending_maintenance();
        debug!("maintenance: {} balances changed since the last pass", flagged.len());
        for id in flagged {
            self.store
                .modify::<AccountBalanceObject>(id, |row| row.maintenance_flag = false)?;
        }
        Ok(())
    }

    /// Revert the head block and tombstone it in the block store.
    /// Pending transactions are applied again on top of the previous block.
    pub fn pop_block(&mut self) -> Result<BlockId, BlockchainError> {
        let pending = self.clear_pending()?;
        let res = self.pop_head_block();
        self.restore_pending(pending);
        res
    }

    fn pop_head_block(&mut self) -> Result<BlockId, BlockchainError> {
        let head_id = self.get_head_block_id()?;
        let undo = self
            .undo_history
            .pop_back()
            .ok_or(BlockchainError::NoBlockToPop)?;

        self.store.revert(undo);
        self.blocks.remove(&head_id)?;
        info!("popped block {} at height {}", head_id, head_id.num());
        Ok(head_id)
    }

    pub fn fetch_block_by_number(&mut self, num: u32) -> Result<Option<Block>, BlockchainError> {
        self.blocks.fetch_by_number(num)
    }

    pub fn fetch_block(&mut self, id: &BlockId) -> Result<Option<Block>, BlockchainError> {
        self.blocks.fetch_optional(id)
    }
}
