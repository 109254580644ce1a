// Shared helpers for the chain integration tests
//
// Every test gets its own chain in a temporary directory. Accounts and
// balances are imported straight into the state, the rules under test are
// then driven through transactions and blocks.
#![allow(dead_code)]

use meridian_common::{
    asset::AssetAmount,
    block::{Block, BlockHeader},
    config::{CORE_ASSET, WITNESS_ACCOUNT},
    network::Network,
    object::AccountId,
    parameters::ChainParameters,
    time::TimestampSeconds,
    transaction::{Operation, Transaction},
};
use meridian_daemon::core::{
    blockchain::{Blockchain, TransactionReceipt},
    error::BlockchainError,
    hard_fork::HardForkSchedule,
    state::AccountObject,
};
use tempdir::TempDir;

pub const GENESIS_TIME: TimestampSeconds = 1_600_000_000;
pub const BLOCK_INTERVAL: TimestampSeconds = 5;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub struct TestNode {
    pub chain: Blockchain,
    // Keeps the block store directory alive for the test duration
    pub dir: TempDir,
}

impl TestNode {
    pub fn new(hard_forks: HardForkSchedule) -> Self {
        Self::with_parameters(hard_forks, ChainParameters::default())
    }

    pub fn with_parameters(hard_forks: HardForkSchedule, parameters: ChainParameters) -> Self {
        init_logger();
        let dir = TempDir::new("meridian-chain").expect("temp dir");
        let chain = Blockchain::new(Network::Devnet, dir.path(), parameters, GENESIS_TIME)
            .expect("chain")
            .with_hard_forks(hard_forks);
        Self { chain, dir }
    }

    pub fn account(&mut self, name: &str) -> AccountId {
        self.chain
            .import_state(|store| store.create(|id| AccountObject::new(id, name)))
            .expect("import")
    }

    pub fn fund(&mut self, account: AccountId, amount: u64) {
        self.chain
            .import_state(|store| store.credit_balance(account, AssetAmount::new(amount, CORE_ASSET)))
            .expect("import")
            .expect("credit");
    }

    pub fn core_balance(&self, account: AccountId) -> u64 {
        self.chain.get_store().get_balance(account, CORE_ASSET).amount
    }

    /// Transaction bound to the head block, expiring one minute later
    pub fn transaction(&self, operations: Vec<Operation>) -> Transaction {
        let (num, prefix) = self.chain.tapos_reference().expect("tapos");
        let now = self.chain.get_head_block_time().expect("head time");
        Transaction::new(num, prefix, now + 60, operations)
    }

    pub fn push(&mut self, operations: Vec<Operation>) -> Result<TransactionReceipt, BlockchainError> {
        let tx = self.transaction(operations);
        self.chain.push_transaction(&tx)
    }

    pub fn next_block(&self, transactions: Vec<Transaction>) -> Block {
        let timestamp = self.chain.get_head_block_time().expect("head time") + BLOCK_INTERVAL;
        self.block_at(timestamp, transactions)
    }

    pub fn block_at(&self, timestamp: TimestampSeconds, transactions: Vec<Transaction>) -> Block {
        let header = BlockHeader {
            previous: self.chain.get_head_block_id().expect("head id"),
            timestamp,
            witness: WITNESS_ACCOUNT,
            transaction_merkle_root: Block::compute_merkle_root(&transactions).expect("merkle"),
        };
        Block::new(header, transactions)
    }

    pub fn produce_block(&mut self, transactions: Vec<Transaction>) -> Result<Block, BlockchainError> {
        let block = self.next_block(transactions);
        self.chain.apply_block(&block)?;
        Ok(block)
    }
}
