use crate::object::{AccountId, AssetId};

pub const VERSION: &str = env!("BUILD_VERSION");

// Native asset
pub const CORE_SYMBOL: &str = "CORE";
pub const CORE_ASSET: AssetId = AssetId::new(0);

// Addresses format
pub const ADDRESS_PREFIX: &str = "MRD";

// Well known system accounts, created before any block is applied
// Account controlled by the committee, issuer of chain controlled assets
pub const COMMITTEE_ACCOUNT: AccountId = AccountId::new(0);
pub const WITNESS_ACCOUNT: AccountId = AccountId::new(1);
pub const RELAXED_COMMITTEE_ACCOUNT: AccountId = AccountId::new(2);
// Nobody can sign for it, used to burn funds
pub const NULL_ACCOUNT: AccountId = AccountId::new(3);
pub const TEMP_ACCOUNT: AccountId = AccountId::new(4);

// Names and symbols
pub const MIN_ACCOUNT_NAME_LENGTH: usize = 1;
pub const MAX_ACCOUNT_NAME_LENGTH: usize = 63;
pub const MIN_ASSET_SYMBOL_LENGTH: usize = 3;
pub const MAX_ASSET_SYMBOL_LENGTH: usize = 16;
pub const MAX_ASSET_PRECISION: u8 = 12;

pub const MAX_SHARE_SUPPLY: u64 = 1_000_000_000_000_000;
pub const MAX_SIG_CHECK_DEPTH: u8 = 2;

// Sizes
pub const MIN_TRANSACTION_SIZE_LIMIT: u32 = 1024;
pub const MIN_BLOCK_SIZE_LIMIT: u32 = MIN_TRANSACTION_SIZE_LIMIT * 5;
pub const DEFAULT_MAX_TRANSACTION_SIZE: u32 = 2048;
pub const DEFAULT_MAX_BLOCK_SIZE: u32 = 2 * 1000 * 1000;

// Block intervals, in seconds
pub const MIN_BLOCK_INTERVAL: u8 = 1;
pub const MAX_BLOCK_INTERVAL: u8 = 30;
pub const DEFAULT_BLOCK_INTERVAL: u8 = 5;

pub const SECONDS_PER_DAY: u64 = 60 * 60 * 24;
pub const DEFAULT_MAX_TIME_UNTIL_EXPIRATION: u32 = SECONDS_PER_DAY as u32;
pub const DEFAULT_MAINTENANCE_INTERVAL: u32 = SECONDS_PER_DAY as u32;
pub const DEFAULT_MAINTENANCE_SKIP_SLOTS: u8 = 3;

pub const MIN_UNDO_HISTORY: u32 = 10;
pub const MAX_UNDO_HISTORY: u32 = 10_000;

// 5 decimals for the native asset
pub const BLOCKCHAIN_PRECISION_DIGITS: u8 = 5;
pub const BLOCKCHAIN_PRECISION: u64 = 10u64.pow(BLOCKCHAIN_PRECISION_DIGITS as u32);

// Percentages are expressed in hundredths of a percent
pub const HUNDRED_PERCENT: u16 = 10_000;
pub const ONE_PERCENT: u16 = HUNDRED_PERCENT / 100;
pub const MAX_MARKET_FEE_PERCENT: u16 = HUNDRED_PERCENT;

// Bitasset defaults
pub const DEFAULT_FORCE_SETTLEMENT_DELAY: u32 = SECONDS_PER_DAY as u32;
pub const DEFAULT_FORCE_SETTLEMENT_OFFSET: u16 = 0;
pub const DEFAULT_FORCE_SETTLEMENT_MAX_VOLUME: u16 = 20 * ONE_PERCENT;
pub const DEFAULT_PRICE_FEED_LIFETIME: u32 = SECONDS_PER_DAY as u32;

pub const DEFAULT_MAX_AUTHORITY_MEMBERSHIP: u16 = 10;
pub const DEFAULT_MAX_ASSET_WHITELIST_AUTHORITIES: u8 = 10;
pub const DEFAULT_MAX_ASSET_FEED_PUBLISHERS: u8 = 10;

// Collateral ratios are expressed against this denominator
pub const COLLATERAL_RATIO_DENOM: u16 = 1000;
pub const MIN_COLLATERAL_RATIO: u16 = 1001;
pub const MAX_COLLATERAL_RATIO: u16 = 32_000;
pub const DEFAULT_MAINTENANCE_COLLATERAL_RATIO: u16 = 1750;
pub const DEFAULT_MAX_SHORT_SQUEEZE_RATIO: u16 = 1500;

// Governance
pub const DEFAULT_MAX_WITNESSES: u16 = 1001;
pub const DEFAULT_MAX_COMMITTEE: u16 = 1001;
pub const DEFAULT_MAX_PROPOSAL_LIFETIME_SEC: u32 = 60 * 60 * 24 * 7 * 4;
pub const DEFAULT_COMMITTEE_PROPOSAL_REVIEW_PERIOD_SEC: u32 = 60 * 60 * 24 * 7 * 2;

// Fee split
pub const DEFAULT_NETWORK_PERCENT_OF_FEE: u16 = 20 * ONE_PERCENT;
pub const DEFAULT_LIFETIME_REFERRER_PERCENT_OF_FEE: u16 = 30 * ONE_PERCENT;
pub const DEFAULT_BURN_PERCENT_OF_FEE: u16 = 20 * ONE_PERCENT;
pub const DEFAULT_CASHBACK_VESTING_PERIOD_SEC: u32 = 60 * 60 * 24 * 365;
pub const DEFAULT_CASHBACK_VESTING_THRESHOLD: u64 = 100 * BLOCKCHAIN_PRECISION;
pub const DEFAULT_FEE_LIQUIDATION_THRESHOLD: u64 = 100 * BLOCKCHAIN_PRECISION;
pub const DEFAULT_ACCOUNTS_PER_FEE_SCALE: u16 = 1000;
pub const DEFAULT_ACCOUNT_FEE_SCALE_BITSHIFTS: u8 = 4;

// Only the first predicate kind is enabled until the parameter is raised
pub const DEFAULT_MAX_ASSERT_OPCODE: u8 = 1;

pub const MAX_WORKER_NAME_LENGTH: usize = 63;
pub const MAX_URL_LENGTH: usize = 127;

pub const CORE_ASSET_CYCLE_RATE: u32 = 17;
pub const CORE_ASSET_CYCLE_RATE_BITS: u32 = 32;

pub const DEFAULT_WITNESS_PAY_PER_BLOCK: u64 = 10 * BLOCKCHAIN_PRECISION;
pub const DEFAULT_WITNESS_PAY_VESTING_SECONDS: u32 = SECONDS_PER_DAY as u32;
pub const DEFAULT_WORKER_BUDGET_PER_DAY: u64 = 500_000 * BLOCKCHAIN_PRECISION;

// Block summaries form a ring indexed by the low 16 bits of the block number
pub const BLOCK_SUMMARY_SLOTS: u32 = 0x10000;
pub const BLOCK_SUMMARY_MASK: u32 = BLOCK_SUMMARY_SLOTS - 1;

// Genesis vesting balances may only be claimed once per this period
pub const BALANCE_CLAIM_PERIOD: u64 = SECONDS_PER_DAY;
