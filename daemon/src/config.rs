use std::env;

use indexmap::IndexMap;
use lazy_static::lazy_static;
use serde_json::{json, Value};

use meridian_common::{config::*, network::Network, parameters::ChainParameters};

use crate::core::hard_fork::{HardFork, HardForkFeature};

// Recent block ids kept in the block summary ring
pub const BLOCK_SUMMARY_RING_SIZE: u32 = BLOCK_SUMMARY_SLOTS;

// Detached block undo logs kept to pop blocks back
pub const DEFAULT_UNDO_HISTORY: usize = MAX_UNDO_HISTORY as usize;

// Block store file names, inside the data directory
pub const BLOCK_INDEX_FILE_NAME: &str = "index";
pub const BLOCK_LOG_FILE_NAME: &str = "blocks";

// -----------------------------------------------------------------------------
// Runtime toggles
// -----------------------------------------------------------------------------
//
// Environment variables:
//   - MERIDIAN_SKIP_ASSERTS
//       "1" | "true"  => assert operations inside blocks are not evaluated
//       (unset/other) => evaluated (default)
//
// Only meant for replaying history that was already validated.
lazy_static! {
    static ref SKIP_ASSERTS_FORCED: bool = {
        match env::var("MERIDIAN_SKIP_ASSERTS") {
            Ok(v) => matches!(v.as_str(), "1" | "true" | "TRUE" | "True"),
            Err(_) => false,
        }
    };
}

/// Returns true if assert evaluation is disabled from the environment.
/// Read once, cached afterwards.
pub fn skip_asserts_forced() -> bool {
    *SKIP_ASSERTS_FORCED
}

// Mainnet hard forks, activation is the first block time the new rules apply to.
// The namespace and backing rules start one second after their historical
// timestamps, which the chain compared strictly.
const MAINNET_HARD_FORKS: [HardFork; 3] = [
    HardFork {
        feature: HardForkFeature::AssetNamespace,
        activation: 1_445_558_401,
        changelog: "Dotted symbols reserved to the issuer of their prefix",
    },
    HardFork {
        feature: HardForkFeature::BitassetBackingRules,
        activation: 1_535_371_201,
        changelog: "Strict backing asset rules for bitassets",
    },
    HardFork {
        feature: HardForkFeature::AssetExtensions,
        activation: 1_577_880_000,
        changelog: "Asset reward percent and market fee sharing whitelist",
    },
];

const TESTNET_HARD_FORKS: [HardFork; 3] = [
    HardFork {
        feature: HardForkFeature::AssetNamespace,
        activation: 1_445_558_401,
        changelog: "Dotted symbols reserved to the issuer of their prefix",
    },
    HardFork {
        feature: HardForkFeature::BitassetBackingRules,
        activation: 1_533_866_401,
        changelog: "Strict backing asset rules for bitassets",
    },
    HardFork {
        feature: HardForkFeature::AssetExtensions,
        activation: 1_573_660_800,
        changelog: "Asset reward percent and market fee sharing whitelist",
    },
];

// Every rule is active from genesis
const DEVNET_HARD_FORKS: [HardFork; 3] = [
    HardFork {
        feature: HardForkFeature::AssetNamespace,
        activation: 0,
        changelog: "Dotted symbols reserved to the issuer of their prefix",
    },
    HardFork {
        feature: HardForkFeature::BitassetBackingRules,
        activation: 0,
        changelog: "Strict backing asset rules for bitassets",
    },
    HardFork {
        feature: HardForkFeature::AssetExtensions,
        activation: 0,
        changelog: "Asset reward percent and market fee sharing whitelist",
    },
];

pub const fn get_hard_forks(network: &Network) -> &[HardFork] {
    match network {
        Network::Mainnet => &MAINNET_HARD_FORKS,
        Network::Testnet => &TESTNET_HARD_FORKS,
        Network::Devnet => &DEVNET_HARD_FORKS,
    }
}

/// Compiled-in constants, as a flat document for external tooling.
/// Nothing reads it back.
pub fn get_config() -> IndexMap<&'static str, Value> {
    let defaults = ChainParameters::default();
    let mut result = IndexMap::new();

    result.insert("MERIDIAN_SYMBOL", json!(CORE_SYMBOL));
    result.insert("MERIDIAN_ADDRESS_PREFIX", json!(ADDRESS_PREFIX));
    result.insert("MERIDIAN_VERSION", json!(VERSION));
    result.insert("MERIDIAN_MIN_ACCOUNT_NAME_LENGTH", json!(MIN_ACCOUNT_NAME_LENGTH));
    result.insert("MERIDIAN_MAX_ACCOUNT_NAME_LENGTH", json!(MAX_ACCOUNT_NAME_LENGTH));
    result.insert("MERIDIAN_MIN_ASSET_SYMBOL_LENGTH", json!(MIN_ASSET_SYMBOL_LENGTH));
    result.insert("MERIDIAN_MAX_ASSET_SYMBOL_LENGTH", json!(MAX_ASSET_SYMBOL_LENGTH));
    result.insert("MERIDIAN_MAX_SHARE_SUPPLY", json!(MAX_SHARE_SUPPLY));
    result.insert("MERIDIAN_MAX_SIG_CHECK_DEPTH", json!(MAX_SIG_CHECK_DEPTH));
    result.insert("MERIDIAN_MIN_TRANSACTION_SIZE_LIMIT", json!(MIN_TRANSACTION_SIZE_LIMIT));
    result.insert("MERIDIAN_MIN_BLOCK_INTERVAL", json!(MIN_BLOCK_INTERVAL));
    result.insert("MERIDIAN_MAX_BLOCK_INTERVAL", json!(MAX_BLOCK_INTERVAL));
    result.insert("MERIDIAN_DEFAULT_BLOCK_INTERVAL", json!(defaults.block_interval));
    result.insert("MERIDIAN_DEFAULT_MAX_TRANSACTION_SIZE", json!(DEFAULT_MAX_TRANSACTION_SIZE));
    result.insert("MERIDIAN_DEFAULT_MAX_BLOCK_SIZE", json!(DEFAULT_MAX_BLOCK_SIZE));
    result.insert(
        "MERIDIAN_DEFAULT_MAX_TIME_UNTIL_EXPIRATION",
        json!(defaults.maximum_time_until_expiration),
    );
    result.insert(
        "MERIDIAN_DEFAULT_MAINTENANCE_INTERVAL",
        json!(defaults.maintenance_interval),
    );
    result.insert("MERIDIAN_DEFAULT_MAINTENANCE_SKIP_SLOTS", json!(DEFAULT_MAINTENANCE_SKIP_SLOTS));
    result.insert("MERIDIAN_MIN_UNDO_HISTORY", json!(MIN_UNDO_HISTORY));
    result.insert("MERIDIAN_MAX_UNDO_HISTORY", json!(MAX_UNDO_HISTORY));
    result.insert("MERIDIAN_MIN_BLOCK_SIZE_LIMIT", json!(MIN_BLOCK_SIZE_LIMIT));
    result.insert("MERIDIAN_BLOCKCHAIN_PRECISION", json!(BLOCKCHAIN_PRECISION));
    result.insert("MERIDIAN_BLOCKCHAIN_PRECISION_DIGITS", json!(BLOCKCHAIN_PRECISION_DIGITS));
    result.insert("MERIDIAN_100_PERCENT", json!(HUNDRED_PERCENT));
    result.insert("MERIDIAN_1_PERCENT", json!(ONE_PERCENT));
    result.insert("MERIDIAN_MAX_MARKET_FEE_PERCENT", json!(MAX_MARKET_FEE_PERCENT));
    result.insert("MERIDIAN_DEFAULT_FORCE_SETTLEMENT_DELAY", json!(DEFAULT_FORCE_SETTLEMENT_DELAY));
    result.insert("MERIDIAN_DEFAULT_FORCE_SETTLEMENT_OFFSET", json!(DEFAULT_FORCE_SETTLEMENT_OFFSET));
    result.insert(
        "MERIDIAN_DEFAULT_FORCE_SETTLEMENT_MAX_VOLUME",
        json!(DEFAULT_FORCE_SETTLEMENT_MAX_VOLUME),
    );
    result.insert("MERIDIAN_DEFAULT_PRICE_FEED_LIFETIME", json!(DEFAULT_PRICE_FEED_LIFETIME));
    result.insert("MERIDIAN_DEFAULT_MAX_AUTHORITY_MEMBERSHIP", json!(DEFAULT_MAX_AUTHORITY_MEMBERSHIP));
    result.insert(
        "MERIDIAN_DEFAULT_MAX_ASSET_WHITELIST_AUTHORITIES",
        json!(defaults.maximum_asset_whitelist_authorities),
    );
    result.insert(
        "MERIDIAN_DEFAULT_MAX_ASSET_FEED_PUBLISHERS",
        json!(defaults.maximum_asset_feed_publishers),
    );
    result.insert("MERIDIAN_COLLATERAL_RATIO_DENOM", json!(COLLATERAL_RATIO_DENOM));
    result.insert("MERIDIAN_MIN_COLLATERAL_RATIO", json!(MIN_COLLATERAL_RATIO));
    result.insert("MERIDIAN_MAX_COLLATERAL_RATIO", json!(MAX_COLLATERAL_RATIO));
    result.insert(
        "MERIDIAN_DEFAULT_MAINTENANCE_COLLATERAL_RATIO",
        json!(DEFAULT_MAINTENANCE_COLLATERAL_RATIO),
    );
    result.insert("MERIDIAN_DEFAULT_MAX_SHORT_SQUEEZE_RATIO", json!(DEFAULT_MAX_SHORT_SQUEEZE_RATIO));
    result.insert("MERIDIAN_DEFAULT_MAX_WITNESSES", json!(DEFAULT_MAX_WITNESSES));
    result.insert("MERIDIAN_DEFAULT_MAX_COMMITTEE", json!(DEFAULT_MAX_COMMITTEE));
    result.insert(
        "MERIDIAN_DEFAULT_MAX_PROPOSAL_LIFETIME_SEC",
        json!(DEFAULT_MAX_PROPOSAL_LIFETIME_SEC),
    );
    result.insert(
        "MERIDIAN_DEFAULT_COMMITTEE_PROPOSAL_REVIEW_PERIOD_SEC",
        json!(DEFAULT_COMMITTEE_PROPOSAL_REVIEW_PERIOD_SEC),
    );
    result.insert("MERIDIAN_DEFAULT_NETWORK_PERCENT_OF_FEE", json!(DEFAULT_NETWORK_PERCENT_OF_FEE));
    result.insert(
        "MERIDIAN_DEFAULT_LIFETIME_REFERRER_PERCENT_OF_FEE",
        json!(DEFAULT_LIFETIME_REFERRER_PERCENT_OF_FEE),
    );
    result.insert(
        "MERIDIAN_DEFAULT_CASHBACK_VESTING_PERIOD_SEC",
        json!(DEFAULT_CASHBACK_VESTING_PERIOD_SEC),
    );
    result.insert(
        "MERIDIAN_DEFAULT_CASHBACK_VESTING_THRESHOLD",
        json!(DEFAULT_CASHBACK_VESTING_THRESHOLD),
    );
    result.insert("MERIDIAN_DEFAULT_BURN_PERCENT_OF_FEE", json!(DEFAULT_BURN_PERCENT_OF_FEE));
    result.insert("MERIDIAN_DEFAULT_MAX_ASSERT_OPCODE", json!(defaults.max_predicate_opcode));
    result.insert(
        "MERIDIAN_DEFAULT_FEE_LIQUIDATION_THRESHOLD",
        json!(DEFAULT_FEE_LIQUIDATION_THRESHOLD),
    );
    result.insert("MERIDIAN_DEFAULT_ACCOUNTS_PER_FEE_SCALE", json!(DEFAULT_ACCOUNTS_PER_FEE_SCALE));
    result.insert(
        "MERIDIAN_DEFAULT_ACCOUNT_FEE_SCALE_BITSHIFTS",
        json!(DEFAULT_ACCOUNT_FEE_SCALE_BITSHIFTS),
    );
    result.insert("MERIDIAN_MAX_WORKER_NAME_LENGTH", json!(MAX_WORKER_NAME_LENGTH));
    result.insert("MERIDIAN_MAX_URL_LENGTH", json!(MAX_URL_LENGTH));
    result.insert("MERIDIAN_CORE_ASSET_CYCLE_RATE", json!(CORE_ASSET_CYCLE_RATE));
    result.insert("MERIDIAN_CORE_ASSET_CYCLE_RATE_BITS", json!(CORE_ASSET_CYCLE_RATE_BITS));
    result.insert("MERIDIAN_DEFAULT_WITNESS_PAY_PER_BLOCK", json!(DEFAULT_WITNESS_PAY_PER_BLOCK));
    result.insert(
        "MERIDIAN_DEFAULT_WITNESS_PAY_VESTING_SECONDS",
        json!(DEFAULT_WITNESS_PAY_VESTING_SECONDS),
    );
    result.insert("MERIDIAN_DEFAULT_WORKER_BUDGET_PER_DAY", json!(DEFAULT_WORKER_BUDGET_PER_DAY));
    result.insert("MERIDIAN_COMMITTEE_ACCOUNT", json!(COMMITTEE_ACCOUNT.to_string()));
    result.insert("MERIDIAN_WITNESS_ACCOUNT", json!(WITNESS_ACCOUNT.to_string()));
    result.insert(
        "MERIDIAN_RELAXED_COMMITTEE_ACCOUNT",
        json!(RELAXED_COMMITTEE_ACCOUNT.to_string()),
    );
    result.insert("MERIDIAN_NULL_ACCOUNT", json!(NULL_ACCOUNT.to_string()));
    result.insert("MERIDIAN_TEMP_ACCOUNT", json!(TEMP_ACCOUNT.to_string()));

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_config_well_known_values() {
        let config = get_config();
        assert_eq!(config["MERIDIAN_SYMBOL"], json!("CORE"));
        assert_eq!(config["MERIDIAN_COMMITTEE_ACCOUNT"], json!("1.2.0"));
        assert_eq!(config["MERIDIAN_TEMP_ACCOUNT"], json!("1.2.4"));
        assert_eq!(config["MERIDIAN_100_PERCENT"], json!(10_000));
        assert_eq!(config["MERIDIAN_DEFAULT_MAX_ASSERT_OPCODE"], json!(1));
        // insertion order is kept
        assert_eq!(config.get_index(0).map(|(k, _)| *k), Some("MERIDIAN_SYMBOL"));
    }

    #[test]
    fn test_hard_forks_are_sorted() {
        for network in [Network::Mainnet, Network::Testnet, Network::Devnet] {
            let forks = get_hard_forks(&network);
            assert!(forks.windows(2).all(|w| w[0].activation <= w[1].activation));
        }
    }
}
