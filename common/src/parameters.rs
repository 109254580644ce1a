// Global chain parameters
//
// Loading them from genesis or committee proposals happens outside of this
// crate, evaluators only receive a snapshot.

use serde::{Deserialize, Serialize};

use crate::config::{
    DEFAULT_BLOCK_INTERVAL, DEFAULT_MAINTENANCE_INTERVAL, DEFAULT_MAX_ASSERT_OPCODE,
    DEFAULT_MAX_ASSET_FEED_PUBLISHERS, DEFAULT_MAX_ASSET_WHITELIST_AUTHORITIES,
    DEFAULT_MAX_TIME_UNTIL_EXPIRATION, MAX_BLOCK_INTERVAL, MIN_BLOCK_INTERVAL,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainParameters {
    // Seconds between two blocks
    pub block_interval: u8,
    // Seconds between two maintenance passes
    pub maintenance_interval: u32,
    // Predicates with an opcode at or above this value are rejected
    pub max_predicate_opcode: u8,
    pub maximum_asset_whitelist_authorities: u8,
    pub maximum_asset_feed_publishers: u8,
    pub maximum_time_until_expiration: u32,
}

impl Default for ChainParameters {
    fn default() -> Self {
        Self {
            block_interval: DEFAULT_BLOCK_INTERVAL,
            maintenance_interval: DEFAULT_MAINTENANCE_INTERVAL,
            max_predicate_opcode: DEFAULT_MAX_ASSERT_OPCODE,
            maximum_asset_whitelist_authorities: DEFAULT_MAX_ASSET_WHITELIST_AUTHORITIES,
            maximum_asset_feed_publishers: DEFAULT_MAX_ASSET_FEED_PUBLISHERS,
            maximum_time_until_expiration: DEFAULT_MAX_TIME_UNTIL_EXPIRATION,
        }
    }
}

impl ChainParameters {
    pub fn validate(&self) -> Result<(), &'static str> {
        if !(MIN_BLOCK_INTERVAL..=MAX_BLOCK_INTERVAL).contains(&self.block_interval) {
            return Err("block interval out of range");
        }
        if self.maintenance_interval <= self.block_interval as u32 {
            return Err("maintenance interval must be longer than block interval");
        }
        if self.maintenance_interval % self.block_interval as u32 != 0 {
            return Err("maintenance interval must be a multiple of block interval");
        }
        Ok(())
    }
}
