// Asset amounts and asset options

use std::{
    collections::BTreeSet,
    fmt::{Display, Formatter},
};

use serde::{Deserialize, Serialize};

use crate::{
    config::{
        DEFAULT_FORCE_SETTLEMENT_DELAY, DEFAULT_FORCE_SETTLEMENT_MAX_VOLUME,
        DEFAULT_FORCE_SETTLEMENT_OFFSET, DEFAULT_PRICE_FEED_LIFETIME, HUNDRED_PERCENT,
        MAX_ASSET_SYMBOL_LENGTH, MAX_MARKET_FEE_PERCENT, MAX_SHARE_SUPPLY,
        MIN_ASSET_SYMBOL_LENGTH,
    },
    object::{AccountId, AssetId},
};

/// An amount of a given asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetAmount {
    pub amount: u64,
    pub asset_id: AssetId,
}

impl AssetAmount {
    pub const fn new(amount: u64, asset_id: AssetId) -> Self {
        Self { amount, asset_id }
    }

    pub const fn zero(asset_id: AssetId) -> Self {
        Self::new(0, asset_id)
    }
}

impl Display for AssetAmount {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} of {}", self.amount, self.asset_id)
    }
}

/// Options that became available with the asset extensions hard fork
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetOptionsExtensions {
    pub reward_percent: Option<u16>,
    pub whitelist_market_fee_sharing: Option<BTreeSet<AccountId>>,
}

impl AssetOptionsExtensions {
    pub fn is_empty(&self) -> bool {
        self.reward_percent.is_none() && self.whitelist_market_fee_sharing.is_none()
    }
}

/// Options shared by every asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetOptions {
    pub max_supply: u64,
    pub market_fee_percent: u16,
    pub issuer_permissions: u16,
    pub flags: u16,
    pub whitelist_authorities: BTreeSet<AccountId>,
    pub blacklist_authorities: BTreeSet<AccountId>,
    pub description: String,
    pub extensions: AssetOptionsExtensions,
}

impl Default for AssetOptions {
    fn default() -> Self {
        Self {
            max_supply: MAX_SHARE_SUPPLY,
            market_fee_percent: 0,
            issuer_permissions: 0,
            flags: 0,
            whitelist_authorities: BTreeSet::new(),
            blacklist_authorities: BTreeSet::new(),
            description: String::new(),
            extensions: AssetOptionsExtensions::default(),
        }
    }
}

impl AssetOptions {
    // Stateless checks, returns the reason of the first failure
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.max_supply == 0 || self.max_supply > MAX_SHARE_SUPPLY {
            return Err("max supply out of range");
        }
        if self.market_fee_percent > MAX_MARKET_FEE_PERCENT {
            return Err("market fee percent above 100%");
        }
        if let Some(reward) = self.extensions.reward_percent {
            if reward > HUNDRED_PERCENT {
                return Err("reward percent above 100%");
            }
        }
        if self
            .whitelist_authorities
            .intersection(&self.blacklist_authorities)
            .next()
            .is_some()
        {
            return Err("an authority cannot be both whitelisted and blacklisted");
        }
        Ok(())
    }
}

/// Options of a market issued asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitassetOptions {
    pub short_backing_asset: AssetId,
    pub feed_lifetime_sec: u32,
    pub minimum_feeds: u8,
    pub force_settlement_delay_sec: u32,
    pub force_settlement_offset_percent: u16,
    pub maximum_force_settlement_volume: u16,
}

impl BitassetOptions {
    pub fn backed_by(short_backing_asset: AssetId) -> Self {
        Self {
            short_backing_asset,
            feed_lifetime_sec: DEFAULT_PRICE_FEED_LIFETIME,
            minimum_feeds: 1,
            force_settlement_delay_sec: DEFAULT_FORCE_SETTLEMENT_DELAY,
            force_settlement_offset_percent: DEFAULT_FORCE_SETTLEMENT_OFFSET,
            maximum_force_settlement_volume: DEFAULT_FORCE_SETTLEMENT_MAX_VOLUME,
        }
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        if self.minimum_feeds == 0 {
            return Err("at least one feed is required");
        }
        if self.force_settlement_offset_percent > HUNDRED_PERCENT {
            return Err("force settlement offset above 100%");
        }
        if self.maximum_force_settlement_volume > HUNDRED_PERCENT {
            return Err("force settlement volume above 100%");
        }
        Ok(())
    }
}

/// Valid symbols are 3 to 16 characters long, made of upper case letters
/// and digits with at most one dot, start with a letter, end with a letter
/// or digit and do not start with "BIT".
pub fn is_valid_symbol(symbol: &str) -> bool {
    if !(MIN_ASSET_SYMBOL_LENGTH..=MAX_ASSET_SYMBOL_LENGTH).contains(&symbol.len()) {
        return false;
    }
    if symbol.starts_with("BIT") {
        return false;
    }

    let bytes = symbol.as_bytes();
    if !bytes[0].is_ascii_alphabetic() || !bytes[bytes.len() - 1].is_ascii_alphanumeric() {
        return false;
    }

    let mut dot_already_present = false;
    for c in bytes {
        if c.is_ascii_uppercase() || c.is_ascii_digit() {
            continue;
        }
        if *c == b'.' && !dot_already_present {
            dot_already_present = true;
            continue;
        }
        return false;
    }
    true
}
