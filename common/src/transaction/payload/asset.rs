use serde::{Deserialize, Serialize};

use crate::{
    asset::{is_valid_symbol, AssetOptions, BitassetOptions},
    config::MAX_ASSET_PRECISION,
    object::{AccountId, AssetId},
    transaction::verify::VerificationError,
};

// Registers a new asset, optionally market issued
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct AssetCreatePayload {
    issuer: AccountId,
    symbol: String,
    precision: u8,
    common_options: AssetOptions,
    bitasset_opts: Option<BitassetOptions>,
    is_prediction_market: bool,
}

impl AssetCreatePayload {
    pub fn new(
        issuer: AccountId,
        symbol: String,
        precision: u8,
        common_options: AssetOptions,
        bitasset_opts: Option<BitassetOptions>,
        is_prediction_market: bool,
    ) -> Self {
        Self {
            issuer,
            symbol,
            precision,
            common_options,
            bitasset_opts,
            is_prediction_market,
        }
    }

    #[inline]
    pub fn get_issuer(&self) -> AccountId {
        self.issuer
    }

    #[inline]
    pub fn get_symbol(&self) -> &str {
        &self.symbol
    }

    #[inline]
    pub fn get_precision(&self) -> u8 {
        self.precision
    }

    #[inline]
    pub fn get_common_options(&self) -> &AssetOptions {
        &self.common_options
    }

    #[inline]
    pub fn get_bitasset_opts(&self) -> Option<&BitassetOptions> {
        self.bitasset_opts.as_ref()
    }

    #[inline]
    pub fn is_prediction_market(&self) -> bool {
        self.is_prediction_market
    }

    pub fn validate(&self) -> Result<(), VerificationError> {
        if !is_valid_symbol(&self.symbol) {
            return Err(VerificationError::InvalidSymbol(self.symbol.clone()));
        }
        if self.precision > MAX_ASSET_PRECISION {
            return Err(VerificationError::InvalidPrecision(self.precision));
        }
        self.common_options
            .validate()
            .map_err(VerificationError::InvalidOptions)?;

        if let Some(opts) = &self.bitasset_opts {
            opts.validate().map_err(VerificationError::InvalidOptions)?;
        }
        if self.is_prediction_market && self.bitasset_opts.is_none() {
            return Err(VerificationError::InvalidOptions(
                "a prediction market must be market issued",
            ));
        }
        Ok(())
    }
}

// Replaces the bitasset options of a market issued asset
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct AssetUpdateBitassetPayload {
    issuer: AccountId,
    asset_to_update: AssetId,
    new_options: BitassetOptions,
}

impl AssetUpdateBitassetPayload {
    pub fn new(issuer: AccountId, asset_to_update: AssetId, new_options: BitassetOptions) -> Self {
        Self {
            issuer,
            asset_to_update,
            new_options,
        }
    }

    #[inline]
    pub fn get_issuer(&self) -> AccountId {
        self.issuer
    }

    #[inline]
    pub fn get_asset_to_update(&self) -> AssetId {
        self.asset_to_update
    }

    #[inline]
    pub fn get_new_options(&self) -> &BitassetOptions {
        &self.new_options
    }

    pub fn validate(&self) -> Result<(), VerificationError> {
        self.new_options
            .validate()
            .map_err(VerificationError::InvalidOptions)
    }
}
